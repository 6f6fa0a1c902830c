pub mod cache;
pub mod calendar;
pub mod engine;
pub mod fetchers;
pub mod merger;
pub mod refresh;
