pub mod adapters;
pub mod api;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use app::build_engine;
pub use config::AppConfig;
pub use core::engine::{AvailabilityEngine, EngineSettings};
pub use domain::model::{AvailabilityReport, DayStatus, ReservationSummary, SourceTag};
pub use utils::error::{AvailabilityError, ExternalFetchError, Result};
