//! HTTP API：路由組裝

pub mod availability;
pub mod error;
pub mod health;

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::core::engine::AvailabilityEngine;

/// 所有 handler 共用的狀態
pub struct AppState {
    pub engine: AvailabilityEngine,
}

impl AppState {
    pub fn new(engine: AvailabilityEngine) -> Self {
        Self { engine }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::router())
        .merge(availability::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
