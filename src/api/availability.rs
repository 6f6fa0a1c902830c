//! 空房查詢與手動更新快取端點

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::domain::model::{AvailabilityReport, RefreshOutcome};

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub year: i32,
    pub month: u32,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/availability", get(get_availability))
        .route("/api/availability/refresh-cache", post(refresh_cache))
}

async fn get_availability(
    State(state): State<Arc<AppState>>,
    query: Result<Query<AvailabilityQuery>, QueryRejection>,
) -> ApiResult<Json<AvailabilityReport>> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let report = state.engine.availability(query.year, query.month).await?;
    Ok(Json(report))
}

async fn refresh_cache(State(state): State<Arc<AppState>>) -> Json<RefreshOutcome> {
    Json(state.engine.refresh_command().execute())
}
