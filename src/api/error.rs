//! HTTP 錯誤回應
//!
//! `ApiError` 實作 `IntoResponse`，統一輸出 `{success: false, error, message}`

use crate::utils::error::AvailabilityError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    /// 400 - 參數錯誤（年月不合法）
    BadRequest(String),
    /// 500 - 內部錯誤（入口網站資料表無法讀取等）
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

impl From<AvailabilityError> for ApiError {
    fn from(err: AvailabilityError) -> Self {
        if err.is_client_error() {
            return Self::BadRequest(err.to_string());
        }

        tracing::error!(
            "❌ Request failed: {} (Severity: {:?})",
            err,
            err.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", err.recovery_suggestion());
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        (status, Json(ErrorResponse::new(error_type, message))).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(m) => write!(f, "Bad request: {}", m),
            ApiError::Internal(m) => write!(f, "Internal error: {}", m),
        }
    }
}

impl std::error::Error for ApiError {}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_range_maps_to_bad_request() {
        let err: ApiError = AvailabilityError::InvalidRange { year: 2025, month: 0 }.into();
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_store_failure_maps_to_internal_error() {
        let err: ApiError = AvailabilityError::store("database is locked").into();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_response_is_unsuccessful() {
        let body = serde_json::to_value(ErrorResponse::new("bad_request", "nope")).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "bad_request");
        assert_eq!(body["message"], "nope");
    }
}
