use crate::domain::model::SourceTag;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AvailabilityError {
    #[error("Invalid range: year={year}, month={month}")]
    InvalidRange { year: i32, month: u32 },

    #[error("Reservation store query failed: {message}")]
    StoreError { message: String },

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error(transparent)]
    ExternalFetch(#[from] ExternalFetchError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AvailabilityError {
    pub fn store(message: impl Into<String>) -> Self {
        Self::StoreError {
            message: message.into(),
        }
    }

    /// 呼叫端錯誤（請求參數）不算服務故障
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRange { .. })
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidRange { .. } => ErrorSeverity::Low,
            Self::ExternalFetch(_) => ErrorSeverity::Medium,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::SerializationError(_) => ErrorSeverity::High,
            Self::StoreError { .. }
            | Self::DatabaseError(_)
            | Self::PoolError(_)
            | Self::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::InvalidRange { .. } => "Use a positive year and a month between 1 and 12",
            Self::StoreError { .. } | Self::DatabaseError(_) | Self::PoolError(_) => {
                "Check that the reservation database is reachable and the schema is up to date"
            }
            Self::ExternalFetch(_) => {
                "Check the external endpoint; cached data is served until it recovers"
            }
            Self::IoError(_) => "Check file paths and permissions",
            Self::SerializationError(_) => "Check the payload format of the upstream source",
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => "Fix the configuration file and restart",
        }
    }
}

/// 外部來源（表單 / 訂房網站）抓取失敗
///
/// 必須可 `Clone`：同一次失敗的抓取結果會分享給所有排隊等待的呼叫者。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExternalFetchError {
    #[error("{origin} request failed: {message}")]
    Http { origin: SourceTag, message: String },

    #[error("{origin} responded with HTTP {status}")]
    Status { origin: SourceTag, status: u16 },

    #[error("{origin} payload could not be decoded: {message}")]
    Decode { origin: SourceTag, message: String },

    #[error("{origin} fetch timed out after {after:?}")]
    Timeout { origin: SourceTag, after: Duration },
}

impl ExternalFetchError {
    pub fn source_tag(&self) -> SourceTag {
        match self {
            Self::Http { origin, .. }
            | Self::Status { origin, .. }
            | Self::Decode { origin, .. }
            | Self::Timeout { origin, .. } => *origin,
        }
    }

    pub fn http(origin: SourceTag, err: &reqwest::Error) -> Self {
        Self::Http {
            origin,
            message: err.to_string(),
        }
    }

    pub fn decode(origin: SourceTag, message: impl Into<String>) -> Self {
        Self::Decode {
            origin,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AvailabilityError>;
