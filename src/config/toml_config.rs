use crate::adapters::form_sheet::FormColumns;
use crate::core::cache::CacheSettings;
use crate::core::engine::EngineSettings;
use crate::utils::error::{AvailabilityError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub form: FormConfig,
    pub booking_site: BookingSiteConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "./data/portal.sqlite3".to_string(),
            pool_size: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    pub endpoint: String,
    pub timeout_seconds: Option<u64>,
    pub ttl_seconds: Option<u64>,
    #[serde(default)]
    pub columns: FormColumns,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingSiteConfig {
    pub endpoint: String,
    pub timeout_seconds: Option<u64>,
    pub ttl_seconds: Option<u64>,
    pub api_key: Option<String>,
    pub placeholder_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_staleness_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_staleness_seconds: 24 * 60 * 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AvailabilityError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AvailabilityError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${BOOKING_SITE_API_KEY})；未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AvailabilityError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_socket_addr("server.bind", &self.server.bind)?;

        validation::validate_path("database.path", &self.database.path)?;
        validation::validate_positive_number(
            "database.pool_size",
            self.database.pool_size.into(),
            1,
        )?;

        validation::validate_url("form.endpoint", &self.form.endpoint)?;
        validation::validate_url("booking_site.endpoint", &self.booking_site.endpoint)?;

        if let Some(timeout) = self.form.timeout_seconds {
            validation::validate_positive_number("form.timeout_seconds", timeout, 1)?;
        }
        if let Some(timeout) = self.booking_site.timeout_seconds {
            validation::validate_positive_number("booking_site.timeout_seconds", timeout, 1)?;
        }
        validation::validate_non_empty_string(
            "form.columns.checkin_date",
            &self.form.columns.checkin_date,
        )?;

        if let Some(name) = &self.booking_site.placeholder_name {
            validation::validate_non_empty_string("booking_site.placeholder_name", name)?;
        }

        // 未展開的 ${VAR} 代表環境變數沒有設定
        if let Some(key) = &self.booking_site.api_key {
            if key.starts_with("${") {
                return Err(AvailabilityError::MissingConfigError {
                    field: format!("booking_site.api_key ({})", key),
                });
            }
        }

        validation::validate_one_of(
            "logging.level",
            &self.logging.level.to_ascii_lowercase(),
            &LOG_LEVELS,
        )?;

        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        validation::validate_socket_addr("server.bind", &self.server.bind)
    }

    pub fn form_timeout(&self) -> Duration {
        Duration::from_secs(self.form.timeout_seconds.unwrap_or(5))
    }

    pub fn booking_timeout(&self) -> Duration {
        Duration::from_secs(self.booking_site.timeout_seconds.unwrap_or(5))
    }

    /// 轉成引擎使用的快取與 TTL 設定
    pub fn engine_settings(&self) -> EngineSettings {
        let defaults = EngineSettings::default();

        EngineSettings {
            form_ttl: self
                .form
                .ttl_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.form_ttl),
            booking_ttl: self
                .booking_site
                .ttl_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.booking_ttl),
            cache: CacheSettings {
                max_staleness: Duration::from_secs(self.cache.max_staleness_seconds),
                fetch_timeout: self.form_timeout().max(self.booking_timeout()),
            },
            placeholder_name: self
                .booking_site
                .placeholder_name
                .clone()
                .unwrap_or(defaults.placeholder_name),
        }
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
