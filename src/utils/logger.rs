use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 建立 `EnvFilter`；`RUST_LOG` 優先於設定檔的 level
pub fn build_filter(verbose: bool, level: &str) -> EnvFilter {
    let default = if verbose {
        "portal_availability=debug,tower_http=debug,info".to_string()
    } else {
        format!("portal_availability={level},tower_http=info,warn")
    };

    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// 初始化日誌；`json = true` 時輸出 JSON 行，方便集中收集
pub fn init_logger(verbose: bool, level: &str, json: bool) {
    let filter = build_filter(verbose, level);
    let registry = tracing_subscriber::registry().with(filter);

    let result = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .json(),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .compact(),
            )
            .try_init()
    };

    // 重複初始化（例如測試）時忽略
    if let Err(e) = result {
        eprintln!("logger already initialised: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_uses_configured_level() {
        std::env::remove_var("RUST_LOG");
        let filter = build_filter(false, "warn");
        assert!(filter.to_string().contains("portal_availability=warn"));
    }

    #[test]
    fn test_verbose_filter_enables_debug() {
        std::env::remove_var("RUST_LOG");
        let filter = build_filter(true, "info");
        assert!(filter.to_string().contains("portal_availability=debug"));
    }
}
