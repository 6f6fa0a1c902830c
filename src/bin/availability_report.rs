use clap::Parser;
use portal_availability::config::cli::ReportArgs;
use portal_availability::utils::{logger, validation::Validate};
use portal_availability::{build_engine, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ReportArgs::parse();

    let config = AppConfig::from_file(&args.config)?;

    // 報表輸出到 stdout，日誌一律維持精簡格式
    logger::init_logger(args.verbose, &config.logging.level, false);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let engine = build_engine(&config)?;

    match engine.availability(args.year, args.month).await {
        Ok(report) => {
            if !report.degraded.is_empty() {
                tracing::warn!(
                    "⚠️ Degraded sources: {}",
                    report
                        .degraded
                        .iter()
                        .map(|s| s.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }

            let output = if args.pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{}", output);
        }
        Err(e) => {
            tracing::error!("❌ Availability query failed: {}", e);
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e);
            std::process::exit(if e.is_client_error() { 2 } else { 1 });
        }
    }

    Ok(())
}
