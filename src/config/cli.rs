use clap::Parser;
use std::path::PathBuf;

/// 入口網站空房查詢服務
#[derive(Debug, Clone, Parser)]
#[command(name = "portal-availability")]
#[command(about = "Monthly room availability merged from the portal, form and booking site")]
pub struct ServerArgs {
    #[arg(long, short = 'c', default_value = "config/portal.toml")]
    pub config: PathBuf,

    /// 覆寫設定檔中的 server.bind
    #[arg(long)]
    pub bind: Option<String>,

    #[arg(long, short = 'v', help = "Enable verbose output")]
    pub verbose: bool,
}

/// 單次輸出某月份空房 JSON
#[derive(Debug, Clone, Parser)]
#[command(name = "availability-report")]
#[command(about = "Print the merged availability of one month as JSON")]
pub struct ReportArgs {
    #[arg(long, short = 'c', default_value = "config/portal.toml")]
    pub config: PathBuf,

    #[arg(long)]
    pub year: i32,

    #[arg(long)]
    pub month: u32,

    #[arg(long, help = "Pretty-print the JSON output")]
    pub pretty: bool,

    #[arg(long, short = 'v', help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_args_defaults() {
        let args = ServerArgs::parse_from(["portal-availability"]);
        assert_eq!(args.config, PathBuf::from("config/portal.toml"));
        assert!(args.bind.is_none());
        assert!(!args.verbose);
    }

    #[test]
    fn test_report_args_require_period() {
        assert!(ReportArgs::try_parse_from(["availability-report"]).is_err());

        let args = ReportArgs::parse_from([
            "availability-report",
            "--year",
            "2025",
            "--month",
            "3",
            "--pretty",
        ]);
        assert_eq!((args.year, args.month), (2025, 3));
        assert!(args.pretty);
    }
}
