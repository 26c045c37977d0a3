/// Centralized argument handling for dashhub
///
/// Two layers live here:
/// - `Cli`: the typed clap surface used by the binary (config path, bind address, limits)
/// - `CMD_ARGS`: the raw argument list the logger scans for `--debug-<module>`
///   flags, so the parsed CLI never has to be threaded through every module
use clap::Parser;
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

/// Global command-line arguments storage
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Command-line interface of the dashhub server
#[derive(Debug, Clone, Parser)]
#[command(name = "dashhub", version, about = "Real-time dashboard backend core")]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = crate::config::CONFIG_FILE_PATH)]
    pub config: String,

    /// Override the bind host from the config file
    #[arg(long)]
    pub host: Option<String>,

    /// Override the bind port from the config file
    #[arg(long)]
    pub port: Option<u16>,

    /// Override the per-client request budget (requests per minute)
    #[arg(long)]
    pub rate_limit_rpm: Option<f64>,

    /// Enable debug output for startup and shutdown
    #[arg(long)]
    pub debug_system: bool,

    /// Enable debug output for config loading
    #[arg(long)]
    pub debug_config: bool,

    /// Enable debug output for the hub
    #[arg(long)]
    pub debug_hub: bool,

    /// Enable debug output for the rate limiter
    #[arg(long)]
    pub debug_ratelimit: bool,

    /// Enable debug output for the cache
    #[arg(long)]
    pub debug_cache: bool,

    /// Enable debug output for the metrics collector
    #[arg(long)]
    pub debug_metrics: bool,

    /// Enable debug output for the webserver
    #[arg(long)]
    pub debug_webserver: bool,

    /// Enable debug output forwarded from third-party crates
    #[arg(long)]
    pub debug_external: bool,

    /// Show verbose output for every module
    #[arg(long)]
    pub verbose: bool,

    /// Only show warnings and errors
    #[arg(long)]
    pub quiet: bool,
}

/// Gets a copy of the current command-line arguments
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        Err(_) => env::args().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_overrides() {
        let cli = Cli::parse_from([
            "dashhub",
            "--port",
            "9090",
            "--rate-limit-rpm",
            "120",
            "--debug-hub",
        ]);
        assert_eq!(cli.port, Some(9090));
        assert_eq!(cli.rate_limit_rpm, Some(120.0));
        assert!(cli.debug_hub);
        assert!(!cli.debug_cache);
        assert_eq!(cli.config, crate::config::CONFIG_FILE_PATH);
    }

    #[test]
    fn test_every_log_tag_has_a_debug_flag() {
        use crate::logger::LogTag;

        let tags = [
            LogTag::System,
            LogTag::Config,
            LogTag::Hub,
            LogTag::RateLimit,
            LogTag::Cache,
            LogTag::Metrics,
            LogTag::Webserver,
            LogTag::External("mio".to_string()),
        ];
        for tag in tags {
            let flag = format!("--debug-{}", tag.to_debug_key());
            let parsed = Cli::try_parse_from(["dashhub", flag.as_str()]);
            assert!(parsed.is_ok(), "{} is rejected", flag);
        }

        let cli = Cli::parse_from(["dashhub", "--debug-system", "--debug-config", "--debug-external"]);
        assert!(cli.debug_system && cli.debug_config && cli.debug_external);
    }
}
