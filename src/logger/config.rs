/// Logger configuration derived from command-line flags
///
/// The configuration is global so that any module can log without carrying a
/// handle around. It is read on every log call, so it lives behind a
/// `parking_lot::RwLock` and is cloned out only in tests.
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashSet;

use super::levels::LogLevel;
use super::tags::LogTag;
use crate::arguments::get_cmd_args;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Messages above this level are dropped (Error is always shown)
    pub min_level: LogLevel,
    /// Tags with `--debug-<key>` enabled
    pub debug_tags: HashSet<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

/// Build the config from `--debug-<key>`, `--verbose` and `--quiet`
pub fn config_from_args(args: &[String]) -> LoggerConfig {
    let mut config = LoggerConfig::default();

    for arg in args {
        if arg == "--verbose" {
            config.min_level = LogLevel::Verbose;
        } else if arg == "--quiet" {
            config.min_level = LogLevel::Warning;
        } else if let Some(key) = arg.strip_prefix("--debug-") {
            config.debug_tags.insert(key.to_string());
        }
    }

    // Debug flags are pointless if the threshold would hide them
    if !config.debug_tags.is_empty() && config.min_level < LogLevel::Debug {
        config.min_level = LogLevel::Debug;
    }

    config
}

/// Initialize the logger configuration from the process arguments
pub fn init_from_args() {
    set_logger_config(config_from_args(&get_cmd_args()));
}

pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG.read().clone()
}

pub fn set_logger_config(config: LoggerConfig) {
    *LOGGER_CONFIG.write() = config;
}

pub(super) fn min_level() -> LogLevel {
    LOGGER_CONFIG.read().min_level
}

pub(super) fn is_debug_enabled_for_tag(tag: &LogTag) -> bool {
    LOGGER_CONFIG.read().debug_tags.contains(&tag.to_debug_key())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_debug_flags_raise_threshold() {
        let config = config_from_args(&args(&["dashhub", "--debug-hub", "--debug-cache"]));
        assert_eq!(config.min_level, LogLevel::Debug);
        assert!(config.debug_tags.contains("hub"));
        assert!(config.debug_tags.contains("cache"));
        assert!(!config.debug_tags.contains("metrics"));
    }

    #[test]
    fn test_quiet_and_default() {
        assert_eq!(config_from_args(&args(&["dashhub"])).min_level, LogLevel::Info);
        assert_eq!(
            config_from_args(&args(&["dashhub", "--quiet"])).min_level,
            LogLevel::Warning
        );
    }
}
