use super::schemas::Config;
/// Configuration utilities - loading, reloading, and access helpers
///
/// - Parsing configuration from TOML text or a file on disk
/// - A global, hot-reloadable configuration instance
/// - Thread-safe access helpers
use crate::errors::ConfigError;
use crate::logger::{self, LogTag};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::path::Path;

/// Global configuration instance
pub static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

/// Default configuration file path
pub const CONFIG_FILE_PATH: &str = "data/config.toml";

/// Parse configuration from TOML text
pub fn parse_config(contents: &str, origin: &str) -> Result<Config, ConfigError> {
    toml::from_str::<Config>(contents).map_err(|source| ConfigError::Parse {
        path: origin.to_string(),
        source,
    })
}

/// Read configuration from a file, falling back to defaults if it doesn't exist
pub fn read_config_file(path: &str) -> Result<Config, ConfigError> {
    if !Path::new(path).exists() {
        logger::warning(
            LogTag::Config,
            &format!("Config file '{}' not found, using default values", path),
        );
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_string(),
        source,
    })?;
    parse_config(&contents, path)
}

/// Load configuration from a specific file path and initialize the global CONFIG
pub fn load_config_from_path(path: &str) -> Result<(), ConfigError> {
    let config = read_config_file(path)?;
    init_config(config)
}

/// Install an already-built configuration as the global CONFIG
pub fn init_config(config: Config) -> Result<(), ConfigError> {
    CONFIG
        .set(RwLock::new(config))
        .map_err(|_| ConfigError::AlreadyInitialized)
}

/// Reload configuration from a specific file path
///
/// The configuration is atomically replaced, so reads are always consistent.
/// Components that copied their settings at startup keep the old values.
pub fn reload_config_from_path(path: &str) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_string(),
        source,
    })?;
    let new_config = parse_config(&contents, path)?;

    let config_lock = CONFIG.get().ok_or(ConfigError::NotInitialized)?;
    *config_lock.write() = new_config;

    logger::info(LogTag::Config, &format!("Configuration reloaded from '{}'", path));
    Ok(())
}

/// Execute a function with read access to the configuration
///
/// Falls back to defaults when the global config was never initialized.
///
/// # Example
/// ```
/// use dashhub::config::with_config;
///
/// let port = with_config(|cfg| cfg.webserver.port);
/// ```
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    match CONFIG.get() {
        Some(lock) => f(&lock.read()),
        None => f(&Config::default()),
    }
}

/// Get a clone of the entire configuration
pub fn get_config_clone() -> Config {
    with_config(|cfg| cfg.clone())
}

/// Save the current configuration to disk
pub fn save_config(path: &str) -> Result<(), ConfigError> {
    let config_str = with_config(toml::to_string_pretty)?;

    std::fs::write(path, config_str).map_err(|source| ConfigError::Write {
        path: path.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = parse_config(
            r#"
            [rate_limit]
            requests_per_minute = 120.0

            [webserver]
            port = 9000
            "#,
            "inline",
        )
        .unwrap();

        assert_eq!(config.rate_limit.requests_per_minute, 120.0);
        assert!(config.rate_limit.enabled);
        assert_eq!(config.webserver.port, 9000);
        assert_eq!(config.webserver.host, "127.0.0.1");
        assert_eq!(config.hub.subscriber_buffer, 256);
        assert_eq!(config.metrics.window_size, 100);
    }

    #[test]
    fn test_invalid_toml_reports_origin() {
        let err = parse_config("[hub\ninbox_capacity = 1", "broken.toml").unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_read_config_file_and_missing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[cache]\ndefault_ttl_secs = 15").unwrap();

        let config = read_config_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.cache.default_ttl_secs, 15);
        assert_eq!(config.cache.sweep_interval_secs, 60);

        let missing = read_config_file("/definitely/not/here/config.toml").unwrap();
        assert_eq!(missing, Config::default());
    }

    #[test]
    fn test_config_roundtrips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(parse_config(&text, "roundtrip").unwrap(), config);
    }
}
