/// Cache timing configuration
///
/// Defaults match the dashboard's usual lookups: five minute entries,
/// swept once a minute.
use std::time::Duration;

use crate::config::CacheSettings;

#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Time-to-live used by `set`
    pub default_ttl: Duration,

    /// How often the background sweeper removes expired entries
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl CacheConfig {
    /// Custom configuration
    pub fn custom(ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            default_ttl: ttl,
            sweep_interval,
        }
    }
}

impl From<&CacheSettings> for CacheConfig {
    fn from(settings: &CacheSettings) -> Self {
        Self {
            default_ttl: Duration::from_secs(settings.default_ttl_secs),
            sweep_interval: Duration::from_secs(settings.sweep_interval_secs.max(1)),
        }
    }
}
