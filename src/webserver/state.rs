/// Shared application state for the webserver
///
/// Holds the core components every handler and middleware may touch. The
/// components are shared behind `Arc`s; cloning the state is cheap.
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;

use crate::cache::{CacheConfig, TtlCache};
use crate::config::{Config, WebserverConfig};
use crate::hub::Hub;
use crate::metrics::{MetricsCollector, RequestStats};
use crate::rate_limiter::RateLimiter;

/// Shared application state passed to all route handlers
#[derive(Clone)]
pub struct AppState {
    /// Webserver configuration
    pub config: Arc<WebserverConfig>,

    /// Live event fan-out; websocket connections subscribe here
    pub hub: Arc<Hub>,

    /// Per-client admission control
    pub limiter: Arc<RateLimiter>,

    /// Whether the admission middleware consults the limiter at all
    pub rate_limit_enabled: bool,

    /// Widget data store
    pub cache: Arc<TtlCache<Value>>,

    /// Widget update statistics and system snapshot
    pub metrics: Arc<MetricsCollector>,

    /// HTTP request accounting
    pub requests: Arc<RequestStats>,

    /// Server startup time
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Build every component from configuration; starts the hub loop, so it
    /// must be called from within a tokio runtime
    pub fn from_config(config: &Config) -> Self {
        Self {
            config: Arc::new(config.webserver.clone()),
            hub: Hub::start(config.hub.clone()),
            limiter: Arc::new(RateLimiter::from_config(&config.rate_limit)),
            rate_limit_enabled: config.rate_limit.enabled,
            cache: Arc::new(TtlCache::new(CacheConfig::from(&config.cache))),
            metrics: Arc::new(MetricsCollector::from_config(&config.metrics)),
            requests: Arc::new(RequestStats::new()),
            startup_time: Utc::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        (Utc::now() - self.startup_time).num_seconds().max(0) as u64
    }
}
