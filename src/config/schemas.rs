/// Configuration schemas - all config structures defined once with defaults
///
/// Each struct is defined using the config_struct! macro, so every field has
/// its default next to its declaration and any subset may appear in the file.
use crate::config_struct;
use std::time::Duration;

// ============================================================================
// HUB CONFIGURATION
// ============================================================================

config_struct! {
    /// Broadcast hub sizing
    pub struct HubConfig {
        /// Capacity of the hub loop inbox (register/unregister/broadcast commands)
        inbox_capacity: usize = 256,
        /// Per-subscriber outbound queue; a subscriber whose queue fills up is evicted
        subscriber_buffer: usize = 256,
    }
}

// ============================================================================
// RATE LIMIT CONFIGURATION
// ============================================================================

config_struct! {
    /// Per-client admission control
    pub struct RateLimitConfig {
        enabled: bool = true,
        /// Sustained budget per client; also the burst capacity
        requests_per_minute: f64 = 60.0,
        /// How often idle, fully refilled buckets are dropped
        sweep_interval_secs: u64 = 3600,
    }
}

impl RateLimitConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

// ============================================================================
// CACHE CONFIGURATION
// ============================================================================

config_struct! {
    /// TTL cache defaults
    pub struct CacheSettings {
        default_ttl_secs: u64 = 300,
        sweep_interval_secs: u64 = 60,
    }
}

// ============================================================================
// METRICS CONFIGURATION
// ============================================================================

config_struct! {
    /// Metrics collector settings
    pub struct MetricsConfig {
        /// Number of recent update durations kept per widget for the rolling average
        window_size: usize = 100,
    }
}

// ============================================================================
// WEBSERVER CONFIGURATION
// ============================================================================

config_struct! {
    /// HTTP surface settings
    pub struct WebserverConfig {
        host: String = "127.0.0.1".to_string(),
        port: u16 = 8080,
        cors_enabled: bool = true,
        /// Server ping interval on websocket connections
        heartbeat_secs: u64 = 30,
        /// Close websocket connections silent for this long
        client_idle_timeout_secs: u64 = 90,
    }
}

// ============================================================================
// ROOT CONFIGURATION
// ============================================================================

config_struct! {
    /// Root configuration
    pub struct Config {
        hub: HubConfig = HubConfig::default(),
        rate_limit: RateLimitConfig = RateLimitConfig::default(),
        cache: CacheSettings = CacheSettings::default(),
        metrics: MetricsConfig = MetricsConfig::default(),
        webserver: WebserverConfig = WebserverConfig::default(),
    }
}
