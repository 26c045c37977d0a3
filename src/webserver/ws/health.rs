/// WebSocket health monitoring
///
/// Tracks client activity so the connection loop knows when to ping and when
/// to give up on a silent client.
use std::time::{Duration, Instant};

use crate::config::WebserverConfig;

/// How long a ping may go unanswered
const PONG_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// HEALTH CONFIG
// ============================================================================

#[derive(Debug, Clone)]
pub struct HealthConfig {
    /// Ping the client after this much silence
    pub heartbeat_interval: Duration,

    /// Close the connection after this much silence
    pub idle_timeout: Duration,

    pub pong_timeout: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self::from_config(&WebserverConfig::default())
    }
}

impl HealthConfig {
    pub fn from_config(config: &WebserverConfig) -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(config.heartbeat_secs.max(1)),
            idle_timeout: Duration::from_secs(config.client_idle_timeout_secs.max(1)),
            pong_timeout: PONG_TIMEOUT,
        }
    }
}

// ============================================================================
// CONNECTION HEALTH TRACKER
// ============================================================================

#[derive(Debug)]
pub struct ConnectionHealth {
    /// Last message of any kind from the client
    last_activity: Instant,

    /// Outstanding ping, cleared by any client activity
    last_ping: Option<Instant>,

    config: HealthConfig,
}

impl ConnectionHealth {
    pub fn new(config: HealthConfig) -> Self {
        Self {
            last_activity: Instant::now(),
            last_ping: None,
            config,
        }
    }

    pub fn record_activity(&mut self) {
        self.last_activity = Instant::now();
        self.last_ping = None;
    }

    pub fn record_ping(&mut self) {
        self.last_ping = Some(Instant::now());
    }

    pub fn is_idle(&self) -> bool {
        self.last_activity.elapsed() > self.config.idle_timeout
    }

    pub fn is_pong_overdue(&self) -> bool {
        self.last_ping
            .map(|ping_time| ping_time.elapsed() > self.config.pong_timeout)
            .unwrap_or(false)
    }

    pub fn needs_ping(&self) -> bool {
        self.last_activity.elapsed() > self.config.heartbeat_interval && self.last_ping.is_none()
    }

    pub fn seconds_since_activity(&self) -> u64 {
        self.last_activity.elapsed().as_secs()
    }
}
