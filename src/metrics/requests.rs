//! HTTP request accounting shared by the admission middleware
//!
//! Owned by the application state and passed in explicitly; there is no
//! process-wide request counter.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestStatsSnapshot {
    pub total_requests: u64,
    pub rate_limited: u64,
    pub average_latency_ms: f64,
    pub uptime_seconds: u64,
}

#[derive(Debug)]
pub struct RequestStats {
    total_requests: AtomicU64,
    rate_limited: AtomicU64,
    total_latency_us: AtomicU64,
    completed: AtomicU64,
    started_at: Instant,
}

impl RequestStats {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            rate_limited: AtomicU64::new(0),
            total_latency_us: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Count an incoming request, admitted or not
    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    /// Record how long an admitted request took to handle
    pub fn record_latency(&self, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.total_latency_us.fetch_add(micros, Ordering::Relaxed);
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RequestStatsSnapshot {
        let completed = self.completed.load(Ordering::Relaxed);
        let average_latency_ms = if completed == 0 {
            0.0
        } else {
            self.total_latency_us.load(Ordering::Relaxed) as f64 / completed as f64 / 1000.0
        };

        RequestStatsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            average_latency_ms,
            uptime_seconds: self.started_at.elapsed().as_secs(),
        }
    }
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}
