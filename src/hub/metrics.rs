use serde::Serialize;
/// Hub metrics collection
///
/// Lifetime counters for subscriber churn and delivery outcomes.
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// HUB METRICS
// ============================================================================

/// Hub-level metrics (aggregate across all subscribers)
#[derive(Debug, Default)]
pub struct HubMetrics {
    /// Total registrations (lifetime)
    total_registrations: AtomicU64,

    /// Current live subscribers
    active_subscribers: AtomicUsize,

    /// Events accepted by the loop
    events_published: AtomicU64,

    /// Per-subscriber deliveries
    messages_delivered: AtomicU64,

    /// Subscribers dropped for a full queue
    evictions: AtomicU64,

    /// Subscribers removed on request or disconnect
    unregistrations: AtomicU64,
}

impl HubMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn subscriber_registered(&self) {
        self.total_registrations.fetch_add(1, Ordering::Relaxed);
        self.active_subscribers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn subscriber_unregistered(&self) {
        self.unregistrations.fetch_add(1, Ordering::Relaxed);
        self.active_subscribers.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn subscriber_evicted(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
        self.active_subscribers.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn event_published(&self) {
        self.events_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn messages_delivered(&self, count: u64) {
        self.messages_delivered.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> HubMetricsSnapshot {
        HubMetricsSnapshot {
            total_registrations: self.total_registrations.load(Ordering::Relaxed),
            active_subscribers: self.active_subscribers.load(Ordering::Relaxed),
            events_published: self.events_published.load(Ordering::Relaxed),
            messages_delivered: self.messages_delivered.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            unregistrations: self.unregistrations.load(Ordering::Relaxed),
        }
    }
}

/// Hub metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HubMetricsSnapshot {
    pub total_registrations: u64,
    pub active_subscribers: usize,
    pub events_published: u64,
    pub messages_delivered: u64,
    pub evictions: u64,
    pub unregistrations: u64,
}
