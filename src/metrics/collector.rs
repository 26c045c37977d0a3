//! Per-widget operational metrics
//!
//! Producers (the widget update scheduler, API handlers) report completed work;
//! the metrics endpoint reads snapshots. A map-level `RwLock` guards which
//! widgets exist, each widget's own `Mutex` guards its counters and rolling
//! window, so reports for different widgets never contend.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::system::{SystemMetrics, SystemSampler};
use crate::config::MetricsConfig;
use crate::logger::{self, LogTag};

/// Default number of durations kept for the rolling average
pub const DEFAULT_WINDOW_SIZE: usize = 100;

/// Snapshot of one widget's metrics (value copy, serializable)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetMetrics {
    pub widget_id: String,
    pub update_count: u64,
    pub error_count: u64,
    pub last_update_time: Option<DateTime<Utc>>,
    pub average_update_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug)]
struct WidgetStats {
    update_count: u64,
    error_count: u64,
    last_update_time: Option<DateTime<Utc>>,
    durations: VecDeque<Duration>,
    /// Sum of the window in nanoseconds; wide enough for any window of `Duration::MAX`
    window_total_nanos: u128,
    average_update_ms: f64,
    last_error: Option<String>,
}

impl WidgetStats {
    fn new(window_size: usize) -> Self {
        Self {
            update_count: 0,
            error_count: 0,
            last_update_time: None,
            durations: VecDeque::with_capacity(window_size),
            window_total_nanos: 0,
            average_update_ms: 0.0,
            last_error: None,
        }
    }

    fn push_duration(&mut self, duration: Duration, window_size: usize) {
        self.durations.push_back(duration);
        self.window_total_nanos += duration.as_nanos();

        while self.durations.len() > window_size {
            if let Some(oldest) = self.durations.pop_front() {
                self.window_total_nanos -= oldest.as_nanos();
            }
        }

        self.average_update_ms =
            self.window_total_nanos as f64 / 1_000_000.0 / self.durations.len() as f64;
    }

    fn snapshot(&self, widget_id: &str) -> WidgetMetrics {
        WidgetMetrics {
            widget_id: widget_id.to_string(),
            update_count: self.update_count,
            error_count: self.error_count,
            last_update_time: self.last_update_time,
            average_update_ms: self.average_update_ms,
            last_error: self.last_error.clone(),
        }
    }
}

pub struct MetricsCollector {
    widgets: RwLock<HashMap<String, Arc<Mutex<WidgetStats>>>>,
    window_size: usize,
    system: SystemSampler,
    started_at: Instant,
}

impl MetricsCollector {
    pub fn new(window_size: usize) -> Self {
        Self {
            widgets: RwLock::new(HashMap::new()),
            window_size: window_size.max(1),
            system: SystemSampler::new(),
            started_at: Instant::now(),
        }
    }

    pub fn from_config(config: &MetricsConfig) -> Self {
        Self::new(config.window_size)
    }

    fn widget(&self, widget_id: &str) -> Arc<Mutex<WidgetStats>> {
        if let Some(stats) = self.widgets.read().get(widget_id) {
            return Arc::clone(stats);
        }

        let mut widgets = self.widgets.write();
        Arc::clone(widgets.entry(widget_id.to_string()).or_insert_with(|| {
            logger::debug(LogTag::Metrics, &format!("Tracking widget {}", widget_id));
            Arc::new(Mutex::new(WidgetStats::new(self.window_size)))
        }))
    }

    /// Record one completed update and its duration
    pub fn record_update(&self, widget_id: &str, duration: Duration) {
        let stats = self.widget(widget_id);
        let mut stats = stats.lock();

        stats.update_count += 1;
        stats.last_update_time = Some(Utc::now());
        stats.push_duration(duration, self.window_size);
    }

    /// Record a failed unit of work; the error text is kept as-is
    pub fn record_error(&self, widget_id: &str, error: impl Display) {
        let message = error.to_string();
        let stats = self.widget(widget_id);
        let mut stats = stats.lock();

        stats.error_count += 1;
        stats.last_error = Some(message);
    }

    /// Snapshot for one widget, or None if it never reported
    pub fn get_metrics(&self, widget_id: &str) -> Option<WidgetMetrics> {
        let stats = self.widgets.read().get(widget_id).cloned()?;
        let snapshot = stats.lock().snapshot(widget_id);
        Some(snapshot)
    }

    /// Snapshots for every tracked widget
    pub fn get_all_metrics(&self) -> HashMap<String, WidgetMetrics> {
        let widgets: Vec<(String, Arc<Mutex<WidgetStats>>)> = self
            .widgets
            .read()
            .iter()
            .map(|(id, stats)| (id.clone(), Arc::clone(stats)))
            .collect();

        widgets
            .into_iter()
            .map(|(id, stats)| {
                let snapshot = stats.lock().snapshot(&id);
                (id, snapshot)
            })
            .collect()
    }

    /// Process-level resource usage
    pub fn get_system_metrics(&self) -> SystemMetrics {
        self.system
            .sample(self.started_at.elapsed(), self.tracked_widgets())
    }

    pub fn tracked_widgets(&self) -> usize {
        self.widgets.read().len()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

impl std::fmt::Debug for MetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsCollector")
            .field("window_size", &self.window_size)
            .field("tracked_widgets", &self.tracked_widgets())
            .finish()
    }
}
