//! Operational metrics: per-widget update statistics, a process resource
//! snapshot and HTTP request accounting.

mod collector;
mod requests;
mod system;

pub use collector::{MetricsCollector, WidgetMetrics, DEFAULT_WINDOW_SIZE};
pub use requests::{RequestStats, RequestStatsSnapshot};
pub use system::SystemMetrics;
