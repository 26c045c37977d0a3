//! Process-level resource snapshot
//!
//! Built on `sysinfo` for memory figures and on the tokio runtime handle for
//! worker/task counts. Sampling refreshes only the memory tables and the
//! current process, never the full process list.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::time::Duration;
use sysinfo::System;

/// Snapshot of the running process (serializable)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SystemMetrics {
    /// Random id of this process run; changes on every restart
    pub session_id: String,
    pub process_memory_bytes: u64,
    pub process_virtual_memory_bytes: u64,
    pub system_memory_total_bytes: u64,
    pub system_memory_used_bytes: u64,
    pub cpu_count: usize,
    /// Runtime worker threads; 0 when sampled outside a tokio runtime
    pub runtime_workers: usize,
    /// Tasks alive in the runtime; the async analogue of a goroutine count
    pub runtime_alive_tasks: usize,
    pub uptime_seconds: u64,
    pub tracked_widgets: usize,
    pub collected_at: DateTime<Utc>,
}

pub(crate) struct SystemSampler {
    system: Mutex<System>,
    session_id: String,
}

impl SystemSampler {
    pub(crate) fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
            session_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub(crate) fn sample(&self, uptime: Duration, tracked_widgets: usize) -> SystemMetrics {
        let (process_memory, process_virtual, total_memory, used_memory) = {
            let mut sys = self.system.lock();
            sys.refresh_memory();

            let process = match sysinfo::get_current_pid() {
                Ok(pid) => {
                    sys.refresh_process(pid);
                    sys.process(pid)
                        .map(|p| (p.memory(), p.virtual_memory()))
                        .unwrap_or((0, 0))
                }
                Err(_) => (0, 0),
            };

            (process.0, process.1, sys.total_memory(), sys.used_memory())
        };

        let cpu_count = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        let (runtime_workers, runtime_alive_tasks) = match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let metrics = handle.metrics();
                (metrics.num_workers(), metrics.num_alive_tasks())
            }
            Err(_) => (0, 0),
        };

        SystemMetrics {
            session_id: self.session_id.clone(),
            process_memory_bytes: process_memory,
            process_virtual_memory_bytes: process_virtual,
            system_memory_total_bytes: total_memory,
            system_memory_used_bytes: used_memory,
            cpu_count,
            runtime_workers,
            runtime_alive_tasks,
            uptime_seconds: uptime.as_secs(),
            tracked_widgets,
            collected_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::MetricsCollector;
    use std::time::Duration;

    #[test]
    fn test_sample_outside_runtime() {
        let collector = MetricsCollector::default();
        collector.record_update("w", Duration::from_millis(1));

        let metrics = collector.get_system_metrics();
        assert!(metrics.cpu_count >= 1);
        assert_eq!(metrics.runtime_workers, 0);
        assert_eq!(metrics.tracked_widgets, 1);
        assert!(metrics.system_memory_total_bytes >= metrics.system_memory_used_bytes);

        // Stable for the collector's lifetime
        assert_eq!(metrics.session_id, collector.get_system_metrics().session_id);
        assert_eq!(metrics.session_id.len(), 36);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_sample_inside_runtime() {
        let collector = MetricsCollector::default();
        let metrics = collector.get_system_metrics();
        assert_eq!(metrics.runtime_workers, 2);
        assert!(metrics.process_memory_bytes > 0);
    }
}
