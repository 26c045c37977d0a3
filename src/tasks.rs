//! Stoppable background tasks
//!
//! Sweepers run for the lifetime of their owner but must be joinable at
//! teardown so tests and restarts don't leak activity. A `BackgroundTask`
//! pairs the spawned `JoinHandle` with a shutdown `Notify`.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::logger::{self, LogTag};

/// Shortest period a background task will tick at
pub const MIN_TASK_PERIOD: Duration = Duration::from_millis(1);

pub struct BackgroundTask {
    name: &'static str,
    shutdown: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl BackgroundTask {
    /// Spawn a task that runs `tick` every `period` until stopped
    ///
    /// The first tick happens one full period after spawning. A zero period is
    /// raised to `MIN_TASK_PERIOD`. Must be called from within a tokio runtime.
    pub fn spawn_interval<F>(name: &'static str, tag: LogTag, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let period = period.max(MIN_TASK_PERIOD);
        let shutdown = Arc::new(Notify::new());
        let signal = shutdown.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => tick(),
                    _ = signal.notified() => break,
                }
            }

            logger::debug(tag, &format!("{} stopped", name));
        });

        Self {
            name,
            shutdown,
            handle,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signal the task and wait for it to exit
    pub async fn stop(self) {
        // notify_one stores a permit, so the signal isn't lost if the task
        // is between select iterations
        self.shutdown.notify_one();
        if let Err(e) = self.handle.await {
            logger::error(
                LogTag::System,
                &format!("Background task {} failed: {}", self.name, e),
            );
        }
    }
}

impl std::fmt::Debug for BackgroundTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundTask")
            .field("name", &self.name)
            .field("finished", &self.handle.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_interval_task_ticks_and_stops() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();

        let task = BackgroundTask::spawn_interval(
            "test_ticker",
            LogTag::System,
            Duration::from_millis(20),
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        tokio::time::sleep(Duration::from_millis(110)).await;
        assert!(!task.is_finished());
        task.stop().await;

        let after_stop = ticks.load(Ordering::SeqCst);
        assert!(after_stop >= 2, "expected several ticks, got {}", after_stop);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test]
    async fn test_zero_period_is_clamped_and_keeps_running() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();

        let task = BackgroundTask::spawn_interval("zero", LogTag::System, Duration::ZERO, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!task.is_finished());
        assert!(ticks.load(Ordering::SeqCst) > 0);
        task.stop().await;
    }

    #[tokio::test]
    async fn test_stop_before_first_tick() {
        let task = BackgroundTask::spawn_interval(
            "idle",
            LogTag::System,
            Duration::from_secs(3600),
            || {},
        );
        assert_eq!(task.name(), "idle");
        task.stop().await;
    }
}
