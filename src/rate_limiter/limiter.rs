//! Per-key rate limiter
//!
//! One `TokenBucket` per key, created lazily on first use. The map lock is only
//! held to find or create a bucket; refill and consume happen under the
//! bucket's own lock, so different keys never contend on bucket internals.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::bucket::TokenBucket;
use super::client_key::{resolve_key, RequestContext};
use crate::config::RateLimitConfig;
use crate::logger::{self, LogTag};
use crate::tasks::BackgroundTask;

/// Limiter counters (serializable)
#[derive(Debug, Clone, Default, Serialize)]
pub struct RateLimiterStats {
    pub tracked_keys: usize,
    pub allowed: u64,
    pub denied: u64,
    pub swept: u64,
}

pub struct RateLimiter {
    buckets: RwLock<HashMap<String, Arc<TokenBucket>>>,
    capacity: f64,
    refill_rate: f64,
    allowed: AtomicU64,
    denied: AtomicU64,
    swept: AtomicU64,
}

impl RateLimiter {
    /// Buckets hold `capacity` tokens and refill at `refill_rate` tokens per second
    pub fn new(capacity: f64, refill_rate: f64) -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            capacity,
            refill_rate,
            allowed: AtomicU64::new(0),
            denied: AtomicU64::new(0),
            swept: AtomicU64::new(0),
        }
    }

    /// `max_requests` burst, refilled evenly over one minute
    pub fn per_minute(max_requests: f64) -> Self {
        Self::new(max_requests, max_requests / 60.0)
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::per_minute(config.requests_per_minute)
    }

    /// Admission decision for `key`; denial is a normal outcome, not an error
    pub fn allow(&self, key: &str, cost: f64) -> bool {
        let allowed = self.bucket_for(key).allow(cost);

        if allowed {
            self.allowed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.denied.fetch_add(1, Ordering::Relaxed);
            logger::debug(
                LogTag::RateLimit,
                &format!("Denied {} (cost {})", key, cost),
            );
        }
        allowed
    }

    /// Resolve the key for a request and charge it one token
    pub fn allow_request(&self, ctx: &RequestContext) -> bool {
        self.allow(&resolve_key(ctx), 1.0)
    }

    fn bucket_for(&self, key: &str) -> Arc<TokenBucket> {
        if let Some(bucket) = self.buckets.read().get(key) {
            return Arc::clone(bucket);
        }

        let mut buckets = self.buckets.write();
        // Another caller may have created it between the two locks
        Arc::clone(
            buckets
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(TokenBucket::new(self.capacity, self.refill_rate))),
        )
    }

    /// Drop buckets that have refilled completely
    ///
    /// A full bucket behaves exactly like one created on the next request, so
    /// removing it bounds map growth without resetting any caller that is
    /// still consuming tokens.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub(crate) fn sweep_at(&self, now: Instant) -> usize {
        let removed = {
            let mut buckets = self.buckets.write();
            let before = buckets.len();
            buckets.retain(|_, bucket| {
                // Someone else holds a clone mid-request, keep it
                Arc::strong_count(bucket) > 1 || !bucket.is_replenished_at(now)
            });
            before - buckets.len()
        };

        if removed > 0 {
            self.swept.fetch_add(removed as u64, Ordering::Relaxed);
            logger::debug(
                LogTag::RateLimit,
                &format!("Swept {} idle buckets ({} tracked)", removed, self.tracked_keys()),
            );
        }
        removed
    }

    /// Forget every bucket, including ones mid-budget
    ///
    /// Every caller gets a fresh full budget afterwards. Use `sweep` for routine
    /// maintenance.
    pub fn reset(&self) {
        let cleared = {
            let mut buckets = self.buckets.write();
            let count = buckets.len();
            buckets.clear();
            count
        };
        logger::info(
            LogTag::RateLimit,
            &format!("Rate limiter reset ({} buckets cleared)", cleared),
        );
    }

    /// Start periodic sweeping; stop it through the returned task
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> BackgroundTask {
        let limiter = Arc::clone(self);
        BackgroundTask::spawn_interval("ratelimit_sweeper", LogTag::RateLimit, period, move || {
            limiter.sweep();
        })
    }

    pub fn tracked_keys(&self) -> usize {
        self.buckets.read().len()
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn refill_rate(&self) -> f64 {
        self.refill_rate
    }

    pub fn stats(&self) -> RateLimiterStats {
        RateLimiterStats {
            tracked_keys: self.tracked_keys(),
            allowed: self.allowed.load(Ordering::Relaxed),
            denied: self.denied.load(Ordering::Relaxed),
            swept: self.swept.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("capacity", &self.capacity)
            .field("refill_rate", &self.refill_rate)
            .field("tracked_keys", &self.tracked_keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_minute_budget() {
        let limiter = RateLimiter::per_minute(60.0);
        for i in 0..60 {
            assert!(limiter.allow("192.168.1.1", 1.0), "request {} should pass", i + 1);
        }
        assert!(!limiter.allow("192.168.1.1", 1.0), "61st request should be denied");

        let stats = limiter.stats();
        assert_eq!(stats.allowed, 60);
        assert_eq!(stats.denied, 1);
        assert_eq!(stats.tracked_keys, 1);
    }

    #[test]
    fn test_keys_have_independent_budgets() {
        let limiter = RateLimiter::new(3.0, 0.0);
        for _ in 0..3 {
            assert!(limiter.allow("a", 1.0));
        }
        assert!(!limiter.allow("a", 1.0));

        for _ in 0..3 {
            assert!(limiter.allow("b", 1.0));
        }
        assert!(!limiter.allow("b", 1.0));
    }

    #[test]
    fn test_capacity_then_refill_scenario() {
        let limiter = RateLimiter::new(10.0, 1.0);
        for _ in 0..10 {
            assert!(limiter.allow("client", 1.0));
        }
        assert!(!limiter.allow("client", 1.0));

        std::thread::sleep(Duration::from_millis(1100));
        assert!(limiter.allow("client", 1.0));
    }

    #[test]
    fn test_forwarded_and_raw_keys_are_independent_under_load() {
        let limiter = Arc::new(RateLimiter::new(500.0, 0.0));
        let forwarded = RequestContext::from_remote("127.0.0.1:9").with_forwarded_for("10.0.0.1");
        let raw = RequestContext::from_remote("127.0.0.1:9");

        let handles: Vec<_> = [forwarded, raw]
            .into_iter()
            .flat_map(|ctx| {
                let limiter = limiter.clone();
                (0..4).map(move |_| {
                    let limiter = limiter.clone();
                    let ctx = ctx.clone();
                    std::thread::spawn(move || {
                        (0..200).filter(|_| limiter.allow_request(&ctx)).count()
                    })
                })
            })
            .collect();

        let admitted: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let forwarded_total: usize = admitted[..4].iter().sum();
        let raw_total: usize = admitted[4..].iter().sum();

        // 800 attempts per key against a budget of 500
        assert_eq!(forwarded_total, 500);
        assert_eq!(raw_total, 500);
        assert_eq!(limiter.tracked_keys(), 2);
    }

    #[test]
    fn test_sweep_keeps_active_buckets() {
        let limiter = RateLimiter::new(5.0, 1.0);
        assert!(limiter.allow("idle", 1.0));
        for _ in 0..4 {
            assert!(limiter.allow("busy", 1.0));
        }

        // 2s later "idle" is full again, "busy" is still short
        let now = Instant::now() + Duration::from_secs(2);
        assert_eq!(limiter.sweep_at(now), 1);
        assert_eq!(limiter.tracked_keys(), 1);

        assert!(limiter.allow("busy", 1.0));
        assert!(!limiter.allow("busy", 1.0));
        assert_eq!(limiter.stats().swept, 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let limiter = RateLimiter::new(1.0, 0.0);
        assert!(limiter.allow("a", 1.0));
        assert!(!limiter.allow("a", 1.0));

        limiter.reset();
        assert_eq!(limiter.tracked_keys(), 0);
        assert!(limiter.allow("a", 1.0));
    }

    #[tokio::test]
    async fn test_background_sweeper() {
        let limiter = Arc::new(RateLimiter::new(1.0, 1000.0));
        assert!(limiter.allow("a", 1.0));
        assert!(limiter.allow("b", 1.0));

        let sweeper = limiter.spawn_sweeper(Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(80)).await;
        sweeper.stop().await;

        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[tokio::test]
    async fn test_zero_period_sweeper_still_sweeps() {
        let limiter = Arc::new(RateLimiter::new(1.0, 1000.0));
        assert!(limiter.allow("a", 1.0));

        let sweeper = limiter.spawn_sweeper(Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!sweeper.is_finished());
        sweeper.stop().await;

        assert_eq!(limiter.tracked_keys(), 0);
    }
}
