//! Continuous-refill token bucket

use parking_lot::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket with continuous refill
///
/// Tokens accrue at `refill_rate` per second up to `capacity`; there are no
/// fixed windows, so callers can't burst across a window boundary.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    refill_rate: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Create a full bucket. Negative or non-finite settings are treated as zero.
    pub fn new(capacity: f64, refill_rate: f64) -> Self {
        Self::new_at(capacity, refill_rate, Instant::now())
    }

    pub(crate) fn new_at(capacity: f64, refill_rate: f64, now: Instant) -> Self {
        let capacity = sanitize(capacity);
        Self {
            capacity,
            refill_rate: sanitize(refill_rate),
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: now,
            }),
        }
    }

    /// Try to take `cost` tokens
    pub fn allow(&self, cost: f64) -> bool {
        self.allow_at(cost, Instant::now())
    }

    /// Refill for the time elapsed until `now`, then take `cost` tokens if available
    ///
    /// A denied request consumes nothing. Non-finite or negative costs are denied.
    pub(crate) fn allow_at(&self, cost: f64, now: Instant) -> bool {
        if !cost.is_finite() || cost < 0.0 {
            return false;
        }

        let mut state = self.state.lock();
        self.refill(&mut state, now);

        if state.tokens >= cost {
            state.tokens -= cost;
            true
        } else {
            false
        }
    }

    fn refill(&self, state: &mut BucketState, now: Instant) {
        // Instants from before last_refill (callers racing on `now`) add nothing
        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_rate).min(self.capacity);
        if now > state.last_refill {
            state.last_refill = now;
        }
    }

    /// Tokens currently available, refilled up to `now`
    pub fn available(&self) -> f64 {
        let mut state = self.state.lock();
        self.refill(&mut state, Instant::now());
        state.tokens
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn refill_rate(&self) -> f64 {
        self.refill_rate
    }

    /// Time until an empty bucket is full again
    pub fn full_refill_time(&self) -> Option<Duration> {
        if self.refill_rate > 0.0 {
            Some(Duration::from_secs_f64(self.capacity / self.refill_rate))
        } else {
            None
        }
    }

    /// True when the bucket would be full at `now`, i.e. indistinguishable from a new one
    pub(crate) fn is_replenished_at(&self, now: Instant) -> bool {
        let state = self.state.lock();
        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        state.tokens + elapsed * self.refill_rate >= self.capacity
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_capacity_then_denies() {
        let start = Instant::now();
        let bucket = TokenBucket::new_at(10.0, 1.0, start);

        for i in 0..10 {
            assert!(bucket.allow_at(1.0, start), "token {} should be allowed", i + 1);
        }
        assert!(!bucket.allow_at(1.0, start), "11th token should be denied");
    }

    #[test]
    fn test_refill_after_one_interval() {
        let start = Instant::now();
        let bucket = TokenBucket::new_at(5.0, 2.0, start);
        for _ in 0..5 {
            assert!(bucket.allow_at(1.0, start));
        }
        assert!(!bucket.allow_at(1.0, start));

        // 1/R seconds buys exactly one token
        let later = start + Duration::from_millis(500);
        assert!(bucket.allow_at(1.0, later));
        assert!(!bucket.allow_at(1.0, later));
    }

    #[test]
    fn test_refill_capped_at_capacity() {
        let start = Instant::now();
        let bucket = TokenBucket::new_at(3.0, 100.0, start);
        assert!(bucket.allow_at(3.0, start));

        let much_later = start + Duration::from_secs(3600);
        assert!(bucket.allow_at(3.0, much_later));
        assert!(!bucket.allow_at(0.5, much_later));
    }

    #[test]
    fn test_denial_leaves_tokens_untouched() {
        let start = Instant::now();
        let bucket = TokenBucket::new_at(4.0, 0.0, start);
        assert!(!bucket.allow_at(5.0, start));
        assert!(bucket.allow_at(4.0, start));
    }

    #[test]
    fn test_invalid_cost_is_denied() {
        let bucket = TokenBucket::new(10.0, 1.0);
        assert!(!bucket.allow(f64::NAN));
        assert!(!bucket.allow(-1.0));
        assert!(!bucket.allow(f64::INFINITY));
        assert!(bucket.allow(0.0));
        assert_eq!(bucket.available(), 10.0);
    }

    #[test]
    fn test_real_clock_refill() {
        let bucket = TokenBucket::new(10.0, 1.0);
        for _ in 0..10 {
            assert!(bucket.allow(1.0));
        }
        assert!(!bucket.allow(1.0));

        std::thread::sleep(Duration::from_millis(1100));
        assert!(bucket.allow(1.0));
    }

    #[test]
    fn test_replenished_detection() {
        let start = Instant::now();
        let bucket = TokenBucket::new_at(2.0, 1.0, start);
        assert!(bucket.is_replenished_at(start));
        assert!(bucket.allow_at(2.0, start));
        assert!(!bucket.is_replenished_at(start + Duration::from_secs(1)));
        assert!(bucket.is_replenished_at(start + Duration::from_secs(2)));
        assert_eq!(bucket.full_refill_time(), Some(Duration::from_secs(2)));
    }
}
