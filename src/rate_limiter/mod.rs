//! Per-key admission control
//!
//! ## Module Structure
//! - `bucket`: continuous-refill token bucket
//! - `limiter`: key → bucket map with two-tier locking and idle sweeping
//! - `client_key`: deriving the key (client address) from request metadata

pub mod bucket;
pub mod client_key;
pub mod limiter;

pub use bucket::TokenBucket;
pub use client_key::{
    resolve_key, RequestContext, FALLBACK_KEY, FORWARDED_FOR_HEADER, REAL_IP_HEADER,
};
pub use limiter::{RateLimiter, RateLimiterStats};
