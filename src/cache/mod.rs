//! In-memory TTL cache
//!
//! Memoizes values under string keys with a per-entry or default expiry.
//! Expiry is checked lazily on every read, and a background sweeper removes
//! entries that were written once and never read again.
//!
//! A single `RwLock` guards the map: reads share it, writes and sweeps take it
//! exclusively. No I/O happens while the lock is held.

pub mod config;

pub use config::CacheConfig;

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::logger::{self, LogTag};
use crate::tasks::BackgroundTask;

/// A stored value with its absolute expiry
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    /// An entry is logically absent once `now >= expires_at`
    fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Cache counters (serializable)
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub expired_removed: u64,
}

pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    expired_removed: AtomicU64,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expired_removed: AtomicU64::new(0),
        }
    }

    /// Store a value with the default TTL, replacing any existing entry
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.config.default_ttl);
    }

    /// Store a value with an explicit TTL, replacing any existing entry
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let now = Instant::now();
        // An unrepresentable expiry is as good as "never"
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + Duration::from_secs(100 * 365 * 24 * 3600));

        self.entries
            .write()
            .insert(key.into(), CacheEntry { value, expires_at });
    }

    /// Look up a live value; expired entries read as absent
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let found = {
            let entries = self.entries.read();
            entries
                .get(key)
                .filter(|entry| !entry.is_expired_at(now))
                .map(|entry| entry.value.clone())
        };

        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Return the cached value or compute, store and return a fresh one
    pub fn get_or_insert_with<F>(&self, key: &str, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(key) {
            return value;
        }
        // Computed outside the lock; concurrent callers may both compute
        let value = compute();
        self.set(key, value.clone());
        value
    }

    pub fn delete(&self, key: &str) {
        self.entries.write().remove(key);
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of stored entries, including expired ones not yet swept
    pub fn size(&self) -> usize {
        self.entries.read().len()
    }

    /// Remove every entry whose expiry has passed; returns how many were removed
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let removed = {
            let mut entries = self.entries.write();
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_expired_at(now));
            before - entries.len()
        };

        if removed > 0 {
            self.expired_removed
                .fetch_add(removed as u64, Ordering::Relaxed);
            logger::debug(
                LogTag::Cache,
                &format!("Swept {} expired entries ({} remaining)", removed, self.size()),
            );
        }
        removed
    }

    /// Start the periodic sweeper; stop it through the returned task
    pub fn spawn_sweeper(self: &Arc<Self>) -> BackgroundTask {
        let cache = Arc::clone(self);
        BackgroundTask::spawn_interval(
            "cache_sweeper",
            LogTag::Cache,
            self.config.sweep_interval,
            move || {
                cache.sweep_expired();
            },
        )
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.size(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired_removed: self.expired_removed.load(Ordering::Relaxed),
        }
    }
}

impl<V> std::fmt::Debug for TtlCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("entries", &self.entries.read().len())
            .field("config", &self.config)
            .finish()
    }
}
