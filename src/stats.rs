//! Statistics for the cache.
//!
//! Counters are per store instance and in-process only; other processes
//! sharing the same root keep their own.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters for cache operations.
///
/// Use `CacheStore::stats()` to get a snapshot.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Reads that returned a value.
    hits: AtomicU64,

    /// Reads that returned nothing, for any reason.
    misses: AtomicU64,

    /// Entries removed because their TTL had passed.
    expirations: AtomicU64,

    /// Entries removed because they were empty or undecodable.
    corruptions: AtomicU64,

    /// Successful writes.
    sets: AtomicU64,

    /// Writes that failed after the key was accepted.
    write_failures: AtomicU64,

    /// Entry files removed by delete, clear, or prune.
    deletes: AtomicU64,

    /// Keys refused by sanitization or the root check.
    rejections: AtomicU64,
}

impl CacheStats {
    /// Create a new stats instance with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expiration(&self) {
        self.expirations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_corruption(&self) {
        self.corruptions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_set(&self) {
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deletes(&self, count: u64) {
        self.deletes.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_rejection(&self) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
    }

    // Getters for reading statistics

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn expirations(&self) -> u64 {
        self.expirations.load(Ordering::Relaxed)
    }

    pub fn corruptions(&self) -> u64 {
        self.corruptions.load(Ordering::Relaxed)
    }

    pub fn sets(&self) -> u64 {
        self.sets.load(Ordering::Relaxed)
    }

    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    pub fn rejections(&self) -> u64 {
        self.rejections.load(Ordering::Relaxed)
    }

    /// Calculate the hit rate as a percentage (0.0 to 100.0).
    /// Returns 0.0 if no reads have been performed.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }

    /// Create a snapshot of the current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits(),
            misses: self.misses(),
            expirations: self.expirations(),
            corruptions: self.corruptions(),
            sets: self.sets(),
            write_failures: self.write_failures(),
            deletes: self.deletes(),
            rejections: self.rejections(),
            hit_rate: self.hit_rate(),
        }
    }
}

/// A point-in-time snapshot of cache statistics.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub corruptions: u64,
    pub sets: u64,
    pub write_failures: u64,
    pub deletes: u64,
    pub rejections: u64,
    pub hit_rate: f64,
}
