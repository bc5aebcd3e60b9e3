//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of cache performance metrics.
///
/// The manager keeps one of these up to date after every mutating operation;
/// [`CacheManager::stats`](crate::cache::CacheManager::stats) returns a copy,
/// never a live reference.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Current number of entries in the cache
    pub size: usize,
    /// Approximate memory usage in bytes
    pub memory: i64,
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals
    pub misses: u64,
    /// hits / (hits + misses), 0.0 when no requests have been made
    pub hit_rate: f64,
    /// Number of entries evicted under pressure
    pub evictions: u64,
    /// Average access latency in milliseconds (monitoring only)
    pub avg_access_time_ms: f64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Eviction ==
    /// Increments the eviction counter.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Total Requests ==
    /// Returns hits + misses.
    pub fn total_requests(&self) -> u64 {
        self.hits + self.misses
    }

    // == Recompute ==
    /// Refreshes the derived fields from the live store totals.
    pub fn recompute(&mut self, size: usize, memory: i64, avg_access_time_ms: f64) {
        self.size = size;
        self.memory = memory;
        let total = self.hits + self.misses;
        self.hit_rate = if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        };
        self.avg_access_time_ms = avg_access_time_ms;
    }
}
