//! Cache Manager Module
//!
//! Generic key-value cache engine combining HashMap storage with a composite
//! eviction strategy, approximate memory accounting, and statistics.
//!
//! The entry map is guarded by a `parking_lot::RwLock`, so a manager handle is
//! cheap to clone and safe to share across threads. All operations run to
//! completion without suspension; the only asynchronous piece is the optional
//! periodic cleanup task, which is owned by the manager and cancelled in
//! [`CacheManager::dispose`].
//!
//! Limits are soft: when the eviction strategy cannot name a victim while the
//! cache is still over budget, the insert proceeds anyway. Bounded-effort
//! eviction, not hard guarantees.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use regex::Regex;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::entry::CacheEntry;
use crate::cache::eviction::{
    CompositeStrategy, EvictionStrategy, LruStrategy, MemoryStrategy, TtlStrategy,
};
use crate::cache::size::{SerdeEstimator, SizeEstimator};
use crate::cache::stats::CacheStats;
use crate::config::CacheConfig;
use crate::tasks::spawn_cleanup_task;

/// Number of access-latency samples retained for the moving average.
const ACCESS_SAMPLE_WINDOW: usize = 1000;

// == Inner State ==
/// Everything mutated under the entry-map lock.
struct CacheInner<T> {
    entries: HashMap<String, CacheEntry<T>>,
    total_memory: i64,
    stats: CacheStats,
    access_times: VecDeque<f64>,
}

impl<T> CacheInner<T> {
    /// Removes an entry and decrements the memory total.
    fn remove(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.total_memory -= entry.size as i64;
                true
            }
            None => false,
        }
    }

    fn avg_access_time(&self) -> f64 {
        if self.access_times.is_empty() {
            0.0
        } else {
            self.access_times.iter().sum::<f64>() / self.access_times.len() as f64
        }
    }

    /// Refreshes the derived statistics fields from the live totals.
    fn refresh_stats(&mut self) {
        let avg = self.avg_access_time();
        self.stats
            .recompute(self.entries.len(), self.total_memory, avg);
    }

    fn record_access_time(&mut self, elapsed_ms: f64) {
        self.access_times.push_back(elapsed_ms);
        if self.access_times.len() > ACCESS_SAMPLE_WINDOW {
            self.access_times.pop_front();
        }
    }
}

// == Cache Manager ==
/// Generic cache store with composite eviction and statistics.
///
/// Cloning a `CacheManager` produces another handle to the same store.
pub struct CacheManager<T> {
    inner: Arc<RwLock<CacheInner<T>>>,
    strategy: Arc<dyn EvictionStrategy<T>>,
    estimator: Arc<dyn SizeEstimator<T>>,
    config: CacheConfig,
    cleanup_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl<T: 'static> Clone for CacheManager<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            strategy: Arc::clone(&self.strategy),
            estimator: Arc::clone(&self.estimator),
            config: self.config.clone(),
            cleanup_task: Arc::clone(&self.cleanup_task),
        }
    }
}

impl<T: Serialize + 'static> CacheManager<T> {
    // == Constructor ==
    /// Creates a manager with the default serde-based size estimator.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_estimator(config, Arc::new(SerdeEstimator))
    }
}

// The strategy and estimator fields are 'static trait objects, so the value
// type has to outlive them.
impl<T: 'static> CacheManager<T> {
    /// Creates a manager with an explicit size estimator, for value types
    /// that are not serializable or need a cheaper measure.
    pub fn with_estimator(config: CacheConfig, estimator: Arc<dyn SizeEstimator<T>>) -> Self {
        // Registration order is eviction priority: drain expired entries
        // first, relieve memory pressure next, fall back to plain LRU.
        let mut composite = CompositeStrategy::new();
        if config.ttl_ms > 0 {
            composite = composite.add_strategy(Box::new(TtlStrategy::new(config.ttl_ms)));
        }
        if config.max_memory > 0 {
            composite = composite.add_strategy(Box::new(MemoryStrategy::new(config.max_memory)));
        }
        composite = composite.add_strategy(Box::new(LruStrategy::new(config.max_size)));

        Self {
            inner: Arc::new(RwLock::new(CacheInner {
                entries: HashMap::new(),
                total_memory: 0,
                stats: CacheStats::new(),
                access_times: VecDeque::new(),
            })),
            strategy: Arc::new(composite),
            estimator,
            config,
            cleanup_task: Arc::new(Mutex::new(None)),
        }
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// An entry the strategy flags for eviction (expired TTL, memory
    /// pressure) is deleted on the spot and counted as a miss, even between
    /// periodic sweeps. A hit refreshes the entry's access metadata and
    /// returns a clone of the stored value.
    pub fn get(&self, key: &str) -> Option<T>
    where
        T: Clone,
    {
        let started = self.config.enable_monitoring.then(Instant::now);

        let mut inner = self.inner.write();
        let total_count = inner.entries.len();
        let total_memory = inner.total_memory;

        let hit = match inner.entries.get_mut(key) {
            None => {
                inner.stats.record_miss();
                inner.refresh_stats();
                return None;
            }
            Some(entry) => {
                if self.strategy.should_evict(entry, total_count, total_memory) {
                    None
                } else {
                    entry.touch();
                    Some(entry.value.clone())
                }
            }
        };

        match hit {
            None => {
                // Lazy eviction outside the periodic sweep
                inner.remove(key);
                inner.stats.record_miss();
                inner.refresh_stats();
                None
            }
            Some(value) => {
                inner.stats.record_hit();
                if let Some(started) = started {
                    inner.record_access_time(started.elapsed().as_secs_f64() * 1000.0);
                }
                inner.refresh_stats();
                Some(value)
            }
        }
    }

    // == Set ==
    /// Stores a value, estimating its size with the configured estimator.
    pub fn set(&self, key: impl Into<String>, value: T) {
        let size = self.estimator.estimate(&value);
        self.set_with_size(key, value, size);
    }

    /// Stores a value with a caller-supplied size estimate.
    ///
    /// An existing entry under the same key is removed first so its size is
    /// never double counted. Entries are then evicted one victim at a time
    /// while the prospective totals violate the configured limits; if the
    /// strategy cannot name a victim, the insert proceeds over budget.
    pub fn set_with_size(&self, key: impl Into<String>, value: T, size: usize) {
        let key = key.into();
        let mut inner = self.inner.write();

        inner.remove(&key);

        let entry = CacheEntry::new(key.clone(), value, size);

        loop {
            let total_count = inner.entries.len() + 1;
            let total_memory = inner.total_memory + size as i64;
            if !self.strategy.should_evict(&entry, total_count, total_memory) {
                break;
            }

            let victim = {
                let candidates: Vec<&CacheEntry<T>> = inner.entries.values().collect();
                self.strategy
                    .select_victim(&candidates)
                    .map(|e| e.key.clone())
            };

            match victim {
                Some(victim_key) => {
                    inner.remove(&victim_key);
                    inner.stats.record_eviction();
                }
                None => break,
            }
        }

        inner.total_memory += size as i64;
        inner.entries.insert(key, entry);
        inner.refresh_stats();
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether anything was removed.
    pub fn delete(&self, key: &str) -> bool {
        let mut inner = self.inner.write();
        let removed = inner.remove(key);
        if removed {
            inner.refresh_stats();
        }
        removed
    }

    // == Clear ==
    /// Drops all entries and resets memory to zero.
    ///
    /// Hit/miss/eviction counters survive a clear; only
    /// [`reset_stats`](Self::reset_stats) zeroes them.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.entries.clear();
        inner.total_memory = 0;
        inner.refresh_stats();
    }

    // == Invalidate ==
    /// Deletes every entry whose key matches the pattern. Returns the number
    /// of entries removed.
    pub fn invalidate(&self, pattern: &Regex) -> usize {
        let mut inner = self.inner.write();

        // Snapshot before deleting; mutating the map while iterating it is
        // not an option.
        let matching: Vec<String> = inner
            .entries
            .keys()
            .filter(|k| pattern.is_match(k))
            .cloned()
            .collect();

        let mut count = 0;
        for key in &matching {
            if inner.remove(key) {
                count += 1;
            }
        }
        if count > 0 {
            inner.refresh_stats();
            debug!(count, pattern = pattern.as_str(), "invalidated cache entries");
        }
        count
    }

    // == Has ==
    /// Checks whether a key is present (no staleness check, no stats impact).
    pub fn has(&self, key: &str) -> bool {
        self.inner.read().entries.contains_key(key)
    }

    // == Keys ==
    /// Returns a snapshot of all live keys.
    pub fn keys(&self) -> Vec<String> {
        self.inner.read().entries.keys().cloned().collect()
    }

    // == Stats ==
    /// Returns a copy of the current statistics.
    pub fn stats(&self) -> CacheStats {
        self.inner.read().stats.clone()
    }

    /// Zeroes the hit/miss/eviction counters and the latency samples; the
    /// size and memory fields keep reflecting the live store.
    pub fn reset_stats(&self) {
        let mut inner = self.inner.write();
        inner.stats = CacheStats::new();
        inner.access_times.clear();
        inner.refresh_stats();
    }

    // == Cleanup ==
    /// Proactive sweep: deletes every entry the strategy flags against the
    /// current totals, counting evictions. Returns the number removed.
    ///
    /// Totals are re-read after each removal, so a sweep of an over-budget
    /// cache stops evicting as soon as the pressure is relieved.
    pub fn cleanup(&self) -> usize {
        let mut inner = self.inner.write();
        let keys: Vec<String> = inner.entries.keys().cloned().collect();

        let mut removed = 0;
        for key in keys {
            let total_count = inner.entries.len();
            let total_memory = inner.total_memory;
            let flagged = match inner.entries.get(&key) {
                Some(entry) => self.strategy.should_evict(entry, total_count, total_memory),
                None => false,
            };
            if flagged && inner.remove(&key) {
                inner.stats.record_eviction();
                removed += 1;
            }
        }
        if removed > 0 {
            inner.refresh_stats();
        }
        removed
    }

    // == Start Cleanup Task ==
    /// Spawns the periodic cleanup task if the configured interval is
    /// non-zero and a tokio runtime is available. Calling this again while a
    /// task is running is a no-op.
    pub fn start_cleanup(&self)
    where
        T: Send + Sync + 'static,
    {
        if self.config.cleanup_interval_ms == 0 {
            return;
        }
        if tokio::runtime::Handle::try_current().is_err() {
            debug!("no async runtime available, periodic cleanup not started");
            return;
        }

        let mut slot = self.cleanup_task.lock();
        if slot.is_some() {
            return;
        }

        let manager = self.clone();
        let interval = Duration::from_millis(self.config.cleanup_interval_ms);
        *slot = Some(spawn_cleanup_task(move || manager.cleanup(), interval));
    }

    // == Dispose ==
    /// Cancels the cleanup task and clears the store. Idempotent: safe to
    /// call twice or on a manager whose task was never started.
    pub fn dispose(&self) {
        if let Some(handle) = self.cleanup_task.lock().take() {
            handle.abort();
        }
        self.clear();
    }

    // == Accessors ==
    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    /// The configuration this manager was built from.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

impl<T: 'static> std::fmt::Debug for CacheManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("CacheManager")
            .field("max_size", &self.config.max_size)
            .field("max_memory", &self.config.max_memory)
            .field("ttl_ms", &self.config.ttl_ms)
            .field("current_entries", &inner.entries.len())
            .field("memory_used", &inner.total_memory)
            .finish()
    }
}
