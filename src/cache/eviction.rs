//! Eviction Strategy Module
//!
//! Policy objects deciding whether the cache is over budget and which entry
//! to remove when it is. Strategies answer two separate questions: "should
//! *something* be evicted right now" and "which *specific* entry goes first".
//! The manager decides the cadence (every get/set plus the periodic sweep);
//! strategies decide victim selection.

use crate::cache::entry::{now_millis, CacheEntry};

// == Eviction Strategy Trait ==
/// Decides whether and which cache entries to remove under pressure.
pub trait EvictionStrategy<T>: Send + Sync {
    /// Returns true if the given entry, or the cache as a whole, is over
    /// budget and something should be evicted.
    fn should_evict(&self, entry: &CacheEntry<T>, total_count: usize, total_memory: i64) -> bool;

    /// Picks the entry to evict from the candidates, or `None` if this
    /// strategy has no preference.
    fn select_victim<'a>(&self, candidates: &[&'a CacheEntry<T>]) -> Option<&'a CacheEntry<T>>;
}

// == LRU Strategy ==
/// Evicts the least recently accessed entry once the entry-count cap is hit.
#[derive(Debug)]
pub struct LruStrategy {
    max_size: usize,
}

impl LruStrategy {
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }
}

impl<T> EvictionStrategy<T> for LruStrategy {
    fn should_evict(&self, _entry: &CacheEntry<T>, total_count: usize, _total_memory: i64) -> bool {
        total_count > self.max_size
    }

    fn select_victim<'a>(&self, candidates: &[&'a CacheEntry<T>]) -> Option<&'a CacheEntry<T>> {
        candidates
            .iter()
            .min_by_key(|e| e.last_accessed)
            .copied()
    }
}

// == TTL Strategy ==
/// Evicts entries that have been idle longer than the TTL.
///
/// Expiry is idle-based (`now - last_accessed`), so an entry stays alive as
/// long as it keeps being read. Inactive when `ttl_ms <= 0`.
#[derive(Debug)]
pub struct TtlStrategy {
    ttl_ms: i64,
}

impl TtlStrategy {
    pub fn new(ttl_ms: i64) -> Self {
        Self { ttl_ms }
    }

    fn is_expired<T>(&self, entry: &CacheEntry<T>, now: u64) -> bool {
        self.ttl_ms > 0 && entry.idle_ms(now) > self.ttl_ms as u64
    }
}

impl<T> EvictionStrategy<T> for TtlStrategy {
    fn should_evict(&self, entry: &CacheEntry<T>, _total_count: usize, _total_memory: i64) -> bool {
        self.is_expired(entry, now_millis())
    }

    fn select_victim<'a>(&self, candidates: &[&'a CacheEntry<T>]) -> Option<&'a CacheEntry<T>> {
        let now = now_millis();
        // Oldest-created-first among the expired; None when nothing expired
        candidates
            .iter()
            .filter(|e| self.is_expired(e, now))
            .min_by_key(|e| e.created_at)
            .copied()
    }
}

// == Memory Strategy ==
/// Evicts the largest entry once the memory budget is exceeded.
///
/// Inactive when `max_memory <= 0`.
#[derive(Debug)]
pub struct MemoryStrategy {
    max_memory: i64,
}

impl MemoryStrategy {
    pub fn new(max_memory: i64) -> Self {
        Self { max_memory }
    }
}

impl<T> EvictionStrategy<T> for MemoryStrategy {
    fn should_evict(&self, _entry: &CacheEntry<T>, _total_count: usize, total_memory: i64) -> bool {
        self.max_memory > 0 && total_memory > self.max_memory
    }

    fn select_victim<'a>(&self, candidates: &[&'a CacheEntry<T>]) -> Option<&'a CacheEntry<T>> {
        // Largest first; ties broken by least recently accessed
        candidates
            .iter()
            .max_by(|a, b| {
                a.size
                    .cmp(&b.size)
                    .then(b.last_accessed.cmp(&a.last_accessed))
            })
            .copied()
    }
}

// == Composite Strategy ==
/// Aggregates several strategies; registration order is eviction priority.
///
/// `should_evict` is a logical OR across all members. `select_victim` returns
/// the first member's non-empty pick, so a TTL strategy registered ahead of
/// the LRU strategy drains expired entries before memory pressure forces a
/// choice among live ones.
pub struct CompositeStrategy<T> {
    strategies: Vec<Box<dyn EvictionStrategy<T>>>,
}

impl<T> Default for CompositeStrategy<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CompositeStrategy<T> {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Appends a strategy at the lowest priority so far.
    pub fn add_strategy(mut self, strategy: Box<dyn EvictionStrategy<T>>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Number of registered member strategies.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl<T> EvictionStrategy<T> for CompositeStrategy<T> {
    fn should_evict(&self, entry: &CacheEntry<T>, total_count: usize, total_memory: i64) -> bool {
        self.strategies
            .iter()
            .any(|s| s.should_evict(entry, total_count, total_memory))
    }

    fn select_victim<'a>(&self, candidates: &[&'a CacheEntry<T>]) -> Option<&'a CacheEntry<T>> {
        self.strategies
            .iter()
            .find_map(|s| s.select_victim(candidates))
    }
}
