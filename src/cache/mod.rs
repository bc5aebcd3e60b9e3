//! Generic Cache Engine
//!
//! Provides the strategy-pluggable cache store: entry storage, composite
//! eviction (LRU, TTL, memory pressure), size estimation, and statistics.

mod entry;
mod eviction;
mod manager;
mod size;
mod stats;


// Re-export public types
pub use entry::{now_millis, CacheEntry};
pub use eviction::{
    CompositeStrategy, EvictionStrategy, LruStrategy, MemoryStrategy, TtlStrategy,
};
pub use manager::CacheManager;
pub use size::{FixedEstimator, SerdeEstimator, SizeEstimator, FALLBACK_SIZE};
pub use stats::CacheStats;
