//! # Tooling Cache
//!
//! A multi-tier caching subsystem for language tooling: a generic eviction
//! core plus document-, parse- and formatting-aware tiers built on top of it.
//!
//! ## Features
//!
//! - Generic [`CacheManager`] with pluggable eviction (LRU, TTL, memory,
//!   composites) and injectable size estimation
//! - Version-aware [`DocumentCache`] keyed by `{uri}_v{version}` with
//!   automatic invalidation of stale document versions
//! - [`ParseCache`] that layers parse metrics and diagnostics over the
//!   document tier
//! - Content-addressed [`FormattingCache`] fingerprinted by the formatting
//!   options that affect output
//! - Background cleanup tasks on tokio, owned and disposed explicitly
//!
//! ## Example
//!
//! ```ignore
//! use tooling_cache::{CacheConfig, CacheManager};
//!
//! let config = CacheConfig::default().with_max_size(100);
//! let cache: CacheManager<String> = CacheManager::new(config);
//!
//! cache.set("key", "value".to_string());
//! assert_eq!(cache.get("key"), Some("value".to_string()));
//! ```

pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod format;
pub mod parse;
pub mod tasks;

pub use cache::{
    CacheEntry, CacheManager, CacheStats, CompositeStrategy, EvictionStrategy, FixedEstimator,
    LruStrategy, MemoryStrategy, SerdeEstimator, SizeEstimator, TtlStrategy,
};
pub use config::{CacheConfig, DocumentCacheConfig};
pub use document::{DocumentCache, DocumentEvent, VersionTracker, VersionedResource};
pub use error::{CacheError, Result};
pub use format::{FormatOptions, FormattingCache, FormattingReport};
pub use parse::{Diagnostic, ParseCache, Parser, Severity};
