//! Configuration Module
//!
//! Construction-time configuration for cache instances. A config is immutable
//! once a manager has been built from it. Values can also be loaded from
//! environment variables with sensible defaults.

use std::env;

// == Cache Config ==
/// Configuration for a [`CacheManager`](crate::cache::CacheManager) instance.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub max_size: usize,
    /// Maximum memory usage in bytes (approximate), -1 = unlimited
    pub max_memory: i64,
    /// Time-to-live in milliseconds, -1 = entries never expire
    pub ttl_ms: i64,
    /// Background cleanup interval in milliseconds, 0 = disabled
    pub cleanup_interval_ms: u64,
    /// Whether to record access latencies for statistics
    pub enable_monitoring: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 100,
            max_memory: -1,
            ttl_ms: -1,
            cleanup_interval_ms: 60_000,
            enable_monitoring: true,
        }
    }
}

impl CacheConfig {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_SIZE` - Maximum cache entries (default: 100)
    /// - `CACHE_MAX_MEMORY` - Memory budget in bytes, -1 unlimited (default: -1)
    /// - `CACHE_TTL_MS` - TTL in milliseconds, -1 unlimited (default: -1)
    /// - `CACHE_CLEANUP_INTERVAL_MS` - Cleanup frequency, 0 disabled (default: 60000)
    /// - `CACHE_MONITORING` - Enable access-time monitoring (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_size: env::var("CACHE_MAX_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_size),
            max_memory: env::var("CACHE_MAX_MEMORY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_memory),
            ttl_ms: env::var("CACHE_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.ttl_ms),
            cleanup_interval_ms: env::var("CACHE_CLEANUP_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cleanup_interval_ms),
            enable_monitoring: env::var("CACHE_MONITORING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.enable_monitoring),
        }
    }

    /// Set the maximum number of entries
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set the memory budget in bytes (-1 = unlimited)
    pub fn with_max_memory(mut self, max_memory: i64) -> Self {
        self.max_memory = max_memory;
        self
    }

    /// Set the TTL in milliseconds (-1 = never expire)
    pub fn with_ttl_ms(mut self, ttl_ms: i64) -> Self {
        self.ttl_ms = ttl_ms;
        self
    }

    /// Set the cleanup interval in milliseconds (0 = disabled)
    pub fn with_cleanup_interval_ms(mut self, cleanup_interval_ms: u64) -> Self {
        self.cleanup_interval_ms = cleanup_interval_ms;
        self
    }

    /// Enable or disable access-time monitoring
    pub fn with_monitoring(mut self, enable_monitoring: bool) -> Self {
        self.enable_monitoring = enable_monitoring;
        self
    }
}

// == Document Cache Config ==
/// Configuration for a [`DocumentCache`](crate::document::DocumentCache).
///
/// Extends [`CacheConfig`] with version-tracking behavior. The base defaults
/// are tuned for editor documents rather than the generic manager defaults:
/// 50 entries, 10 MB, 5 minute TTL, 1 minute cleanup.
#[derive(Debug, Clone)]
pub struct DocumentCacheConfig {
    /// Underlying cache manager configuration
    pub base: CacheConfig,
    /// Derive cache keys from (uri, version) and reject stale versions
    pub enable_version_tracking: bool,
    /// Invalidate cached entries when the host reports document events
    pub auto_invalidate_on_change: bool,
}

impl Default for DocumentCacheConfig {
    fn default() -> Self {
        Self {
            base: CacheConfig {
                max_size: 50,
                max_memory: 10 * 1024 * 1024,
                ttl_ms: 5 * 60 * 1000,
                cleanup_interval_ms: 60 * 1000,
                enable_monitoring: true,
            },
            enable_version_tracking: true,
            auto_invalidate_on_change: true,
        }
    }
}

impl DocumentCacheConfig {
    /// Replace the underlying cache configuration
    pub fn with_base(mut self, base: CacheConfig) -> Self {
        self.base = base;
        self
    }

    /// Enable or disable version tracking
    pub fn with_version_tracking(mut self, enabled: bool) -> Self {
        self.enable_version_tracking = enabled;
        self
    }

    /// Enable or disable automatic invalidation on document events
    pub fn with_auto_invalidate(mut self, enabled: bool) -> Self {
        self.auto_invalidate_on_change = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.max_size, 100);
        assert_eq!(config.max_memory, -1);
        assert_eq!(config.ttl_ms, -1);
        assert_eq!(config.cleanup_interval_ms, 60_000);
        assert!(config.enable_monitoring);
    }

    #[test]
    fn test_config_builder() {
        let config = CacheConfig::default()
            .with_max_size(500)
            .with_max_memory(50 * 1024 * 1024)
            .with_ttl_ms(60_000)
            .with_cleanup_interval_ms(0)
            .with_monitoring(false);

        assert_eq!(config.max_size, 500);
        assert_eq!(config.max_memory, 50 * 1024 * 1024);
        assert_eq!(config.ttl_ms, 60_000);
        assert_eq!(config.cleanup_interval_ms, 0);
        assert!(!config.enable_monitoring);
    }

    #[test]
    fn test_document_config_default() {
        let config = DocumentCacheConfig::default();
        assert_eq!(config.base.max_size, 50);
        assert_eq!(config.base.max_memory, 10 * 1024 * 1024);
        assert_eq!(config.base.ttl_ms, 5 * 60 * 1000);
        assert!(config.enable_version_tracking);
        assert!(config.auto_invalidate_on_change);
    }
}
