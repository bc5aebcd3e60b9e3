//! Document Cache Module
//!
//! Version-aware cache layer for externally-versioned resources. Composes a
//! [`CacheManager`] with a [`VersionTracker`]: keys are derived from
//! (uri, version), stale versions are invalidated before they can be served,
//! and host-side document events translate into prefix invalidation.

use std::sync::Arc;

use parking_lot::Mutex;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{CacheManager, CacheStats, SerdeEstimator, SizeEstimator};
use crate::config::DocumentCacheConfig;
use crate::document::version::VersionTracker;

// == Versioned Resource ==
/// The minimal contract a host document must satisfy.
///
/// `uri` is a stable, globally unique identifier; `version` strictly
/// increases whenever the host changes the content.
pub trait VersionedResource {
    fn uri(&self) -> &str;
    fn version(&self) -> u64;
    fn text(&self) -> &str;
}

// == Document Event ==
/// Host notifications the cache reacts to.
///
/// These are the only points where the cache learns about the outside world;
/// there is no polling beyond the version check in `get`.
#[derive(Debug, Clone)]
pub enum DocumentEvent {
    /// The resource's content changed
    Changed { uri: String },
    /// The resource was saved
    Saved { uri: String },
    /// The resource was deleted
    Deleted { uri: String },
}

impl DocumentEvent {
    pub fn changed(uri: impl Into<String>) -> Self {
        Self::Changed { uri: uri.into() }
    }

    pub fn saved(uri: impl Into<String>) -> Self {
        Self::Saved { uri: uri.into() }
    }

    pub fn deleted(uri: impl Into<String>) -> Self {
        Self::Deleted { uri: uri.into() }
    }

    /// The resource this event concerns.
    pub fn uri(&self) -> &str {
        match self {
            Self::Changed { uri } | Self::Saved { uri } | Self::Deleted { uri } => uri,
        }
    }
}

// == Document Cache ==
/// Version-aware cache for per-document values.
pub struct DocumentCache<T> {
    manager: CacheManager<T>,
    tracker: Mutex<VersionTracker>,
    config: DocumentCacheConfig,
}

impl<T: Serialize + Send + Sync + 'static> DocumentCache<T> {
    // == Constructor ==
    /// Creates a document cache with the default serde-based size estimator.
    pub fn new(config: DocumentCacheConfig) -> Self {
        Self::with_estimator(config, Arc::new(SerdeEstimator))
    }
}

impl<T: Send + Sync + 'static> DocumentCache<T> {
    /// Creates a document cache with an explicit size estimator.
    ///
    /// Starts the periodic cleanup task when the configured interval is
    /// non-zero and a tokio runtime is available.
    pub fn with_estimator(
        config: DocumentCacheConfig,
        estimator: Arc<dyn SizeEstimator<T>>,
    ) -> Self {
        let manager = CacheManager::with_estimator(config.base.clone(), estimator);
        manager.start_cleanup();

        Self {
            manager,
            tracker: Mutex::new(VersionTracker::new()),
            config,
        }
    }
}

impl<T: 'static> DocumentCache<T> {
    // == Get ==
    /// Retrieves the cached value for the resource at its current version.
    ///
    /// With version tracking enabled, a resource whose observed version has
    /// moved on since the last `set` is stale: every cached version of it is
    /// invalidated and the lookup misses.
    pub fn get(&self, resource: &impl VersionedResource) -> Option<T>
    where
        T: Clone,
    {
        if !self.config.enable_version_tracking {
            return self.manager.get(resource.uri());
        }

        let stale = self
            .tracker
            .lock()
            .is_stale(resource.uri(), resource.version());
        if stale {
            debug!(uri = resource.uri(), version = resource.version(), "stale resource, invalidating");
            self.invalidate_document(resource.uri());
            return None;
        }

        let key = VersionTracker::cache_key(resource.uri(), resource.version());
        self.manager.get(&key)
    }

    // == Set ==
    /// Caches a value for the resource at its current version, using the
    /// configured size estimator.
    pub fn set(&self, resource: &impl VersionedResource, value: T) {
        let key = self.track_and_key(resource);
        self.manager.set(key, value);
    }

    /// Caches a value with a caller-supplied size estimate.
    pub fn set_with_size(&self, resource: &impl VersionedResource, value: T, size: usize) {
        let key = self.track_and_key(resource);
        self.manager.set_with_size(key, value, size);
    }

    fn track_and_key(&self, resource: &impl VersionedResource) -> String {
        if self.config.enable_version_tracking {
            self.tracker
                .lock()
                .track(resource.uri(), resource.version());
            VersionTracker::cache_key(resource.uri(), resource.version())
        } else {
            resource.uri().to_string()
        }
    }

    // == Delete ==
    /// Removes the entry for the resource at its current version.
    pub fn delete(&self, resource: &impl VersionedResource) -> bool {
        let key = if self.config.enable_version_tracking {
            VersionTracker::cache_key(resource.uri(), resource.version())
        } else {
            resource.uri().to_string()
        };
        self.manager.delete(&key)
    }

    // == Invalidate Document ==
    /// Deletes every cached entry for the resource, across all versions, and
    /// forgets its tracked version. Coarser than deleting a single version's
    /// key on purpose: historical versions may still be cached.
    pub fn invalidate_document(&self, uri: &str) -> usize {
        let pattern = match Regex::new(&format!("^{}", regex::escape(uri))) {
            Ok(pattern) => pattern,
            Err(err) => {
                warn!(uri, %err, "could not build invalidation pattern");
                return 0;
            }
        };

        let removed = self.manager.invalidate(&pattern);
        if self.config.enable_version_tracking {
            self.tracker.lock().clear_version(uri);
        }
        removed
    }

    // == Invalidate Pattern ==
    /// Deletes every cached entry whose key matches the pattern.
    pub fn invalidate_pattern(&self, pattern: &Regex) -> usize {
        self.manager.invalidate(pattern)
    }

    // == Handle Event ==
    /// Reacts to a host document event. Change, save, and delete all
    /// invalidate the document when auto-invalidation is enabled.
    pub fn handle_event(&self, event: &DocumentEvent) {
        if !self.config.auto_invalidate_on_change {
            return;
        }
        self.invalidate_document(event.uri());
    }

    // == Clear ==
    /// Drops all entries and tracked versions.
    pub fn clear(&self) {
        self.manager.clear();
        if self.config.enable_version_tracking {
            self.tracker.lock().clear_all();
        }
    }

    // == Stats ==
    /// Snapshot of the underlying manager's statistics.
    pub fn stats(&self) -> CacheStats {
        self.manager.stats()
    }

    // == Cleanup ==
    /// Manual sweep of the underlying manager.
    pub fn cleanup(&self) -> usize {
        self.manager.cleanup()
    }

    // == Dispose ==
    /// Cancels the cleanup task and drops all state. Idempotent.
    pub fn dispose(&self) {
        self.manager.dispose();
        self.tracker.lock().clear_all();
    }

    /// Current number of cached entries.
    pub fn len(&self) -> usize {
        self.manager.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manager.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;

    struct TestDoc {
        uri: String,
        version: u64,
        text: String,
    }

    impl TestDoc {
        fn new(uri: &str, version: u64) -> Self {
            Self {
                uri: uri.to_string(),
                version,
                text: String::new(),
            }
        }
    }

    impl VersionedResource for TestDoc {
        fn uri(&self) -> &str {
            &self.uri
        }
        fn version(&self) -> u64 {
            self.version
        }
        fn text(&self) -> &str {
            &self.text
        }
    }

    fn test_config() -> DocumentCacheConfig {
        DocumentCacheConfig::default().with_base(
            CacheConfig::default()
                .with_ttl_ms(-1)
                .with_cleanup_interval_ms(0),
        )
    }

    #[test]
    fn test_set_and_get_same_version() {
        let cache: DocumentCache<String> = DocumentCache::new(test_config());
        let doc = TestDoc::new("file:///a.c", 1);

        cache.set(&doc, "parsed".to_string());
        assert_eq!(cache.get(&doc), Some("parsed".to_string()));
    }

    #[test]
    fn test_new_version_is_stale_and_invalidates() {
        let cache: DocumentCache<String> = DocumentCache::new(test_config());
        let v1 = TestDoc::new("file:///a.c", 1);
        cache.set(&v1, "old".to_string());

        // The host bumped the version; the v1 entry must not survive
        let v2 = TestDoc::new("file:///a.c", 2);
        assert_eq!(cache.get(&v2), None);
        assert!(cache.is_empty(), "stale entries should be purged");

        // After the miss the resource is untracked again, so a fresh set
        // at v2 behaves like a new document
        cache.set(&v2, "new".to_string());
        assert_eq!(cache.get(&v2), Some("new".to_string()));
    }

    #[test]
    fn test_invalidate_document_removes_all_versions() {
        let cache: DocumentCache<String> = DocumentCache::new(test_config());
        cache.set(&TestDoc::new("file:///a.c", 1), "v1".to_string());
        cache.set(&TestDoc::new("file:///a.c", 2), "v2".to_string());
        cache.set(&TestDoc::new("file:///b.c", 1), "other".to_string());

        let removed = cache.invalidate_document("file:///a.c");

        assert_eq!(removed, 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.get(&TestDoc::new("file:///b.c", 1)),
            Some("other".to_string())
        );
    }

    #[test]
    fn test_invalidate_document_escapes_uri_metacharacters() {
        let cache: DocumentCache<String> = DocumentCache::new(test_config());
        cache.set(&TestDoc::new("file:///a+b.c", 1), "plus".to_string());
        cache.set(&TestDoc::new("file:///aab.c", 1), "other".to_string());

        // "+" must be treated literally, not as a regex quantifier
        let removed = cache.invalidate_document("file:///a+b.c");
        assert_eq!(removed, 1);
        assert!(cache.get(&TestDoc::new("file:///aab.c", 1)).is_some());
    }

    #[test]
    fn test_events_invalidate() {
        let cache: DocumentCache<String> = DocumentCache::new(test_config());
        let doc = TestDoc::new("file:///a.c", 1);
        cache.set(&doc, "x".to_string());

        cache.handle_event(&DocumentEvent::changed("file:///a.c"));
        assert!(cache.is_empty());

        cache.set(&doc, "x".to_string());
        cache.handle_event(&DocumentEvent::saved("file:///a.c"));
        assert!(cache.is_empty());

        cache.set(&doc, "x".to_string());
        cache.handle_event(&DocumentEvent::deleted("file:///a.c"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_auto_invalidate_disabled_ignores_events() {
        let config = test_config().with_auto_invalidate(false);
        let cache: DocumentCache<String> = DocumentCache::new(config);
        let doc = TestDoc::new("file:///a.c", 1);
        cache.set(&doc, "x".to_string());

        cache.handle_event(&DocumentEvent::changed("file:///a.c"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_version_tracking_disabled_uses_uri_key() {
        let config = test_config().with_version_tracking(false);
        let cache: DocumentCache<String> = DocumentCache::new(config);

        cache.set(&TestDoc::new("file:///a.c", 1), "x".to_string());
        // Without tracking, any version maps to the same uri key
        assert_eq!(
            cache.get(&TestDoc::new("file:///a.c", 99)),
            Some("x".to_string())
        );
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear_forgets_versions() {
        let cache: DocumentCache<String> = DocumentCache::new(test_config());
        cache.set(&TestDoc::new("file:///a.c", 5), "x".to_string());

        cache.clear();

        // Version 1 of a cleared resource is trusted again (unseen)
        let v1 = TestDoc::new("file:///a.c", 1);
        cache.set(&v1, "y".to_string());
        assert_eq!(cache.get(&v1), Some("y".to_string()));
    }

    #[test]
    fn test_dispose_idempotent() {
        let cache: DocumentCache<String> = DocumentCache::new(test_config());
        cache.set(&TestDoc::new("file:///a.c", 1), "x".to_string());

        cache.dispose();
        cache.dispose();
        assert!(cache.is_empty());
    }
}
