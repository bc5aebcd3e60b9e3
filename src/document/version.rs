//! Version Tracker Module
//!
//! Maps resource identifiers to their last-observed version and derives the
//! composite cache keys the document tier stores under. Holds no cache
//! entries itself; purely a lookup table with an independent lifecycle.

use std::collections::HashMap;

// == Version Tracker ==
/// Last-observed version per resource URI.
#[derive(Debug, Default)]
pub struct VersionTracker {
    versions: HashMap<String, u64>,
}

impl VersionTracker {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Track ==
    /// Records (or overwrites) the version for a resource.
    pub fn track(&mut self, uri: &str, version: u64) {
        self.versions.insert(uri.to_string(), version);
    }

    // == Is Stale ==
    /// Returns true when a tracked version exists and differs from the one
    /// presented. Unseen resources are trusted and never stale.
    pub fn is_stale(&self, uri: &str, version: u64) -> bool {
        match self.versions.get(uri) {
            None => false,
            Some(tracked) => *tracked != version,
        }
    }

    // == Cache Key ==
    /// Composite key for a (resource, version) pair. Distinct versions of
    /// the same resource never collide; distinct resources are kept apart by
    /// the URI's global uniqueness.
    pub fn cache_key(uri: &str, version: u64) -> String {
        format!("{uri}_v{version}")
    }

    // == Clear Version ==
    /// Forgets the tracked version for one resource.
    pub fn clear_version(&mut self, uri: &str) {
        self.versions.remove(uri);
    }

    // == Clear All ==
    /// Forgets every tracked version.
    pub fn clear_all(&mut self) {
        self.versions.clear();
    }

    // == Length ==
    /// Number of resources currently tracked.
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unseen_resource_is_not_stale() {
        let tracker = VersionTracker::new();
        assert!(!tracker.is_stale("file:///a.c", 3));
    }

    #[test]
    fn test_tracked_version_matches() {
        let mut tracker = VersionTracker::new();
        tracker.track("file:///a.c", 3);

        assert!(!tracker.is_stale("file:///a.c", 3));
        assert!(tracker.is_stale("file:///a.c", 4));
        assert!(tracker.is_stale("file:///a.c", 2));
    }

    #[test]
    fn test_track_overwrites() {
        let mut tracker = VersionTracker::new();
        tracker.track("file:///a.c", 1);
        tracker.track("file:///a.c", 2);

        assert!(!tracker.is_stale("file:///a.c", 2));
        assert!(tracker.is_stale("file:///a.c", 1));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_cache_key_format() {
        assert_eq!(
            VersionTracker::cache_key("file:///a.c", 7),
            "file:///a.c_v7"
        );
        // Different versions never collide
        assert_ne!(
            VersionTracker::cache_key("file:///a.c", 1),
            VersionTracker::cache_key("file:///a.c", 2)
        );
    }

    #[test]
    fn test_clear_version() {
        let mut tracker = VersionTracker::new();
        tracker.track("file:///a.c", 1);
        tracker.track("file:///b.c", 1);

        tracker.clear_version("file:///a.c");

        // Cleared resource is unseen again, hence trusted
        assert!(!tracker.is_stale("file:///a.c", 99));
        assert!(tracker.is_stale("file:///b.c", 99));
    }

    #[test]
    fn test_clear_all() {
        let mut tracker = VersionTracker::new();
        tracker.track("file:///a.c", 1);
        tracker.track("file:///b.c", 2);

        tracker.clear_all();
        assert!(tracker.is_empty());
    }
}
