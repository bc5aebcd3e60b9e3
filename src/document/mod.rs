//! Version-Aware Document Layer
//!
//! Wraps the generic cache engine with resource-version keying and
//! host-event-driven invalidation.

mod cache;
mod version;

// Re-export public types
pub use cache::{DocumentCache, DocumentEvent, VersionedResource};
pub use version::VersionTracker;
