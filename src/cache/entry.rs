//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with access metadata.

use std::time::{SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// A single cache entry, exclusively owned by its store.
///
/// `get` hands out clones of `value`, never references into the entry, so the
/// store's memory accounting cannot be corrupted from outside.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The key this entry is stored under
    pub key: String,
    /// The cached value
    pub value: T,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Last access timestamp (Unix milliseconds)
    pub last_accessed: u64,
    /// Number of times this entry was read
    pub access_count: u64,
    /// Estimated size in bytes
    pub size: usize,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new entry with `created_at == last_accessed == now`.
    pub fn new(key: String, value: T, size: usize) -> Self {
        let now = now_millis();
        Self {
            key,
            value,
            created_at: now,
            last_accessed: now,
            access_count: 0,
            size,
        }
    }

    // == Idle Time ==
    /// Milliseconds since this entry was last accessed.
    pub fn idle_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_accessed)
    }

    // == Age ==
    /// Milliseconds since this entry was created.
    pub fn age_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.created_at)
    }

    // == Touch ==
    /// Marks the entry as accessed now.
    pub fn touch(&mut self) {
        self.last_accessed = now_millis();
        self.access_count += 1;
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
