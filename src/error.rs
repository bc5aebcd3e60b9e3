//! Error types for the caching subsystem
//!
//! Provides unified error handling using thiserror.
//!
//! Cache operations themselves never fail: lookups return `Option`, removals
//! return `bool`, and inserts degrade gracefully under eviction pressure.
//! `CacheError` only covers the fallible collaborator boundary, the external
//! parser.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the caching subsystem.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The external parser collaborator failed to produce a result
    #[error("Parse failed: {0}")]
    Parse(String),
}

// == Result Type Alias ==
/// Convenience Result type for the caching subsystem.
pub type Result<T> = std::result::Result<T, CacheError>;
