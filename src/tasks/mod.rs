//! Background Tasks Module
//!
//! Periodic maintenance tasks for cache instances.

mod cleanup;

pub use cleanup::spawn_cleanup_task;
