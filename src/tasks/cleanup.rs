//! Periodic Cleanup Task
//!
//! Background task that runs a cache sweep at a fixed interval.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Spawns a background task that periodically runs the given sweep.
///
/// The task loops forever, sleeping for the interval between sweeps. The
/// sweep closure returns the number of entries it removed, which drives the
/// log level. The caller owns the returned handle and aborts it on shutdown;
/// aborting a task that never ticked is safe.
///
/// # Example
/// ```ignore
/// let cache = manager.clone();
/// let handle = spawn_cleanup_task(move || cache.cleanup(), Duration::from_secs(60));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_cleanup_task<F>(mut sweep: F, interval: Duration) -> JoinHandle<()>
where
    F: FnMut() -> usize + Send + 'static,
{
    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "starting cache cleanup task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = sweep();
            if removed > 0 {
                info!(removed, "cache cleanup removed entries");
            } else {
                debug!("cache cleanup found nothing to remove");
            }
        }
    })
}
