//! Durable Purge Task
//!
//! Background task that periodically removes expired durable cache records.
//! The durable cache itself only expires records when they are read; hosts
//! that want stale records reclaimed spawn this task.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::DurableCache;
use crate::storage::Storage;

/// Spawns a background task that periodically purges a durable cache.
///
/// # Arguments
/// * `cache` - Shared reference to the cache
/// * `purge_interval_secs` - Interval in seconds between purge runs, at least 1
///
/// # Returns
/// A JoinHandle for the spawned task, which the host aborts on shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(DurableCache::<Course>::new(storage, "courses_"));
/// let purge_handle = spawn_purge_task(cache.clone(), 60);
/// // Later, during shutdown:
/// purge_handle.abort();
/// ```
pub fn spawn_purge_task<V, S>(
    cache: Arc<DurableCache<V, S>>,
    purge_interval_secs: u64,
) -> JoinHandle<()>
where
    V: 'static,
    S: Storage + 'static,
{
    let purge_interval_secs = purge_interval_secs.max(1);
    let interval = Duration::from_secs(purge_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting durable purge task for prefix {:?} with interval of {} seconds",
            cache.prefix(),
            purge_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.purge_expired();
            if removed == 0 {
                debug!("Durable purge: no stale records found");
            }
        }
    })
}
