//! Stats Reporter Task
//!
//! Background task that periodically logs master cache statistics.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::MasterCacheSet;

/// Spawns a background task that logs the master caches' counters.
///
/// The task sleeps for `interval_secs` between reports and stops on its own
/// once the master cache set is closed.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let master = Arc::new(MasterCacheSet::new(&CacheConfig::default()));
/// let stats_handle = spawn_stats_task(master.clone(), 60);
/// // Later, during shutdown:
/// stats_handle.abort();
/// ```
pub fn spawn_stats_task(master: Arc<MasterCacheSet>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting cache stats reporter with interval of {} seconds",
            interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            if master.is_closed() {
                debug!("Master cache set closed, stopping stats reporter");
                break;
            }
            master.log_stats();
        }
    })
}
