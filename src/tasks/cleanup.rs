//! TTL Cleanup Task
//!
//! Background task that periodically removes expired entries from every
//! managed cache instance.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheInstance;

/// Spawns a background task that periodically cleans up expired cache entries.
///
/// Every `interval` it sweeps each instance in turn and logs how many
/// entries were removed. Instances hold their lock per removed key only, so
/// a sweep never stalls request traffic for the whole scan.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let registry = CacheRegistry::from_config(&config)?;
/// let cleanup_handle = spawn_cleanup_task(registry.instances(), Duration::from_secs(300));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(
    instances: Vec<Arc<dyn CacheInstance>>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            instances = instances.len(),
            "Starting TTL cleanup task with interval of {:?}", interval
        );

        loop {
            tokio::time::sleep(interval).await;
            run_cleanup(&instances).await;
        }
    })
}

/// One sweep over every instance. Returns the total number of entries removed.
pub async fn run_cleanup(instances: &[Arc<dyn CacheInstance>]) -> usize {
    let mut total = 0;

    for instance in instances {
        let removed = instance.cleanup_expired().await;
        if removed > 0 {
            info!(instance = %instance.name(), removed, "TTL cleanup: removed expired entries");
        } else {
            debug!(instance = %instance.name(), "TTL cleanup: no expired entries found");
        }
        total += removed;
    }

    total
}
