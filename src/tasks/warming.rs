//! Cache Warming Task
//!
//! Re-runs each registered warming job on its own interval.

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cache::{CacheAside, WarmingConfig};

/// Spawns one background task per warming job registered on `aside`.
///
/// Each task warms immediately, then again every `config.interval`. Jobs
/// registered after this call are not scheduled.
pub fn spawn_warming_tasks<V>(aside: &CacheAside<V>) -> Vec<JoinHandle<()>>
where
    V: Clone + Send + Sync + 'static,
{
    aside
        .warming_configs()
        .into_iter()
        .map(|config| spawn_warming_task(aside.clone(), config))
        .collect()
}

fn spawn_warming_task<V>(aside: CacheAside<V>, config: WarmingConfig<V>) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(
            instance = %aside.cache().name(),
            keys = config.keys.len(),
            "Starting cache warming task with interval of {:?}", config.interval
        );

        let mut ticker = tokio::time::interval(config.interval);
        loop {
            ticker.tick().await;
            let report = aside.warm(&config).await;
            if !report.failures.is_empty() {
                warn!(
                    instance = %aside.cache().name(),
                    failed = report.failures.len(),
                    "Cache warming pass had failures"
                );
            }
        }
    })
}
