//! Expiry Sweep Task
//!
//! Lazy eviction only reclaims entries that are read again. This task
//! periodically runs `TtlCache::sweep_expired`, which also walks the durable
//! store, so entries written by an earlier process and never read are
//! reclaimed as well.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::cache::TtlCache;

/// Spawns a background task that sweeps expired cache entries every `period`.
///
/// The write lock is held only while sweeping. The task returns when a
/// message arrives on `shutdown` or its sender is dropped.
///
/// # Example
/// ```ignore
/// let (shutdown_tx, _) = broadcast::channel::<()>(1);
/// let handle = spawn_sweep_task(cache.clone(), Duration::from_secs(30), shutdown_tx.subscribe());
/// // Later, during shutdown:
/// drop(shutdown_tx);
/// handle.await?;
/// ```
pub fn spawn_sweep_task(
    cache: Arc<RwLock<TtlCache>>,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = interval(period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        tick.tick().await;

        info!("Expiry sweep running every {:?}", period);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let (removed, remaining) = {
                        let mut cache = cache.write().await;
                        let removed = cache.sweep_expired();
                        (removed, cache.len())
                    };

                    if removed > 0 {
                        info!("Expiry sweep removed {} entries, {} remain in memory", removed, remaining);
                    } else {
                        debug!("Expiry sweep found nothing to remove");
                    }
                }
                _ = shutdown.recv() => {
                    info!("Expiry sweep stopped");
                    return;
                }
            }
        }
    })
}
