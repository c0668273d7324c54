//! Background purge of expired refresh records
//!
//! Expired records are already invisible to every store operation; the sweep
//! only bounds memory by physically removing them.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::store::RefreshStore;

/// Spawn a task that calls `purge_expired` every `interval`.
///
/// The first tick is skipped. Returns the task's `JoinHandle`; abort it to
/// stop sweeping.
pub fn spawn_sweep_task(
    store: Arc<dyn RefreshStore>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // Nothing can have expired yet at startup
        ticker.tick().await;

        loop {
            ticker.tick().await;
            sweep_cycle(store.as_ref()).await;
        }
    })
}

/// Run one purge pass and report what it removed.
pub(crate) async fn sweep_cycle(store: &dyn RefreshStore) -> usize {
    let purged = store.purge_expired().await;
    let remaining = store.len().await;
    if purged > 0 {
        info!(purged, remaining, "purged expired refresh records");
    } else {
        debug!(remaining, "sweep found no expired refresh records");
    }
    purged
}
