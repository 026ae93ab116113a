//! Expired Entry Purge Task
//!
//! Background task that periodically runs the store's explicit
//! purge-expired pass.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheService;

/// Spawns a background task that periodically removes expired entries.
///
/// The task sleeps for `interval_secs` between passes. Reads already drop
/// expired entries lazily; this only reclaims memory held by keys nobody
/// reads again.
///
/// # Returns
/// A JoinHandle for the spawned task, aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let purge_handle = spawn_purge_task(cache.clone(), 60);
/// // Later, during shutdown:
/// purge_handle.abort();
/// ```
pub fn spawn_purge_task(cache: CacheService, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(interval_secs, "starting expired-entry purge task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.purge_expired().await;
            if removed > 0 {
                info!(removed, "purge pass removed expired entries");
            } else {
                debug!("purge pass found no expired entries");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::cache::{CacheStore, ManualClock};

    fn service_with_clock() -> (CacheService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        let store = CacheStore::with_clock(100, 300, clock.clone());
        (CacheService::new(store), clock)
    }

    #[tokio::test]
    async fn test_purge_task_removes_expired_entries() {
        let (cache, clock) = service_with_clock();
        cache.set("expire_soon", "value", Some(1)).await;
        cache.set("long_lived", "value", Some(3600)).await;
        clock.advance_secs(2);

        let handle = spawn_purge_task(cache.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        // Inspect without going through `get`, which would expire lazily.
        assert_eq!(cache.len().await, 1);
        assert!(cache.contains("long_lived").await);
        assert_eq!(cache.stats().await.evictions, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_purge_task_can_be_aborted() {
        let (cache, _clock) = service_with_clock();

        let handle = spawn_purge_task(cache, 1);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
