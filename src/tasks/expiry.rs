//! Store Expiry Task
//!
//! Background task that periodically drops expired keys from the in-memory
//! store, the way Redis actively expires keys on its own. It removes whole
//! keys only; expired members inside a live index are left to the cache's
//! lazy sweep.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::MemoryStore;

/// Spawns a background task that purges expired keys every
/// `interval_secs` seconds.
///
/// Returns the JoinHandle so the task can be aborted on shutdown.
///
/// # Example
/// ```ignore
/// let backend = MemoryBackend::new();
/// let handle = spawn_expiry_task(backend.store(), 1);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_expiry_task(store: Arc<RwLock<MemoryStore>>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs(), "store expiry task started");

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut store = store.write().await;
                store.purge_expired()
            };

            if removed > 0 {
                info!(removed, "store expiry purged keys");
            } else {
                debug!(removed, "store expiry found nothing to purge");
            }
        }
    })
}
