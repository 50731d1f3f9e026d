//! Async Write Task
//!
//! Fire-and-forget delivery of a cache write batch. The caller gets no
//! completion signal and no error; failures are logged and dropped here.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::execute;
use crate::store::{Backend, Command};

/// Submits `commands` on a background task.
///
/// The handle is returned for tests and shutdown hooks; the cache itself
/// discards it.
pub fn spawn_write(backend: Arc<dyn Backend>, commands: Vec<Command>) -> JoinHandle<()> {
    tokio::spawn(async move {
        match execute(backend.as_ref(), &commands).await {
            Ok(()) => debug!(
                backend = backend.name(),
                commands = commands.len(),
                "async cache write delivered"
            ),
            Err(e) => warn!(
                backend = backend.name(),
                error = %e,
                "async cache write dropped"
            ),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;

    #[tokio::test]
    async fn test_spawn_write_applies_batch() {
        let backend = MemoryBackend::new();
        let handle = spawn_write(
            Arc::new(backend.clone()),
            vec![Command::Set {
                key: "k".to_string(),
                value: b"v".to_vec(),
                ttl_ms: 10_000,
            }],
        );

        handle.await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn test_spawn_write_swallows_failures() {
        let backend = MemoryBackend::new();
        backend.store().write().await.set("idx", b"plain".to_vec(), None);

        let handle = spawn_write(
            Arc::new(backend.clone()),
            vec![Command::SortedUpsert {
                index: "idx".to_string(),
                member: "m".to_string(),
                score: 1.0,
            }],
        );

        // the task completes normally even though the command failed
        assert!(handle.await.is_ok());
        assert_eq!(backend.get("idx").await.unwrap(), Some(b"plain".to_vec()));
    }
}
