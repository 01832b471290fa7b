use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::models::{DocumentId, EditorDocument};
use crate::repo::DocHandle;

/// Disposer for a live change subscription.
///
/// Dropping it stops forwarding snapshots of the handle; the live counter is
/// decremented synchronously so callers can rely on it right away.
pub struct ChangeSubscription {
    document_id: DocumentId,
    task: JoinHandle<()>,
    live: Arc<AtomicUsize>,
}

impl ChangeSubscription {
    /// Forward a fresh snapshot to `on_change` after every change of `handle`.
    pub fn spawn<F>(handle: DocHandle, live: Arc<AtomicUsize>, on_change: F) -> Self
    where
        F: Fn(EditorDocument) + Send + 'static,
    {
        let mut changes = handle.subscribe();
        let document_id = handle.id().clone();
        live.fetch_add(1, Ordering::SeqCst);
        debug!("Subscribed to changes of {}", document_id);

        let task = tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(_) | Err(RecvError::Lagged(_)) => {
                        if let Some(doc) = handle.doc() {
                            on_change(doc);
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Self {
            document_id,
            task,
            live,
        }
    }
}

impl Drop for ChangeSubscription {
    fn drop(&mut self) {
        self.task.abort();
        self.live.fetch_sub(1, Ordering::SeqCst);
        debug!("Unsubscribed from changes of {}", self.document_id);
    }
}
