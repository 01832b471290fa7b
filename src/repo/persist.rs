use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, warn};

use super::storage::StorageAdapter;
use crate::models::DocumentId;

enum PersistCommand {
    Save { id: DocumentId, snapshot: Vec<u8> },
    Flush(oneshot::Sender<()>),
}

/// Serialises snapshot writes so that a later snapshot is never overwritten
/// by an earlier one.
#[derive(Clone)]
pub struct PersistQueue {
    tx: mpsc::UnboundedSender<PersistCommand>,
}

impl PersistQueue {
    pub fn spawn(storage: Arc<dyn StorageAdapter>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    PersistCommand::Save { id, snapshot } => {
                        if let Err(e) = storage.save(&id, snapshot).await {
                            error!("Failed to persist document '{}': {}", id, e);
                        }
                    }
                    PersistCommand::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
        });
        (Self { tx }, worker)
    }

    /// Queue a snapshot write without waiting for it.
    pub fn save(&self, id: DocumentId, snapshot: Vec<u8>) {
        if self.tx.send(PersistCommand::Save { id, snapshot }).is_err() {
            warn!("Persistence worker stopped, dropping snapshot");
        }
    }

    /// Wait until every snapshot queued before this call has been written.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(PersistCommand::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}
