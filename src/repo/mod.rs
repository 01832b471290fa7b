//! Replicated-document client.
//!
//! Merging is done by loro. This module only locates documents (cache,
//! storage, then peers), routes local changes to storage and peers, and
//! imports what peers send back.

pub mod handle;
pub mod lorodoc;
pub mod network;
pub mod persist;
pub mod storage;

use loro::LoroDoc;
use moka::sync::Cache;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub use crate::models::is_valid_document_id;
pub use handle::{ChangeOrigin, DocHandle, HandleState};
pub use network::{BroadcastNetwork, MessageBody, NetworkMessage, PeerId};
pub use storage::{FsStorage, MemoryStorage, StorageAdapter};

use crate::error::RepoError;
use crate::models::DocumentId;
use network::new_peer_id;
use persist::PersistQueue;

/// Entry point for creating and finding documents.
///
/// Constructed once by the composition root and shared by cloning.
#[derive(Clone)]
pub struct DocRepo {
    inner: Arc<RepoInner>,
}

struct RepoInner {
    origin: PeerId,
    handles: Cache<DocumentId, DocHandle>,
    storage: Arc<dyn StorageAdapter>,
    network: Option<BroadcastNetwork>,
    persist: PersistQueue,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl DocRepo {
    /// Build a repo. Must be called from within a tokio runtime.
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        network: Option<BroadcastNetwork>,
        cache_capacity: u64,
    ) -> Self {
        let handles = Cache::builder().max_capacity(cache_capacity).build();
        let (persist, persist_worker) = PersistQueue::spawn(storage.clone());
        let origin = new_peer_id();

        let mut tasks = vec![persist_worker];
        if let Some(network) = &network {
            tasks.push(spawn_responder(
                origin,
                network.clone(),
                handles.clone(),
                storage.clone(),
            ));
        }

        info!("Document repo initialized (peer {:x})", origin);
        Self {
            inner: Arc::new(RepoInner {
                origin,
                handles,
                storage,
                network,
                persist,
                tasks: Mutex::new(tasks),
            }),
        }
    }

    /// Create a new, empty document. The handle is ready immediately.
    pub fn create(&self) -> DocHandle {
        let id = DocumentId::generate();
        let handle = self.new_handle(id.clone(), LoroDoc::new(), HandleState::Ready);
        self.inner.handles.insert(id.clone(), handle.clone());
        info!("Created document {}", id);
        handle
    }

    /// Locate a document in the cache, in storage, or at a peer.
    ///
    /// A document only known to peers comes back in the requesting state;
    /// use [`DocHandle::when_ready`] to wait for it.
    pub async fn find(&self, id: &DocumentId) -> Result<DocHandle, RepoError> {
        if let Some(handle) = self.inner.handles.get(id) {
            debug!("Document {} served from cache", id);
            if !handle.is_ready() {
                handle.request_sync();
            }
            return Ok(handle);
        }

        let loro_doc = LoroDoc::new();
        let state = match self.inner.storage.load(id).await? {
            Some(snapshot) => {
                loro_doc
                    .import(&snapshot)
                    .map_err(|e| RepoError::Crdt(e.to_string()))?;
                info!("Loaded document {} from storage ({} bytes)", id, snapshot.len());
                HandleState::Ready
            }
            None if self.inner.network.is_some() => HandleState::Requesting,
            None => {
                info!("Document {} not found in storage and no network configured", id);
                return Err(RepoError::Unavailable(id.clone()));
            }
        };

        // Another find may have resolved the same id while storage was read.
        if let Some(handle) = self.inner.handles.get(id) {
            return Ok(handle);
        }

        let handle = self.new_handle(id.clone(), loro_doc, state);
        self.inner.handles.insert(id.clone(), handle.clone());
        if state == HandleState::Requesting {
            info!("Requesting document {} from peers", id);
            handle.request_sync();
        }
        Ok(handle)
    }

    /// Wait until every queued snapshot has reached storage.
    pub async fn flush(&self) {
        self.inner.persist.flush().await;
    }

    /// Flush pending writes and stop background tasks.
    pub async fn shutdown(&self) {
        self.flush().await;
        let tasks = std::mem::take(
            &mut *self
                .inner
                .tasks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );
        for task in tasks {
            task.abort();
        }
        info!("Document repo (peer {:x}) shut down", self.inner.origin);
    }

    fn new_handle(&self, id: DocumentId, loro_doc: LoroDoc, state: HandleState) -> DocHandle {
        DocHandle::new(
            id,
            loro_doc,
            state,
            self.inner.network.clone(),
            self.inner.persist.clone(),
        )
    }
}

/// Answer peers' sync requests from open handles or storage.
fn spawn_responder(
    origin: PeerId,
    network: BroadcastNetwork,
    handles: Cache<DocumentId, DocHandle>,
    storage: Arc<dyn StorageAdapter>,
) -> JoinHandle<()> {
    let mut network_rx = network.subscribe();
    tokio::spawn(async move {
        loop {
            let message = match network_rx.recv().await {
                Ok(message) => message,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Repo responder missed {} network messages", skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            if message.from == origin || !matches!(message.body, MessageBody::Request) {
                continue;
            }

            let id = message.document_id;
            let snapshot = match handles.get(&id).filter(DocHandle::is_ready) {
                Some(handle) => handle.export_snapshot().ok(),
                None => match storage.load(&id).await {
                    Ok(snapshot) => snapshot,
                    Err(e) => {
                        warn!("Failed to read document '{}' for a peer: {}", id, e);
                        None
                    }
                },
            };

            if let Some(snapshot) = snapshot {
                debug!("Answering sync request for {}", id);
                network.send(NetworkMessage {
                    from: origin,
                    document_id: id,
                    body: MessageBody::Sync(Arc::new(snapshot)),
                });
            }
        }
    })
}
