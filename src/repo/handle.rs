use loro::{ExportMode, LoroDoc};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::lorodoc::{document_map, editor_doc_to_loro_map, loro_doc_to_editor_doc};
use super::network::{new_peer_id, BroadcastNetwork, MessageBody, NetworkMessage, PeerId};
use super::persist::PersistQueue;
use crate::error::RepoError;
use crate::models::{DocumentId, EditorDocument};

/// Buffered change notifications per handle before slow subscribers lag.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// Waiting for a peer to answer a sync request.
    Requesting,
    Ready,
}

/// Where a change notification came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    Local,
    Remote,
}

/// Live token for one replicated document.
///
/// Cheap to clone; all clones share the same loro document.
#[derive(Clone)]
pub struct DocHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    id: DocumentId,
    // Per handle, so that two handles of one document still hear each other.
    origin: PeerId,
    loro_doc: LoroDoc,
    // Held across read-modify-write of the document map and remote imports.
    txn: Mutex<()>,
    state: watch::Sender<HandleState>,
    changes: broadcast::Sender<ChangeOrigin>,
    network: Option<BroadcastNetwork>,
    persist: PersistQueue,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for HandleInner {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.listener).take() {
            task.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl DocHandle {
    pub(crate) fn new(
        id: DocumentId,
        loro_doc: LoroDoc,
        state: HandleState,
        network: Option<BroadcastNetwork>,
        persist: PersistQueue,
    ) -> Self {
        let (state, _) = watch::channel(state);
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let handle = Self {
            inner: Arc::new(HandleInner {
                id,
                origin: new_peer_id(),
                loro_doc,
                txn: Mutex::new(()),
                state,
                changes,
                network,
                persist,
                listener: Mutex::new(None),
            }),
        };
        handle.spawn_listener();
        handle
    }

    pub fn id(&self) -> &DocumentId {
        &self.inner.id
    }

    pub fn state(&self) -> HandleState {
        *self.inner.state.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == HandleState::Ready
    }

    /// Synchronous snapshot of the current document.
    pub fn doc(&self) -> Option<EditorDocument> {
        loro_doc_to_editor_doc(&self.inner.loro_doc)
    }

    /// Apply `mutator` as one atomic change.
    ///
    /// The change is broadcast to peers and queued for persistence; neither
    /// blocks the caller.
    pub fn change<F>(&self, mutator: F) -> Result<(), RepoError>
    where
        F: FnOnce(&mut EditorDocument),
    {
        if !self.is_ready() {
            return Err(RepoError::NotReady(self.id().clone()));
        }

        let update = {
            let _txn = lock(&self.inner.txn);
            let loro_doc = &self.inner.loro_doc;
            let prev = loro_doc_to_editor_doc(loro_doc);
            let mut next = prev.clone().unwrap_or_default();
            mutator(&mut next);

            let before = loro_doc.oplog_vv();
            editor_doc_to_loro_map(&document_map(loro_doc), prev.as_ref(), &next)
                .map_err(|e| RepoError::Crdt(e.to_string()))?;
            loro_doc.commit();
            if loro_doc.oplog_vv() == before {
                return Ok(());
            }

            loro_doc
                .export(ExportMode::updates(&before))
                .map_err(|e| RepoError::Crdt(e.to_string()))?
        };

        if let Some(network) = &self.inner.network {
            network.send(NetworkMessage {
                from: self.inner.origin,
                document_id: self.id().clone(),
                body: MessageBody::Sync(Arc::new(update)),
            });
        }
        self.persist_snapshot();
        let _ = self.inner.changes.send(ChangeOrigin::Local);
        Ok(())
    }

    /// Wait until the handle has left the requesting state.
    pub async fn when_ready(&self) -> Result<(), RepoError> {
        let mut state_rx = self.inner.state.subscribe();
        state_rx
            .wait_for(|state| *state == HandleState::Ready)
            .await
            .map(|_| ())
            .map_err(|_| RepoError::Unavailable(self.id().clone()))
    }

    /// Register for change notifications. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeOrigin> {
        self.inner.changes.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.changes.receiver_count()
    }

    pub(crate) fn export_snapshot(&self) -> Result<Vec<u8>, RepoError> {
        self.inner
            .loro_doc
            .export(ExportMode::Snapshot)
            .map_err(|e| RepoError::Crdt(e.to_string()))
    }

    /// Ask peers for the full state of this document.
    pub(crate) fn request_sync(&self) {
        if let Some(network) = &self.inner.network {
            network.send(NetworkMessage {
                from: self.inner.origin,
                document_id: self.id().clone(),
                body: MessageBody::Request,
            });
        }
    }

    fn apply_remote(&self, bytes: &[u8]) {
        let (imported, pending, doc) = {
            let _txn = lock(&self.inner.txn);
            let loro_doc = &self.inner.loro_doc;
            let before = loro_doc.oplog_vv();
            let status = match loro_doc.import(bytes) {
                Ok(status) => status,
                Err(e) => {
                    warn!("Failed to import update for document '{}': {}", self.id(), e);
                    return;
                }
            };
            (
                loro_doc.oplog_vv() != before,
                status.pending.is_some(),
                loro_doc_to_editor_doc(loro_doc),
            )
        };

        // Updates whose history is missing stay pending inside loro until a
        // full state arrives.
        if pending || (doc.is_none() && !self.is_ready()) {
            debug!("Document '{}' is missing history, resyncing", self.id());
            self.request_sync();
        }
        if !imported {
            return;
        }

        if doc.is_some() && !pending {
            let became_ready = self.inner.state.send_if_modified(|state| {
                if *state == HandleState::Requesting {
                    *state = HandleState::Ready;
                    true
                } else {
                    false
                }
            });
            if became_ready {
                debug!("Document '{}' received from a peer", self.id());
            }
        }
        if !self.is_ready() {
            return;
        }

        self.persist_snapshot();
        let _ = self.inner.changes.send(ChangeOrigin::Remote);
    }

    fn persist_snapshot(&self) {
        match self.export_snapshot() {
            Ok(snapshot) => self.inner.persist.save(self.id().clone(), snapshot),
            Err(e) => error!("Failed to export snapshot of document '{}': {}", self.id(), e),
        }
    }

    fn spawn_listener(&self) {
        let Some(network) = &self.inner.network else {
            return;
        };
        let mut network_rx = network.subscribe();
        let weak: Weak<HandleInner> = Arc::downgrade(&self.inner);

        let task = tokio::spawn(async move {
            loop {
                let received = network_rx.recv().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let handle = DocHandle { inner };

                match received {
                    Ok(message) => {
                        if message.document_id != handle.inner.id || message.from == handle.inner.origin {
                            continue;
                        }
                        if let MessageBody::Sync(bytes) = message.body {
                            handle.apply_remote(&bytes);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Document '{}' missed {} network messages, resyncing", handle.id(), skipped);
                        handle.request_sync();
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        *lock(&self.inner.listener) = Some(task);
    }
}
