use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::trace;

use crate::models::DocumentId;

/// Identifies the sender of a network message (a handle or a repo responder).
pub type PeerId = u64;

pub fn new_peer_id() -> PeerId {
    uuid::Uuid::new_v4().as_u64_pair().0
}

#[derive(Debug, Clone)]
pub enum MessageBody {
    /// Ask peers for the full state of a document.
    Request,
    /// A loro update or snapshot for a document.
    Sync(Arc<Vec<u8>>),
}

#[derive(Debug, Clone)]
pub struct NetworkMessage {
    pub from: PeerId,
    pub document_id: DocumentId,
    pub body: MessageBody,
}

/// In-process broadcast bus connecting repos that share it, the way browser
/// tabs share a broadcast channel.
#[derive(Clone)]
pub struct BroadcastNetwork {
    tx: broadcast::Sender<NetworkMessage>,
}

impl BroadcastNetwork {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Best effort; a message with no listeners is dropped.
    pub fn send(&self, message: NetworkMessage) {
        trace!("Broadcasting {} for {}", message.body_kind(), message.document_id);
        let _ = self.tx.send(message);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NetworkMessage> {
        self.tx.subscribe()
    }
}

impl NetworkMessage {
    fn body_kind(&self) -> &'static str {
        match self.body {
            MessageBody::Request => "request",
            MessageBody::Sync(_) => "sync",
        }
    }
}
