use std::time::Duration;

use crate::models::DocumentId;

/// Failures of a storage adapter.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the replicated-document client.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("Document {0} is unavailable")]
    Unavailable(DocumentId),

    #[error("Document {0} holds no editor document")]
    Uninitialized(DocumentId),

    #[error("Document {0} is not ready")]
    NotReady(DocumentId),

    #[error("CRDT error: {0}")]
    Crdt(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failures writing the local document registry.
///
/// Read failures never surface; a corrupt slot reads as an empty list.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Registry IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Registry encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures reported by the session controller. The `Display` text is what
/// the UI shows.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid document id '{0}'")]
    InvalidDocumentId(String),

    #[error("Timed out loading document {id} after {} ms", .after.as_millis())]
    Timeout { id: DocumentId, after: Duration },

    #[error("Loading document {0} was superseded by a newer session")]
    Superseded(DocumentId),

    #[error("No document is open")]
    NoActiveSession,

    #[error(transparent)]
    Repo(#[from] RepoError),
}
