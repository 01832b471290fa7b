use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;

use crate::error::StorageError;
use crate::models::DocumentId;

/// Persistence backend for document snapshots.
pub trait StorageAdapter: Send + Sync {
    /// Load the latest snapshot of a document, `None` when nothing is stored.
    fn load<'a>(&'a self, id: &'a DocumentId) -> BoxFuture<'a, Result<Option<Vec<u8>>, StorageError>>;

    /// Replace the stored snapshot of a document.
    fn save<'a>(&'a self, id: &'a DocumentId, snapshot: Vec<u8>) -> BoxFuture<'a, Result<(), StorageError>>;
}

/// Stores one `<id>.loro` snapshot file per document.
pub struct FsStorage {
    dir: PathBuf,
}

impl FsStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: &DocumentId) -> PathBuf {
        self.dir.join(format!("{}.loro", id))
    }
}

impl StorageAdapter for FsStorage {
    fn load<'a>(&'a self, id: &'a DocumentId) -> BoxFuture<'a, Result<Option<Vec<u8>>, StorageError>> {
        async move {
            match tokio::fs::read(self.path_for(id)).await {
                Ok(bytes) => Ok(Some(bytes)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            }
        }
        .boxed()
    }

    fn save<'a>(&'a self, id: &'a DocumentId, snapshot: Vec<u8>) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            tokio::fs::create_dir_all(&self.dir).await?;
            let path = self.path_for(id);
            let tmp = path.with_extension("loro.tmp");
            tokio::fs::write(&tmp, &snapshot).await?;
            tokio::fs::rename(&tmp, &path).await?;
            debug!("Saved snapshot of {} ({} bytes)", id, snapshot.len());
            Ok(())
        }
        .boxed()
    }
}

/// Volatile storage, used by tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStorage {
    snapshots: Mutex<HashMap<DocumentId, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshots(&self) -> std::sync::MutexGuard<'_, HashMap<DocumentId, Vec<u8>>> {
        self.snapshots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.snapshots().contains_key(id)
    }
}

impl StorageAdapter for MemoryStorage {
    fn load<'a>(&'a self, id: &'a DocumentId) -> BoxFuture<'a, Result<Option<Vec<u8>>, StorageError>> {
        let snapshot = self.snapshots().get(id).cloned();
        async move { Ok(snapshot) }.boxed()
    }

    fn save<'a>(&'a self, id: &'a DocumentId, snapshot: Vec<u8>) -> BoxFuture<'a, Result<(), StorageError>> {
        self.snapshots().insert(id.clone(), snapshot);
        async move { Ok(()) }.boxed()
    }
}
