#![allow(dead_code)]

use futures_util::future::BoxFuture;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hedwig::error::StorageError;
use hedwig::models::{DocumentId, SessionView};
use hedwig::registry::{DocumentRegistry, MemoryStore};
use hedwig::repo::{BroadcastNetwork, DocRepo, MemoryStorage, StorageAdapter};
use hedwig::session::{SessionController, ShareLinks};

pub const PUBLIC_URL: &str = "http://localhost:3000/";

pub struct Peer {
    pub repo: DocRepo,
    pub session: Arc<SessionController>,
}

pub fn peer_with_storage(
    storage: Arc<dyn StorageAdapter>,
    network: Option<BroadcastNetwork>,
    load_timeout: Duration,
) -> Peer {
    let repo = DocRepo::new(storage, network, 100);
    let registry = Arc::new(DocumentRegistry::new(Arc::new(MemoryStore::new())));
    let session = Arc::new(SessionController::new(
        repo.clone(),
        registry,
        ShareLinks::new(PUBLIC_URL).unwrap(),
        load_timeout,
    ));
    Peer { repo, session }
}

pub fn peer(network: Option<BroadcastNetwork>, load_timeout: Duration) -> Peer {
    peer_with_storage(Arc::new(MemoryStorage::new()), network, load_timeout)
}

/// Wait (bounded) until the published view satisfies `predicate`.
pub async fn wait_for_view<F>(session: &SessionController, predicate: F) -> SessionView
where
    F: Fn(&SessionView) -> bool,
{
    let mut view_rx = session.watch();
    let view = tokio::time::timeout(Duration::from_secs(5), view_rx.wait_for(|view| predicate(view)))
        .await
        .expect("view did not reach the expected state in time")
        .expect("session controller dropped")
        .clone();
    view
}

/// Memory storage that delays loads of one chosen document.
pub struct SlowStorage {
    inner: MemoryStorage,
    slow: Mutex<Option<(DocumentId, Duration)>>,
}

impl SlowStorage {
    pub fn new() -> Self {
        Self {
            inner: MemoryStorage::new(),
            slow: Mutex::new(None),
        }
    }

    pub fn slow_down(&self, id: &DocumentId, delay: Duration) {
        *self.slow.lock().unwrap() = Some((id.clone(), delay));
    }
}

impl StorageAdapter for SlowStorage {
    fn load<'a>(&'a self, id: &'a DocumentId) -> BoxFuture<'a, Result<Option<Vec<u8>>, StorageError>> {
        let delay = self
            .slow
            .lock()
            .unwrap()
            .as_ref()
            .filter(|(slow_id, _)| slow_id == id)
            .map(|(_, delay)| *delay);
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.inner.load(id).await
        })
    }

    fn save<'a>(&'a self, id: &'a DocumentId, snapshot: Vec<u8>) -> BoxFuture<'a, Result<(), StorageError>> {
        self.inner.save(id, snapshot)
    }
}
