//! Session controller: owns the single currently open document and
//! republishes its snapshots as UI state.

pub mod links;
pub mod subscription;

use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use url::Url;

pub use links::{extract_document_id, take_doc_param, ShareLinks, DOC_PARAM};
pub use subscription::ChangeSubscription;

use crate::error::{RepoError, SessionError};
use crate::models::{DocumentId, EditorDocument, SessionView};
use crate::registry::DocumentRegistry;
use crate::repo::{DocHandle, DocRepo};

/// Title used when a document is created without one.
pub const DEFAULT_TITLE: &str = "Untitled Document";

/// Outcome of opening a link that may carry a `doc` parameter.
#[derive(Debug)]
pub struct OpenedLink {
    /// The link with the `doc` parameter removed.
    pub location: Url,
    /// Result of loading the linked document, `None` when the link had none.
    pub loaded: Option<Result<(), SessionError>>,
}

pub struct SessionController {
    repo: DocRepo,
    registry: Arc<DocumentRegistry>,
    links: ShareLinks,
    load_timeout: Duration,
    shared: Arc<SessionShared>,
}

struct SessionShared {
    view: watch::Sender<SessionView>,
    state: Mutex<SessionState>,
    live_subscriptions: Arc<AtomicUsize>,
}

#[derive(Default)]
struct SessionState {
    // Taken by every create/load; only the holder of the latest ticket may
    // install a session.
    latest_ticket: u64,
    active: Option<ActiveSession>,
}

struct ActiveSession {
    ticket: u64,
    handle: DocHandle,
    _subscription: ChangeSubscription,
}

impl SessionShared {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn begin(&self) -> u64 {
        let mut state = self.lock();
        state.latest_ticket += 1;
        let ticket = state.latest_ticket;
        drop(state);

        self.view.send_modify(|view| {
            view.is_loading = true;
            view.error = None;
        });
        ticket
    }

    /// Record an input error. Any create/load still in flight is superseded,
    /// the open session is kept.
    fn reject(&self, error: String) {
        let mut state = self.lock();
        state.latest_ticket += 1;
        self.view.send_modify(|view| {
            view.is_loading = false;
            view.error = Some(error);
        });
    }

    fn finish_loading(&self, ticket: u64) {
        let state = self.lock();
        if state.latest_ticket == ticket {
            self.view.send_if_modified(|view| std::mem::replace(&mut view.is_loading, false));
        }
    }

    /// Publish a snapshot, unless it belongs to a session that was replaced.
    fn publish_if_current(&self, ticket: u64, doc: EditorDocument) {
        let state = self.lock();
        match &state.active {
            Some(active) if active.ticket == ticket => {
                self.view.send_modify(|view| view.doc = Some(doc));
            }
            _ => debug!("Dropping snapshot of a replaced session"),
        }
    }

    /// Tear down the active session and show `error`. Returns false when a
    /// newer create/load has taken over.
    fn clear(&self, ticket: u64, error: String) -> bool {
        let mut state = self.lock();
        if state.latest_ticket != ticket {
            return false;
        }
        state.active = None;
        self.view.send_replace(SessionView {
            error: Some(error),
            ..SessionView::default()
        });
        true
    }
}

/// Clears `isLoading` when a create/load ends, including when the load
/// future is dropped mid-way.
struct LoadingGuard {
    shared: Arc<SessionShared>,
    ticket: u64,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.shared.finish_loading(self.ticket);
    }
}

impl SessionController {
    pub fn new(
        repo: DocRepo,
        registry: Arc<DocumentRegistry>,
        links: ShareLinks,
        load_timeout: Duration,
    ) -> Self {
        let (view, _) = watch::channel(SessionView::default());
        Self {
            repo,
            registry,
            links,
            load_timeout,
            shared: Arc::new(SessionShared {
                view,
                state: Mutex::new(SessionState::default()),
                live_subscriptions: Arc::new(AtomicUsize::new(0)),
            }),
        }
    }

    /// Create a document, make it the active session and record it locally.
    pub fn create_new_document(&self, title: &str) -> Result<DocumentId, SessionError> {
        let title = match title.trim() {
            "" => DEFAULT_TITLE,
            _ => title,
        };
        let ticket = self.shared.begin();
        let _loading = LoadingGuard {
            shared: self.shared.clone(),
            ticket,
        };

        let handle = self.repo.create();
        let now = Utc::now();
        handle.change(|doc| {
            doc.title = title.to_string();
            doc.content = String::new();
            doc.created_at = now;
            doc.updated_at = now;
        })?;

        let id = handle.id().clone();
        self.install(ticket, handle);
        self.record(&id, title);
        info!("Created document {} '{}'", id, title);
        Ok(id)
    }

    /// Open an existing document by id.
    ///
    /// An invalid id only sets the error. A failed or timed out lookup sets the
    /// error and leaves no session open. A load overtaken by a newer
    /// create/load is discarded and reported as [`SessionError::Superseded`].
    pub async fn load_document(&self, raw_id: &str) -> Result<(), SessionError> {
        let Some(id) = DocumentId::parse(raw_id) else {
            let err = SessionError::InvalidDocumentId(raw_id.to_string());
            warn!("{}", err);
            self.shared.reject(err.to_string());
            return Err(err);
        };

        let ticket = self.shared.begin();
        let _loading = LoadingGuard {
            shared: self.shared.clone(),
            ticket,
        };
        info!("Loading document {}", id);

        let lookup = async {
            let handle = self.repo.find(&id).await?;
            handle.when_ready().await?;
            if handle.doc().is_none() {
                return Err(RepoError::Uninitialized(id.clone()));
            }
            Ok::<_, RepoError>(handle)
        };
        let resolved = match tokio::time::timeout(self.load_timeout, lookup).await {
            Ok(Ok(handle)) => Ok(handle),
            Ok(Err(e)) => Err(SessionError::from(e)),
            Err(_) => Err(SessionError::Timeout {
                id: id.clone(),
                after: self.load_timeout,
            }),
        };

        match resolved {
            Ok(handle) => {
                let title = handle.doc().map(|doc| doc.title);
                if !self.install(ticket, handle) {
                    debug!("Discarding load of {}, a newer session took over", id);
                    return Err(SessionError::Superseded(id));
                }
                if let Some(title) = title {
                    self.record(&id, &title);
                }
                info!("Document {} opened", id);
                Ok(())
            }
            Err(e) => {
                if !self.shared.clear(ticket, e.to_string()) {
                    debug!("Ignoring failed load of {}, a newer session took over", id);
                    return Err(SessionError::Superseded(id));
                }
                error!("Failed to load document {}: {}", id, e);
                Err(e)
            }
        }
    }

    /// Load from user input that is either an id or a shared link.
    pub async fn join(&self, input: &str) -> Result<(), SessionError> {
        let raw_id = extract_document_id(input).unwrap_or_default();
        self.load_document(&raw_id).await
    }

    /// Consume the `doc` parameter of `url`, loading the document it names.
    pub async fn open_from_link(&self, url: &Url) -> OpenedLink {
        let (doc, location) = take_doc_param(url);
        let loaded = match doc {
            Some(raw_id) => Some(self.load_document(&raw_id).await),
            None => None,
        };
        OpenedLink { location, loaded }
    }

    /// Replace the content of the open document.
    ///
    /// Returns `Ok(false)` without doing anything when no document is open.
    pub fn update_content(&self, content: &str) -> Result<bool, SessionError> {
        let Some((ticket, handle)) = self.active() else {
            return Ok(false);
        };
        handle.change(|doc| {
            doc.content = content.to_string();
            doc.updated_at = Utc::now();
        })?;
        if let Some(doc) = handle.doc() {
            self.shared.publish_if_current(ticket, doc);
        }
        Ok(true)
    }

    /// Rename the open document and its registry entry.
    ///
    /// Returns `Ok(false)` without doing anything when no document is open.
    pub fn update_title(&self, title: &str) -> Result<bool, SessionError> {
        let Some((ticket, handle)) = self.active() else {
            return Ok(false);
        };
        handle.change(|doc| {
            doc.title = title.to_string();
            doc.updated_at = Utc::now();
        })?;
        self.record(handle.id(), title);
        if let Some(doc) = handle.doc() {
            self.shared.publish_if_current(ticket, doc);
        }
        Ok(true)
    }

    pub fn get_shareable_id(&self) -> Option<DocumentId> {
        self.shared.view.borrow().document_id.clone()
    }

    /// Link to the open document, empty when none is open.
    pub fn get_shareable_url(&self) -> String {
        self.get_shareable_id()
            .map(|id| self.links.url_for(&id))
            .unwrap_or_default()
    }

    pub fn view(&self) -> SessionView {
        self.shared.view.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<SessionView> {
        self.shared.view.subscribe()
    }

    pub fn registry(&self) -> &Arc<DocumentRegistry> {
        &self.registry
    }

    /// Handle of the open document.
    pub fn active_handle(&self) -> Option<DocHandle> {
        self.active().map(|(_, handle)| handle)
    }

    /// Number of change subscriptions currently alive; never more than one.
    pub fn live_subscriptions(&self) -> usize {
        self.shared.live_subscriptions.load(Ordering::SeqCst)
    }

    /// Close the open document and supersede any load still in flight.
    pub fn close(&self) {
        let mut state = self.shared.lock();
        state.latest_ticket += 1;
        if let Some(active) = state.active.take() {
            info!("Closing document {}", active.handle.id());
        }
        self.shared.view.send_replace(SessionView::default());
    }

    fn active(&self) -> Option<(u64, DocHandle)> {
        let state = self.shared.lock();
        state
            .active
            .as_ref()
            .map(|active| (active.ticket, active.handle.clone()))
    }

    /// Replace the active session with `handle`. Returns false when `ticket`
    /// is no longer the latest.
    fn install(&self, ticket: u64, handle: DocHandle) -> bool {
        let mut state = self.shared.lock();
        if state.latest_ticket != ticket {
            return false;
        }

        // The previous subscription must be gone before the next one exists.
        state.active = None;

        let shared = self.shared.clone();
        let subscription = ChangeSubscription::spawn(
            handle.clone(),
            self.shared.live_subscriptions.clone(),
            move |doc| shared.publish_if_current(ticket, doc),
        );

        let document_id = handle.id().clone();
        let doc = handle.doc();
        state.active = Some(ActiveSession {
            ticket,
            handle,
            _subscription: subscription,
        });
        self.shared.view.send_replace(SessionView {
            document_id: Some(document_id),
            doc,
            is_loading: false,
            error: None,
        });
        true
    }

    fn record(&self, id: &DocumentId, title: &str) {
        if let Err(e) = self.registry.upsert(id, title) {
            error!("Failed to record document {} in the registry: {}", id, e);
        }
    }
}
