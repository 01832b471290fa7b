mod common;

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use common::{peer, peer_with_storage, SlowStorage, PUBLIC_URL};
use hedwig::error::{RepoError, SessionError};
use hedwig::models::{DocumentId, SessionView};
use hedwig::repo::BroadcastNetwork;
use hedwig::session::{take_doc_param, DEFAULT_TITLE};
use url::Url;

const TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn create_opens_empty_document_with_title() {
    let peer = peer(None, TIMEOUT);
    let id = peer.session.create_new_document("Notes").unwrap();

    let view = peer.session.view();
    assert_eq!(view.document_id, Some(id.clone()));
    assert!(!view.is_loading);
    assert_eq!(view.error, None);

    let doc = view.doc.unwrap();
    assert_eq!(doc.title, "Notes");
    assert_eq!(doc.content, "");
    assert_eq!(doc.created_at, doc.updated_at);

    let entries = peer.session.registry().list();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, id);
    assert_eq!(entries[0].title, "Notes");
    assert_eq!(peer.session.live_subscriptions(), 1);
}

#[tokio::test]
async fn blank_title_falls_back_to_default() {
    let peer = peer(None, TIMEOUT);
    peer.session.create_new_document("   ").unwrap();

    assert_eq!(peer.session.view().doc.unwrap().title, DEFAULT_TITLE);
}

#[tokio::test]
async fn invalid_id_sets_error_and_keeps_session() {
    let peer = peer(None, TIMEOUT);
    let id = peer.session.create_new_document("Keep me").unwrap();

    let err = peer.session.load_document("").await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidDocumentId(_)));

    let view = peer.session.view();
    assert_eq!(view.document_id, Some(id));
    assert_eq!(view.doc.unwrap().title, "Keep me");
    assert!(view.error.unwrap().starts_with("Invalid document id"));
    assert_eq!(peer.session.live_subscriptions(), 1);
}

#[tokio::test]
async fn invalid_id_on_fresh_controller_opens_nothing() {
    let peer = peer(None, TIMEOUT);

    assert!(peer.session.load_document("not a document").await.is_err());
    let view = peer.session.view();
    assert_eq!(view.document_id, None);
    assert_eq!(view.doc, None);
    assert!(view.error.is_some());
    assert_eq!(peer.session.live_subscriptions(), 0);
}

#[tokio::test]
async fn edits_without_session_are_noops() {
    let peer = peer(None, TIMEOUT);

    assert!(!peer.session.update_content("<p>lost</p>").unwrap());
    assert!(!peer.session.update_title("Lost").unwrap());
    assert!(peer.session.registry().list().is_empty());
    assert_eq!(peer.session.get_shareable_url(), "");
    assert_eq!(peer.session.get_shareable_id(), None);
}

#[tokio::test]
async fn update_title_renames_registry_entry() {
    let peer = peer(None, TIMEOUT);
    let id = peer.session.create_new_document("Draft").unwrap();
    let before = Utc::now().timestamp_millis();

    assert!(peer.session.update_title("Foo").unwrap());

    let entries = peer.session.registry().list();
    let entry = entries.iter().find(|entry| entry.id == id).unwrap();
    assert_eq!(entry.title, "Foo");
    assert!(entry.updated_at.timestamp_millis() >= before);
    assert_eq!(peer.session.view().doc.unwrap().title, "Foo");
}

#[tokio::test]
async fn update_content_publishes_snapshot() {
    let peer = peer(None, TIMEOUT);
    peer.session.create_new_document("Notes").unwrap();
    let created = peer.session.view().doc.unwrap();

    assert!(peer.session.update_content("<p><b>bold</b></p>").unwrap());

    let doc = peer.session.view().doc.unwrap();
    assert_eq!(doc.content, "<p><b>bold</b></p>");
    assert_eq!(doc.created_at, created.created_at);
    assert!(doc.updated_at >= created.updated_at);
}

#[tokio::test]
async fn switching_sessions_ignores_replaced_handle() {
    let peer = peer(None, TIMEOUT);
    let a = peer.session.create_new_document("A").unwrap();
    let b = peer.session.create_new_document("B").unwrap();

    peer.session.load_document(a.as_str()).await.unwrap();
    peer.session.load_document(b.as_str()).await.unwrap();
    assert_eq!(peer.session.live_subscriptions(), 1);

    let stale = peer.repo.find(&a).await.unwrap();
    stale.change(|doc| doc.title = "A changed".to_string()).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let view = peer.session.view();
    assert_eq!(view.document_id, Some(b));
    assert_eq!(view.doc.unwrap().title, "B");
}

#[tokio::test]
async fn changes_through_other_handle_clones_are_published() {
    let peer = peer(None, TIMEOUT);
    let id = peer.session.create_new_document("Live").unwrap();

    let other = peer.repo.find(&id).await.unwrap();
    other.change(|doc| doc.content = "<p>typed elsewhere</p>".to_string()).unwrap();

    let view = common::wait_for_view(&peer.session, |view| {
        view.doc.as_ref().map(|doc| doc.content.as_str()) == Some("<p>typed elsewhere</p>")
    })
    .await;
    assert_eq!(view.document_id, Some(id));
}

#[tokio::test]
async fn shareable_url_round_trips_through_load() {
    let peer = peer(None, TIMEOUT);
    let id = peer.session.create_new_document("Shared").unwrap();

    let url = peer.session.get_shareable_url();
    assert_eq!(url, format!("{}?doc={}", PUBLIC_URL, id));

    let (doc, _) = take_doc_param(&Url::parse(&url).unwrap());
    peer.session.close();
    assert_eq!(peer.session.live_subscriptions(), 0);

    peer.session.load_document(&doc.unwrap()).await.unwrap();
    assert_eq!(peer.session.view().document_id, Some(id));
}

#[tokio::test]
async fn join_accepts_shared_link() {
    let peer = peer(None, TIMEOUT);
    let id = peer.session.create_new_document("Linked").unwrap();
    let link = peer.session.get_shareable_url();
    peer.session.close();

    peer.session.join(&format!("  {}  ", link)).await.unwrap();
    assert_eq!(peer.session.view().document_id, Some(id));

    let err = peer.session.join("").await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidDocumentId(_)));
}

#[tokio::test]
async fn open_from_link_consumes_doc_parameter() {
    let peer = peer(None, TIMEOUT);
    let id = peer.session.create_new_document("Opened").unwrap();
    peer.session.close();

    let url = Url::parse(&format!("{}?tab=notes&doc={}", PUBLIC_URL, id)).unwrap();
    let opened = peer.session.open_from_link(&url).await;

    assert_eq!(opened.location.as_str(), format!("{}?tab=notes", PUBLIC_URL));
    assert!(matches!(opened.loaded, Some(Ok(()))));
    assert_eq!(peer.session.view().document_id, Some(id));

    let plain = peer.session.open_from_link(&Url::parse(PUBLIC_URL).unwrap()).await;
    assert!(plain.loaded.is_none());
}

#[tokio::test]
async fn unknown_id_without_peers_is_unavailable() {
    let peer = peer(None, TIMEOUT);
    peer.session.create_new_document("Previous").unwrap();

    let err = peer
        .session
        .load_document(DocumentId::generate().as_str())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Repo(RepoError::Unavailable(_))));

    let view = peer.session.view();
    assert_eq!(view.document_id, None);
    assert_eq!(view.doc, None);
    assert!(!view.is_loading);
    assert!(view.error.unwrap().contains("unavailable"));
    assert_eq!(peer.session.live_subscriptions(), 0);
}

#[tokio::test]
async fn unknown_id_with_silent_peers_times_out() {
    let network = BroadcastNetwork::new(16);
    let peer = peer(Some(network), Duration::from_millis(100));
    peer.session.create_new_document("Previous").unwrap();

    let err = peer
        .session
        .load_document(DocumentId::generate().as_str())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Timeout { .. }));

    let view = peer.session.view();
    assert_eq!(view.document_id, None);
    assert!(!view.is_loading);
    assert!(view.error.unwrap().starts_with("Timed out loading document"));
    assert_eq!(peer.session.live_subscriptions(), 0);
}

#[tokio::test]
async fn later_load_wins_even_when_it_resolves_first() {
    let storage = Arc::new(SlowStorage::new());

    // Seed both documents into the shared storage through a separate repo.
    let seed = peer_with_storage(storage.clone(), None, TIMEOUT);
    let a = seed.session.create_new_document("A").unwrap();
    let b = seed.session.create_new_document("B").unwrap();
    seed.repo.flush().await;

    let peer = peer_with_storage(storage.clone(), None, TIMEOUT);
    storage.slow_down(&a, Duration::from_millis(150));

    let (first, second) = tokio::join!(peer.session.load_document(a.as_str()), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        peer.session.load_document(b.as_str()).await
    });

    assert!(matches!(first, Err(SessionError::Superseded(_))));
    second.unwrap();

    let view = peer.session.view();
    assert_eq!(view.document_id, Some(b));
    assert_eq!(view.doc.unwrap().title, "B");
    assert!(!view.is_loading);
    assert_eq!(peer.session.live_subscriptions(), 1);
}

#[tokio::test]
async fn invalid_id_supersedes_pending_load() {
    let storage = Arc::new(SlowStorage::new());
    let seed = peer_with_storage(storage.clone(), None, TIMEOUT);
    let a = seed.session.create_new_document("A").unwrap();
    seed.repo.flush().await;

    let peer = peer_with_storage(storage.clone(), None, TIMEOUT);
    storage.slow_down(&a, Duration::from_millis(150));

    let (first, second) = tokio::join!(peer.session.load_document(a.as_str()), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        peer.session.load_document("garbage").await
    });

    assert!(matches!(first, Err(SessionError::Superseded(_))));
    assert!(matches!(second, Err(SessionError::InvalidDocumentId(_))));

    let view = peer.session.view();
    assert_eq!(view.document_id, None);
    assert!(!view.is_loading);
    assert!(view.error.unwrap().starts_with("Invalid document id"));
    assert_eq!(peer.session.live_subscriptions(), 0);
}

#[tokio::test]
async fn create_supersedes_pending_load() {
    let network = BroadcastNetwork::new(16);
    let peer = peer(Some(network), Duration::from_millis(200));

    let missing_id = DocumentId::generate();
    let (load, created) = tokio::join!(
        peer.session.load_document(missing_id.as_str()),
        async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            peer.session.create_new_document("Fresh").unwrap()
        }
    );

    assert!(matches!(load, Err(SessionError::Superseded(_))));
    let view = peer.session.view();
    assert_eq!(view.document_id, Some(created));
    assert_eq!(view.error, None);
    assert_eq!(view.doc.unwrap().title, "Fresh");
    assert_eq!(peer.session.live_subscriptions(), 1);
}

#[tokio::test]
async fn close_tears_down_session() {
    let peer = peer(None, TIMEOUT);
    peer.session.create_new_document("Closing").unwrap();

    peer.session.close();

    assert_eq!(peer.session.view(), SessionView::default());
    assert_eq!(peer.session.live_subscriptions(), 0);
    assert!(peer.session.active_handle().is_none());
}
