mod common;

use chrono::Utc;
use loro::{ExportMode, LoroDoc};
use std::sync::Arc;
use std::time::Duration;

use common::{peer, wait_for_view};
use hedwig::error::SessionError;
use hedwig::models::{DocumentId, EditorDocument};
use hedwig::repo::lorodoc::{document_map, editor_doc_to_loro_map};
use hedwig::repo::network::new_peer_id;
use hedwig::repo::{BroadcastNetwork, HandleState, MessageBody, NetworkMessage};

const TIMEOUT: Duration = Duration::from_secs(3);

fn content_is(expected: &'static str) -> impl Fn(&hedwig::models::SessionView) -> bool {
    move |view| view.doc.as_ref().map(|doc| doc.content.as_str()) == Some(expected)
}

#[tokio::test]
async fn peer_loads_document_from_network() {
    let network = BroadcastNetwork::new(64);
    let alice = peer(Some(network.clone()), TIMEOUT);
    let bob = peer(Some(network), TIMEOUT);

    let id = alice.session.create_new_document("Shared notes").unwrap();
    alice.session.update_content("<p>hello</p>").unwrap();

    bob.session.load_document(id.as_str()).await.unwrap();

    let view = bob.session.view();
    assert_eq!(view.document_id, Some(id.clone()));
    let doc = view.doc.unwrap();
    assert_eq!(doc.title, "Shared notes");
    assert_eq!(doc.content, "<p>hello</p>");

    let entries = bob.session.registry().list();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, id);
    assert_eq!(entries[0].title, "Shared notes");
}

#[tokio::test]
async fn edits_propagate_in_both_directions() {
    let network = BroadcastNetwork::new(64);
    let alice = peer(Some(network.clone()), TIMEOUT);
    let bob = peer(Some(network), TIMEOUT);

    let id = alice.session.create_new_document("Pairing").unwrap();
    bob.session.load_document(id.as_str()).await.unwrap();

    alice.session.update_content("<p>from alice</p>").unwrap();
    wait_for_view(&bob.session, content_is("<p>from alice</p>")).await;

    bob.session.update_content("<p>from bob</p>").unwrap();
    wait_for_view(&alice.session, content_is("<p>from bob</p>")).await;

    bob.session.update_title("Renamed by bob").unwrap();
    let view = wait_for_view(&alice.session, |view| {
        view.doc.as_ref().map(|doc| doc.title.as_str()) == Some("Renamed by bob")
    })
    .await;
    assert_eq!(view.doc.unwrap().content, "<p>from bob</p>");
}

#[tokio::test]
async fn requesting_handle_becomes_ready_once_a_peer_answers() {
    let network = BroadcastNetwork::new(64);
    let alice = peer(Some(network.clone()), TIMEOUT);
    let bob = peer(Some(network), TIMEOUT);

    let handle = alice.repo.create();
    handle
        .change(|doc| doc.title = "Raw handle".to_string())
        .unwrap();

    let remote = bob.repo.find(handle.id()).await.unwrap();
    tokio::time::timeout(TIMEOUT, remote.when_ready())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(remote.state(), HandleState::Ready);
    assert_eq!(remote.doc().unwrap().title, "Raw handle");
}

#[tokio::test]
async fn document_stays_available_after_its_creator_closes_it() {
    let network = BroadcastNetwork::new(64);
    let alice = peer(Some(network.clone()), TIMEOUT);
    let bob = peer(Some(network), TIMEOUT);

    let id = alice.session.create_new_document("Archived").unwrap();
    alice.repo.flush().await;
    alice.session.close();

    bob.session.load_document(id.as_str()).await.unwrap();
    assert_eq!(bob.session.view().doc.unwrap().title, "Archived");
}

/// A document written elsewhere in two commits: its full snapshot and the
/// update carrying only the second commit.
fn two_commit_history() -> (Vec<u8>, Vec<u8>) {
    let source = LoroDoc::new();
    let now = Utc::now();
    let first = EditorDocument {
        title: "Remote".to_string(),
        content: "<p>draft</p>".to_string(),
        created_at: now,
        updated_at: now,
    };
    editor_doc_to_loro_map(&document_map(&source), None, &first).unwrap();
    source.commit();
    let after_first = source.oplog_vv();

    let second = EditorDocument {
        content: "<p>final</p>".to_string(),
        ..first.clone()
    };
    editor_doc_to_loro_map(&document_map(&source), Some(&first), &second).unwrap();
    source.commit();

    let update = source.export(ExportMode::updates(&after_first)).unwrap();
    let snapshot = source.export(ExportMode::Snapshot).unwrap();
    (snapshot, update)
}

#[tokio::test]
async fn update_without_its_history_does_not_complete_a_load() {
    let network = BroadcastNetwork::new(64);
    let bob = peer(Some(network.clone()), Duration::from_millis(300));
    let id = DocumentId::generate();
    let (snapshot, update) = two_commit_history();

    let sender = new_peer_id();
    let send = |bytes: &[u8]| {
        network.send(NetworkMessage {
            from: sender,
            document_id: id.clone(),
            body: MessageBody::Sync(Arc::new(bytes.to_vec())),
        })
    };

    let (loaded, _) = tokio::join!(bob.session.load_document(id.as_str()), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        send(&update);
    });
    assert!(matches!(loaded, Err(SessionError::Timeout { .. })));

    let handle = bob.repo.find(&id).await.unwrap();
    assert_eq!(handle.state(), HandleState::Requesting);
    assert_eq!(handle.doc(), None);
    assert_eq!(bob.session.view().doc, None);
    assert!(bob.session.registry().list().is_empty());
    assert!(!bob.session.update_content("<p>mine</p>").unwrap());

    let (loaded, _) = tokio::join!(bob.session.load_document(id.as_str()), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        send(&snapshot);
    });
    loaded.unwrap();

    let doc = bob.session.view().doc.unwrap();
    assert_eq!(doc.title, "Remote");
    assert_eq!(doc.content, "<p>final</p>");
    let entries = bob.session.registry().list();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, "Remote");
}
