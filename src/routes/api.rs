use crate::handlers::{
    create_document, get_session, health_check, join_document, list_documents, open_link,
    remove_document, share_document, update_content, update_title,
};
use axum::{
    routing::{delete, get, post, put},
    Router,
};

use super::AppState;

/// Create API routes
pub fn create_api_routes(state: AppState) -> Router {
    Router::<AppState>::new()
        .route("/health", get(health_check))
        .route("/documents", get(list_documents).post(create_document))
        .route("/documents/:doc_id", delete(remove_document))
        .route("/session", get(get_session))
        .route("/session/join", post(join_document))
        .route("/session/content", put(update_content))
        .route("/session/title", put(update_title))
        .route("/session/share", get(share_document))
        .route("/open", get(open_link))
        .with_state(state)
}
