use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{error, info};

use super::{api_error, session_error, ApiError};
use crate::models::{
    CreateDocumentRequest, CreateDocumentResponse, DocumentId, RegistryEntry, RemoveDocumentResponse,
};
use crate::routes::AppState;

/// List locally known documents, most recently updated first
pub async fn list_documents(
    State(state): State<AppState>,
) -> Result<Json<Vec<RegistryEntry>>, ApiError> {
    // The registry store does blocking file IO.
    let registry = state.session.registry().clone();
    match tokio::task::spawn_blocking(move || registry.list_recent()).await {
        Ok(entries) => Ok(Json(entries)),
        Err(e) => {
            error!("Registry listing task failed: {}", e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to list documents",
            ))
        }
    }
}

/// Create a document and open it
pub async fn create_document(
    State(state): State<AppState>,
    Json(request): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<CreateDocumentResponse>), ApiError> {
    let title = request.title.unwrap_or_default();
    match state.session.create_new_document(&title) {
        Ok(document_id) => Ok((StatusCode::CREATED, Json(CreateDocumentResponse { document_id }))),
        Err(e) => {
            error!("Failed to create document: {}", e);
            Err(session_error(&e))
        }
    }
}

/// Remove a document from the local list; the document itself is untouched
pub async fn remove_document(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Result<(StatusCode, Json<RemoveDocumentResponse>), ApiError> {
    let Some(id) = DocumentId::parse(&doc_id) else {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("Invalid document id '{}'", doc_id),
        ));
    };

    let registry = state.session.registry().clone();
    let removal = {
        let id = id.clone();
        tokio::task::spawn_blocking(move || registry.remove(&id)).await
    };
    match removal {
        Ok(Ok(removed)) => {
            info!("Registry removal of {}: {}", id, removed);
            Ok((StatusCode::OK, Json(RemoveDocumentResponse { removed })))
        }
        Ok(Err(e)) => {
            error!("Failed to remove document '{}' from the registry: {}", id, e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to remove document '{}': {}", id, e),
            ))
        }
        Err(e) => {
            error!("Registry removal task for '{}' failed: {}", id, e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to remove document '{}'", id),
            ))
        }
    }
}
