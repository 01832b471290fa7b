use utoipa::OpenApi;
use crate::models::*;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// List locally known documents
#[utoipa::path(
    get,
    path = "/api/documents",
    responses(
        (status = 200, description = "Documents, most recently updated first", body = [RegistryEntry]),
        (status = 500, description = "Registry could not be read", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn list_documents_doc() {}

/// Create a document and open it
#[utoipa::path(
    post,
    path = "/api/documents",
    request_body = CreateDocumentRequest,
    responses(
        (status = 201, description = "Document created", body = CreateDocumentResponse)
    )
)]
#[allow(dead_code)]
pub async fn create_document_doc() {}

/// Remove a document from the local list
#[utoipa::path(
    delete,
    path = "/api/documents/{doc_id}",
    params(("doc_id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Removal result", body = RemoveDocumentResponse),
        (status = 400, description = "Invalid document id", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn remove_document_doc() {}

/// Current session state
#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Session state", body = SessionView)
    )
)]
#[allow(dead_code)]
pub async fn get_session_doc() {}

/// Join a document by id or shared link
#[utoipa::path(
    post,
    path = "/api/session/join",
    request_body = JoinDocumentRequest,
    responses(
        (status = 200, description = "Document opened", body = SessionView),
        (status = 400, description = "Invalid document id", body = ErrorResponse),
        (status = 404, description = "Document unavailable", body = ErrorResponse),
        (status = 409, description = "Superseded by a newer session", body = ErrorResponse),
        (status = 504, description = "Timed out locating the document", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn join_document_doc() {}

/// Replace the content of the open document
#[utoipa::path(
    put,
    path = "/api/session/content",
    request_body = UpdateContentRequest,
    responses(
        (status = 200, description = "Content updated", body = SessionView),
        (status = 409, description = "No document is open", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn update_content_doc() {}

/// Rename the open document
#[utoipa::path(
    put,
    path = "/api/session/title",
    request_body = UpdateTitleRequest,
    responses(
        (status = 200, description = "Title updated", body = SessionView),
        (status = 409, description = "No document is open", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn update_title_doc() {}

/// Shareable id and link of the open document
#[utoipa::path(
    get,
    path = "/api/session/share",
    responses(
        (status = 200, description = "Share information", body = ShareResponse)
    )
)]
#[allow(dead_code)]
pub async fn share_document_doc() {}

/// Open a page address carrying `?doc=`
#[utoipa::path(
    get,
    path = "/api/open",
    params(("doc" = Option<String>, Query, description = "Document id to open")),
    responses(
        (status = 200, description = "Link consumed", body = OpenLinkResponse),
        (status = 400, description = "Invalid document id", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn open_link_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        list_documents_doc,
        create_document_doc,
        remove_document_doc,
        get_session_doc,
        join_document_doc,
        update_content_doc,
        update_title_doc,
        share_document_doc,
        open_link_doc,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            DocumentId,
            EditorDocument,
            RegistryEntry,
            SessionView,
            CreateDocumentRequest,
            CreateDocumentResponse,
            JoinDocumentRequest,
            UpdateContentRequest,
            UpdateTitleRequest,
            ShareResponse,
            RemoveDocumentResponse,
            OpenLinkResponse,
        )
    ),
    tags(
        (name = "api", description = "Collaborative editor endpoints")
    )
)]
pub struct ApiDoc;
