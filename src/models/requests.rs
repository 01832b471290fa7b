use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{DocumentId, SessionView};

/// Request payload for creating a document
#[derive(Serialize, Deserialize, ToSchema)]
pub struct CreateDocumentRequest {
    #[serde(default)]
    pub title: Option<String>,
}

/// Response returned after creating a document
#[derive(Serialize, Deserialize, ToSchema)]
pub struct CreateDocumentResponse {
    #[serde(rename = "documentId")]
    pub document_id: DocumentId,
}

/// Request payload for joining a document by id or shared link
#[derive(Serialize, Deserialize, ToSchema)]
pub struct JoinDocumentRequest {
    pub input: String,
}

/// Request payload for replacing the document content
#[derive(Serialize, Deserialize, ToSchema)]
pub struct UpdateContentRequest {
    pub content: String,
}

/// Request payload for renaming the document
#[derive(Serialize, Deserialize, ToSchema)]
pub struct UpdateTitleRequest {
    pub title: String,
}

/// Response for the share dialog
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ShareResponse {
    #[serde(rename = "documentId")]
    pub document_id: Option<DocumentId>,
    pub url: String,
}

/// Response returned after removing a registry entry
#[derive(Serialize, Deserialize, ToSchema)]
pub struct RemoveDocumentResponse {
    pub removed: bool,
}

/// Response returned after opening a shared link
#[derive(Serialize, Deserialize, ToSchema)]
pub struct OpenLinkResponse {
    /// Address to show once the `doc` parameter has been consumed.
    pub location: String,
    pub session: SessionView,
}
