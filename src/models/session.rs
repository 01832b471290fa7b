use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{DocumentId, EditorDocument};

/// UI facing state of the session controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SessionView {
    #[serde(rename = "documentId")]
    pub document_id: Option<DocumentId>,
    pub doc: Option<EditorDocument>,
    #[serde(rename = "isLoading")]
    pub is_loading: bool,
    pub error: Option<String>,
}
