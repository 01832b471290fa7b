use loro::{LoroDoc, LoroMap, LoroResult, ToJson};
use tracing::warn;

use crate::models::EditorDocument;

/// Name of the root map that holds the editor document fields.
pub const DOCUMENT_ROOT: &str = "document";

pub fn document_map(loro_doc: &LoroDoc) -> LoroMap {
    loro_doc.get_map(DOCUMENT_ROOT)
}

/// Read the editor document out of a loro doc.
///
/// Returns `None` while the document has not been initialised (no fields yet).
pub fn loro_doc_to_editor_doc(loro_doc: &LoroDoc) -> Option<EditorDocument> {
    let document_loro_map = document_map(loro_doc);
    if document_loro_map.is_empty() {
        return None;
    }

    let json = document_loro_map.get_deep_value().to_json_value();
    match serde_json::from_value::<EditorDocument>(json) {
        Ok(doc) => Some(doc),
        Err(e) => {
            warn!("Document map does not hold an editor document: {}", e);
            None
        }
    }
}

/// Write `next` into the document map.
///
/// Only fields that differ from `prev` are written so that concurrent edits of
/// other fields by peers are not overwritten.
pub fn editor_doc_to_loro_map(
    document_loro_map: &LoroMap,
    prev: Option<&EditorDocument>,
    next: &EditorDocument,
) -> LoroResult<()> {
    if prev.map_or(true, |p| p.title != next.title) {
        document_loro_map.insert("title", next.title.as_str())?;
    }
    if prev.map_or(true, |p| p.content != next.content) {
        document_loro_map.insert("content", next.content.as_str())?;
    }
    if prev.map_or(true, |p| p.created_at != next.created_at) {
        document_loro_map.insert("createdAt", next.created_at.timestamp_millis())?;
    }
    if prev.map_or(true, |p| p.updated_at != next.updated_at) {
        document_loro_map.insert("updatedAt", next.updated_at.timestamp_millis())?;
    }
    Ok(())
}
