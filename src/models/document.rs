use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Opaque identifier of a replicated document.
///
/// Rendered as the 32 character simple form of a UUID. Possession of the id
/// is enough to read and write the document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "5f0c3f7a9e0b4a53a1f2c0d9e8b7a6c5")]
pub struct DocumentId(String);

impl DocumentId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Parse and canonicalise an id. Any textual UUID form is accepted.
    pub fn parse(input: &str) -> Option<Self> {
        Uuid::try_parse(input.trim())
            .ok()
            .map(|uuid| Self(uuid.simple().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Format predicate applied to user supplied ids before any lookup.
pub fn is_valid_document_id(input: &str) -> bool {
    DocumentId::parse(input).is_some()
}

/// The replicated rich-text document.
///
/// Only ever mutated through [`crate::repo::DocHandle::change`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EditorDocument {
    pub title: String,
    /// Serialized rich-text markup.
    pub content: String,
    #[serde(rename = "createdAt", with = "chrono::serde::ts_milliseconds")]
    #[schema(value_type = i64)]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "chrono::serde::ts_milliseconds")]
    #[schema(value_type = i64)]
    pub updated_at: DateTime<Utc>,
}
