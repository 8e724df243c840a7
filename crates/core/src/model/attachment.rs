//! Embedded attachment documents.

use serde::{Deserialize, Serialize};

/// A file attachment embedded in a transaction record.
///
/// The embedded list on a transaction is the sole authoritative record of
/// which storage keys belong to it; once no transaction references a key,
/// the storage object is orphaned garbage. All four fields are required so
/// malformed embedded documents are rejected at the repository boundary
/// instead of reaching the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Object storage key.
    pub key: String,
    /// Public retrieval URL derived from the key.
    pub url: String,
    /// Original filename.
    pub name: String,
    /// MIME type.
    #[serde(rename = "type")]
    pub content_type: String,
}
