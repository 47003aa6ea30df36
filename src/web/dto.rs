//! Response shapes for the dispatch endpoint.
//!
//! Mutations answer with a `success` flag plus operation-specific fields.
//! `read` bypasses these and returns the raw document as `text/plain`.

use serde::Serialize;

use crate::store::{MediaItem, TrashedEntry};

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub success: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Serialize)]
pub struct WriteResponse {
    pub success: bool,
    pub filename: String,
    /// Write strategy that landed the content, `atomic` or `direct`.
    pub method: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RenameResponse {
    pub success: bool,
    #[serde(rename = "oldName")]
    pub old_name: String,
    #[serde(rename = "newName")]
    pub new_name: String,
}

#[derive(Debug, Serialize)]
pub struct RecycleBinResponse {
    pub success: bool,
    pub files: Vec<TrashedEntry>,
}

#[derive(Debug, Serialize)]
pub struct RestoreResponse {
    pub success: bool,
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct MediaResponse {
    pub success: bool,
    pub path: String,
    pub items: Vec<MediaItem>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub filename: String,
    pub url: String,
    pub size: u64,
}

#[derive(Debug, Serialize)]
pub struct CollectionsResponse {
    pub success: bool,
    pub collections: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub success: bool,
    pub logging: bool,
    pub log_level: String,
}
