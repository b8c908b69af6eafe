use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::FileEntry;

/// How a stored file is put back together from its chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Content identifier: SHA-256 of the whole file
    pub file_id: String,
    pub original_name: String,
    pub total_chunks: usize,
    /// SHA-256 of each chunk, in file order
    pub chunk_hashes: Vec<String>,
    pub chunk_size: usize,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

impl Manifest {
    /// True when `id` names this file or one of its chunks.
    pub fn matches(&self, id: &str) -> bool {
        self.file_id == id || self.chunk_hashes.iter().any(|h| h == id)
    }

    pub fn entry(&self) -> FileEntry {
        FileEntry {
            name: self.original_name.clone(),
            content_id: self.file_id.clone(),
            size: Some(self.size),
            chunks: Some(self.total_chunks),
        }
    }
}
