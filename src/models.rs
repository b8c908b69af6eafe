use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::Config;
use crate::storage::{ContentStore, StoreResult};

#[derive(Clone)]
pub struct AppState {
    pub store: ContentStore,
    pub config: Config,
}

impl AppState {
    /// Open the content store named by `config` and bundle it with the config.
    pub async fn new(config: Config) -> StoreResult<Self> {
        let store = ContentStore::open(&config.store.data_dir, config.store.chunk_size).await?;
        Ok(Self { store, config })
    }
}

/// A file picked from local input, ready to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl LocalFile {
    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".to_string());
        Ok(Self { name, bytes })
    }
}

/// What the store answered to a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub filename: String,
    pub content_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupResult {
    pub found: bool,
    /// Only present when `found`
    pub filename: Option<String>,
}

impl LookupResult {
    pub fn found(filename: Option<String>) -> Self {
        Self {
            found: true,
            filename,
        }
    }

    pub fn missing() -> Self {
        Self {
            found: false,
            filename: None,
        }
    }
}

/// One row of a store's file listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    #[serde(rename = "hash", alias = "cid")]
    pub content_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub files: usize,
}
