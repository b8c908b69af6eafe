//! Content-addressed chunk storage
//!
//! Files are split into fixed-size chunks. Each chunk is written once under
//! `chunks/<sha256>`; a JSON manifest under `manifests/<file-sha256>.json`
//! records the chunk order. The SHA-256 of the whole file is its content
//! identifier.
//!
//! ```text
//! <root>/
//!   chunks/<chunk-hash>
//!   manifests/<file-hash>.json
//! ```

pub mod chunking;
pub mod manifest;

pub use chunking::{chunk_bytes, sha256_hex};
pub use manifest::Manifest;

use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::utils::fs::{write_atomic, write_new};

const CHUNKS_DIR: &str = "chunks";
const MANIFESTS_DIR: &str = "manifests";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("chunk {index} of {file_id} is missing or does not match its hash")]
    Corrupt { file_id: String, index: usize },

    #[error("manifest of {file_id} does not describe its chunks")]
    Inconsistent { file_id: String },

    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Disk-backed content store. Cloning is cheap; clones share the directory.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
    chunk_size: usize,
}

impl ContentStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>, chunk_size: usize) -> StoreResult<Self> {
        if chunk_size == 0 {
            return Err(StoreError::InvalidChunkSize);
        }
        let root = root.into();
        fs::create_dir_all(root.join(CHUNKS_DIR)).await?;
        fs::create_dir_all(root.join(MANIFESTS_DIR)).await?;

        info!(root = %root.display(), chunk_size, "Content store opened");
        Ok(Self { root, chunk_size })
    }

    /// Store `data` under its content identifier.
    ///
    /// Uploading bytes that are already stored returns the existing manifest
    /// unchanged, including its original name.
    pub async fn put(&self, name: &str, data: &[u8]) -> StoreResult<Manifest> {
        let file_id = sha256_hex(data);

        if let Some(existing) = self.read_manifest(&file_id).await? {
            debug!(file_id = %file_id, "Content already stored");
            return Ok(existing);
        }

        let mut chunk_hashes = Vec::new();
        for chunk in chunk_bytes(data, self.chunk_size) {
            let hash = sha256_hex(chunk);
            let path = self.chunk_path(&hash);
            if !fs::try_exists(&path).await? {
                write_atomic(&path, chunk).await?;
            }
            chunk_hashes.push(hash);
        }

        let manifest = Manifest {
            file_id: file_id.clone(),
            original_name: display_name(name),
            total_chunks: chunk_hashes.len(),
            chunk_hashes,
            chunk_size: self.chunk_size,
            size: data.len() as u64,
            created_at: chrono::Utc::now(),
        };
        let json = serde_json::to_vec_pretty(&manifest)?;
        if !write_new(&self.manifest_path(&file_id), &json).await? {
            // A concurrent upload of the same bytes got there first.
            debug!(file_id = %file_id, "Manifest already written");
            if let Some(existing) = self.read_manifest(&file_id).await? {
                return Ok(existing);
            }
        }

        info!(
            file_id = %file_id,
            name = %manifest.original_name,
            chunks = manifest.total_chunks,
            size = manifest.size,
            "File stored"
        );
        Ok(manifest)
    }

    /// All stored files, newest first. Unreadable manifests are skipped.
    pub async fn list(&self) -> StoreResult<Vec<Manifest>> {
        let mut manifests = Vec::new();
        let mut entries = fs::read_dir(self.root.join(MANIFESTS_DIR)).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match fs::read(&path).await.map_err(StoreError::from).and_then(|raw| {
                serde_json::from_slice::<Manifest>(&raw).map_err(StoreError::from)
            }) {
                Ok(manifest) => manifests.push(manifest),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable manifest"),
            }
        }

        manifests.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.original_name.cmp(&b.original_name))
        });
        Ok(manifests)
    }

    /// Find the file whose content identifier, or one of whose chunk hashes,
    /// equals `id`. Hex case is ignored.
    pub async fn find(&self, id: &str) -> StoreResult<Option<Manifest>> {
        let id = id.trim().to_ascii_lowercase();
        if !is_sha256_hex(&id) {
            return Ok(None);
        }
        if let Some(manifest) = self.read_manifest(&id).await? {
            return Ok(Some(manifest));
        }
        Ok(self.list().await?.into_iter().find(|m| m.matches(&id)))
    }

    /// Reassemble the file named by `id`, checking every chunk against its hash.
    pub async fn get(&self, id: &str) -> StoreResult<Option<(Manifest, Vec<u8>)>> {
        let Some(manifest) = self.find(id).await? else {
            return Ok(None);
        };

        let inconsistent = || StoreError::Inconsistent {
            file_id: manifest.file_id.clone(),
        };
        if manifest.total_chunks != manifest.chunk_hashes.len() {
            return Err(inconsistent());
        }

        let mut data = Vec::new();
        for (index, hash) in manifest.chunk_hashes.iter().enumerate() {
            let corrupt = || StoreError::Corrupt {
                file_id: manifest.file_id.clone(),
                index,
            };
            if !is_sha256_hex(hash) {
                return Err(corrupt());
            }
            let chunk = match fs::read(self.chunk_path(hash)).await {
                Ok(chunk) => chunk,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(corrupt()),
                Err(e) => return Err(e.into()),
            };
            if sha256_hex(&chunk) != *hash {
                warn!(file_id = %manifest.file_id, index, "Chunk failed hash verification");
                return Err(corrupt());
            }
            data.extend_from_slice(&chunk);
        }

        if data.len() as u64 != manifest.size || sha256_hex(&data) != manifest.file_id {
            warn!(file_id = %manifest.file_id, "Reassembled file does not match its manifest");
            return Err(inconsistent());
        }
        Ok(Some((manifest, data)))
    }

    async fn read_manifest(&self, file_id: &str) -> StoreResult<Option<Manifest>> {
        match fs::read(self.manifest_path(file_id)).await {
            Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn chunk_path(&self, hash: &str) -> PathBuf {
        self.root.join(CHUNKS_DIR).join(hash)
    }

    fn manifest_path(&self, file_id: &str) -> PathBuf {
        self.root.join(MANIFESTS_DIR).join(format!("{file_id}.json"))
    }
}

fn is_sha256_hex(id: &str) -> bool {
    id.len() == 64 && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn display_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    if base.is_empty() {
        "unnamed".to_string()
    } else {
        base.to_string()
    }
}
