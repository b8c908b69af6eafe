// Temp-file helpers shared by the content store and downloads

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Sibling of `path` with a unique `.tmp` suffix.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
    path.with_file_name(name)
}

/// Write through a temporary file and rename into place, so a reader never
/// observes a partial file. Replaces whatever is at `path`.
pub async fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let tmp = temp_path(path);
    fs::write(&tmp, data).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}

/// Give the fully written `tmp` the name `path` if nothing is there yet.
/// Returns `false` when `path` already exists. `tmp` is left in place.
pub async fn link_new(tmp: &Path, path: &Path) -> std::io::Result<bool> {
    match fs::hard_link(tmp, path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e),
    }
}

/// Write `data` to `path` unless the file already exists. Readers never see
/// a partial file, and concurrent writers cannot replace each other.
pub async fn write_new(path: &Path, data: &[u8]) -> std::io::Result<bool> {
    let tmp = temp_path(path);
    if let Err(e) = fs::write(&tmp, data).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }
    let linked = link_new(&tmp, path).await;
    let _ = fs::remove_file(&tmp).await;
    linked
}
