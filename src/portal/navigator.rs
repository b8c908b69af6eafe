use async_trait::async_trait;
use reqwest::Url;
use std::path::PathBuf;
use tracing::info;

use crate::client::StoreClient;
use crate::types::AppResult;

/// What following a download link produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// The URL was handed off; nothing was fetched locally.
    Opened(Url),
    /// The body was saved to this path.
    Saved(PathBuf),
}

/// Follows download links on behalf of the portal.
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn navigate(&self, url: &Url) -> AppResult<Navigation>;
}

/// Hands the URL back without fetching it.
#[derive(Debug, Default, Clone)]
pub struct LinkOnly;

#[async_trait]
impl Navigator for LinkOnly {
    async fn navigate(&self, url: &Url) -> AppResult<Navigation> {
        Ok(Navigation::Opened(url.clone()))
    }
}

/// Streams the linked file into a directory.
#[derive(Debug, Clone)]
pub struct SaveToDisk {
    client: StoreClient,
    out_dir: PathBuf,
}

impl SaveToDisk {
    pub fn new(client: StoreClient, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            out_dir: out_dir.into(),
        }
    }
}

#[async_trait]
impl Navigator for SaveToDisk {
    async fn navigate(&self, url: &Url) -> AppResult<Navigation> {
        let fallback = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|s| !s.is_empty())
            .unwrap_or("download")
            .to_string();

        info!(url = %url, out_dir = %self.out_dir.display(), "Saving download");
        let path = self.client.download_to(url, &self.out_dir, &fallback).await?;
        Ok(Navigation::Saved(path))
    }
}
