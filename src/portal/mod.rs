//! Portal
//!
//! The user-facing flows over a [`StoreClient`]:
//! - **upload** a selected file and show the identifier the store assigned
//! - **refresh** the file listing
//! - **search** for an identifier
//! - **download** by following the store's download link
//!
//! Every flow writes its outcome into its own [`Region`] and never returns an
//! error for store failures; those become a failure state in the region.
//! Flows take `&self` and may run concurrently.

pub mod navigator;
pub mod view;

pub use navigator::{LinkOnly, Navigation, Navigator, SaveToDisk};
pub use view::{FileListView, Region, SearchStatus, UploadStatus};

use reqwest::Url;
use tracing::{info, warn};

use crate::client::{ClientError, StoreClient};
use crate::models::LocalFile;
use crate::types::AppResult;

pub struct Portal<N> {
    client: StoreClient,
    navigator: N,
    upload_status: Region<UploadStatus>,
    file_list: Region<FileListView>,
    search_result: Region<SearchStatus>,
    last_navigation: Region<Option<Url>>,
}

impl<N: Navigator> Portal<N> {
    pub fn new(client: StoreClient, navigator: N) -> Self {
        Self {
            client,
            navigator,
            upload_status: Region::new(UploadStatus::Idle),
            file_list: Region::new(FileListView::Idle),
            search_result: Region::new(SearchStatus::Idle),
            last_navigation: Region::new(None),
        }
    }

    pub fn upload_status(&self) -> &Region<UploadStatus> {
        &self.upload_status
    }

    pub fn file_list(&self) -> &Region<FileListView> {
        &self.file_list
    }

    pub fn search_result(&self) -> &Region<SearchStatus> {
        &self.search_result
    }

    pub fn last_navigation(&self) -> &Region<Option<Url>> {
        &self.last_navigation
    }

    /// Upload `file`, or report that nothing was selected without touching
    /// the network. A successful upload refreshes the listing when the store
    /// has one.
    pub async fn upload(&self, file: Option<LocalFile>) -> UploadStatus {
        let Some(file) = file else {
            self.upload_status.set(UploadStatus::NoFileSelected);
            return UploadStatus::NoFileSelected;
        };

        self.upload_status.set(UploadStatus::Uploading);
        let status = match self.client.upload(file).await {
            Ok(result) => {
                info!(filename = %result.filename, content_id = %result.content_id, "Upload complete");
                UploadStatus::Uploaded {
                    result,
                    label: self.client.protocol().identifier_label(),
                }
            }
            Err(e) if e.is_transport() => {
                warn!(error = %e, "Upload could not reach the store");
                UploadStatus::Error
            }
            Err(e) => {
                warn!(error = %e, "Upload rejected");
                UploadStatus::Failed
            }
        };
        self.upload_status.set(status.clone());

        if matches!(status, UploadStatus::Uploaded { .. }) && self.client.supports_listing() {
            self.refresh_files().await;
        }
        status
    }

    pub async fn refresh_files(&self) -> FileListView {
        self.file_list.set(FileListView::Loading);

        let view = match self.client.list_files().await {
            Ok(files) if files.is_empty() => FileListView::Empty,
            Ok(files) => FileListView::Files(files),
            Err(ClientError::Unsupported(_)) => FileListView::Unavailable,
            Err(e) => {
                warn!(error = %e, "Fetching the file listing failed");
                FileListView::Error
            }
        };
        self.file_list.set(view.clone());
        view
    }

    /// Look up `input` after trimming it. Blank input is refused locally.
    pub async fn search(&self, input: &str) -> SearchStatus {
        let content_id = input.trim();
        if content_id.is_empty() {
            self.search_result.set(SearchStatus::EmptyInput);
            return SearchStatus::EmptyInput;
        }

        self.search_result.set(SearchStatus::Searching);
        let status = match self.client.lookup(content_id).await {
            Ok(result) if result.found => SearchStatus::Found(result.filename),
            Ok(_) => SearchStatus::NotFound,
            Err(ClientError::Unsupported(_)) => SearchStatus::Unavailable,
            Err(e) => {
                warn!(error = %e, content_id, "Lookup failed");
                SearchStatus::Error
            }
        };
        self.search_result.set(status.clone());
        status
    }

    /// Follow the download link for `content_id`. The identifier is used as
    /// given.
    pub async fn download(&self, content_id: &str) -> AppResult<Navigation> {
        let url = self.client.download_url(content_id)?;
        self.last_navigation.set(Some(url.clone()));
        self.navigator.navigate(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientOptions, Protocol};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        visited: Mutex<Vec<Url>>,
    }

    #[async_trait]
    impl Navigator for Recorder {
        async fn navigate(&self, url: &Url) -> AppResult<Navigation> {
            self.visited.lock().unwrap().push(url.clone());
            Ok(Navigation::Opened(url.clone()))
        }
    }

    fn portal(protocol: Protocol, base_url: &str) -> Portal<Recorder> {
        let options = ClientOptions::preset(protocol, base_url).unwrap();
        Portal::new(StoreClient::new(options).unwrap(), Recorder::default())
    }

    fn file(name: &str) -> Option<LocalFile> {
        Some(LocalFile {
            name: name.to_string(),
            bytes: b"contents".to_vec(),
        })
    }

    #[tokio::test]
    async fn test_upload_without_file_sends_nothing() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let portal = portal(Protocol::Hash, &server.url());
        let status = portal.upload(None).await;

        assert_eq!(status, UploadStatus::NoFileSelected);
        assert_eq!(portal.upload_status().get().to_string(), "Please select a file first.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_success_shows_identifier_and_refreshes_listing() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/upload")
            .with_body(r#"{"hash": "9f86d081884c7d65", "fileId": "notes.txt"}"#)
            .create_async()
            .await;
        let listing = server
            .mock("GET", "/api/files")
            .with_body(r#"[{"name": "notes.txt", "hash": "9f86d081884c7d65"}]"#)
            .expect(1)
            .create_async()
            .await;

        let portal = portal(Protocol::Hash, &server.url());
        portal.upload(file("notes.txt")).await;

        let message = portal.upload_status().get().to_string();
        assert!(message.contains("9f86d081884c7d65"), "{message}");
        assert!(message.contains("notes.txt"), "{message}");
        assert_eq!(portal.file_list().get().rows(), vec!["notes.txt (9f86d081884c7d65)"]);
        listing.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_cid_store_skips_listing() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/upload")
            .with_body(r#"{"filename": "a.bin", "cid": "bafyabc"}"#)
            .create_async()
            .await;

        let portal = portal(Protocol::Cid, &server.url());
        let status = portal.upload(file("a.bin")).await;

        assert_eq!(status.to_string(), "Uploaded a.bin successfully. CID: bafyabc");
        assert_eq!(portal.file_list().get(), FileListView::Idle);
    }

    #[tokio::test]
    async fn test_upload_missing_identifier_is_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/upload")
            .with_body(r#"{"status": "success", "message": "ok"}"#)
            .create_async()
            .await;

        let portal = portal(Protocol::Hash, &server.url());
        let status = portal.upload(file("x.txt")).await;

        assert_eq!(status, UploadStatus::Failed);
        assert_eq!(status.to_string(), "Upload failed.");
        assert!(status.is_failure());
    }

    #[tokio::test]
    async fn test_upload_unreachable_store() {
        let portal = portal(Protocol::Hash, "http://127.0.0.1:1");
        let status = portal.upload(file("x.txt")).await;
        assert_eq!(status.to_string(), "Error uploading file.");
    }

    #[tokio::test]
    async fn test_empty_listing_shows_no_files_row() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/files")
            .with_body("[]")
            .create_async()
            .await;

        let portal = portal(Protocol::Hash, &server.url());
        let view = portal.refresh_files().await;

        assert_eq!(view, FileListView::Empty);
        assert_eq!(view.rows(), vec!["No files found."]);
    }

    #[tokio::test]
    async fn test_listing_renders_every_file() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/files")
            .with_body(
                r#"{"files": [
                    {"name": "a.txt", "hash": "h1"},
                    {"name": "b.txt", "hash": "h2"},
                    {"name": "c.txt", "hash": "h3"}
                ]}"#,
            )
            .create_async()
            .await;

        let portal = portal(Protocol::Hash, &server.url());
        let rows = portal.refresh_files().await.rows();

        assert_eq!(rows.len(), 3);
        for (row, (name, id)) in rows.iter().zip([("a.txt", "h1"), ("b.txt", "h2"), ("c.txt", "h3")]) {
            assert!(row.contains(name) && row.contains(id), "{row}");
        }
    }

    #[tokio::test]
    async fn test_listing_error_state() {
        let portal = portal(Protocol::Hash, "http://127.0.0.1:1");
        let view = portal.refresh_files().await;
        assert_eq!(view.rows(), vec!["Error fetching files."]);

        let portal = self::portal(Protocol::Cid, "http://127.0.0.1:1");
        assert_eq!(portal.refresh_files().await, FileListView::Unavailable);
    }

    #[tokio::test]
    async fn test_search_blank_input_sends_nothing() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let portal = portal(Protocol::Hash, &server.url());
        let status = portal.search("   ").await;

        assert_eq!(status, SearchStatus::EmptyInput);
        assert_eq!(status.to_string(), "Please enter a hash.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_found_and_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/find/h1")
            .with_body(r#"{"found": true, "filename": "x.txt"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/find/h2")
            .with_body(r#"{"found": false}"#)
            .create_async()
            .await;

        let portal = portal(Protocol::Hash, &server.url());

        let found = portal.search("  h1\n").await.to_string();
        assert!(found.contains("x.txt"), "{found}");

        let missing = portal.search("h2").await.to_string();
        assert_eq!(missing, "File not found in this node.");
        assert_ne!(found, missing);
    }

    #[tokio::test]
    async fn test_search_transport_error() {
        let portal = portal(Protocol::Hash, "http://127.0.0.1:1");
        assert_eq!(portal.search("h1").await, SearchStatus::Error);
    }

    #[tokio::test]
    async fn test_download_navigates_to_identifier() {
        let portal = portal(Protocol::Hash, "http://127.0.0.1:5000");
        let navigation = portal.download("abc123").await.unwrap();

        let visited = portal.navigator.visited.lock().unwrap().clone();
        assert_eq!(visited.len(), 1);
        assert_eq!(visited[0].as_str(), "http://127.0.0.1:5000/api/download/abc123");
        assert_eq!(visited[0].path_segments().unwrap().last(), Some("abc123"));
        assert_eq!(navigation, Navigation::Opened(visited[0].clone()));
        assert_eq!(portal.last_navigation().get(), Some(visited[0].clone()));
    }

    #[tokio::test]
    async fn test_concurrent_flows_update_their_own_regions() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/files")
            .with_body("[]")
            .create_async()
            .await;
        server
            .mock("GET", "/api/find/h9")
            .with_body(r#"{"found": false}"#)
            .create_async()
            .await;

        let portal = portal(Protocol::Hash, &server.url());
        let (view, search) = tokio::join!(portal.refresh_files(), portal.search("h9"));

        assert_eq!(view, FileListView::Empty);
        assert_eq!(search, SearchStatus::NotFound);
        assert_eq!(portal.upload_status().get(), UploadStatus::Idle);
    }
}
