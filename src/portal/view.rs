//! Display regions and the states each one can show.

use std::fmt;
use tokio::sync::watch;

use crate::models::{FileEntry, UploadResult};

/// One independently updated area of the portal. Every write replaces the
/// previous value, so overlapping flows resolve to the last write.
#[derive(Debug)]
pub struct Region<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone> Region<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Observe future writes to this region.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Idle,
    NoFileSelected,
    Uploading,
    Uploaded {
        result: UploadResult,
        /// "Hash" or "CID"
        label: &'static str,
    },
    /// The store answered without an identifier.
    Failed,
    /// No answer from the store.
    Error,
}

impl UploadStatus {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            UploadStatus::NoFileSelected | UploadStatus::Failed | UploadStatus::Error
        )
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadStatus::Idle => Ok(()),
            UploadStatus::NoFileSelected => write!(f, "Please select a file first."),
            UploadStatus::Uploading => write!(f, "Uploading..."),
            UploadStatus::Uploaded { result, label } => write!(
                f,
                "Uploaded {} successfully. {}: {}",
                result.filename, label, result.content_id
            ),
            UploadStatus::Failed => write!(f, "Upload failed."),
            UploadStatus::Error => write!(f, "Error uploading file."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileListView {
    Idle,
    Loading,
    Empty,
    Files(Vec<FileEntry>),
    Unavailable,
    Error,
}

impl FileListView {
    /// The rows the listing shows, one string per row.
    pub fn rows(&self) -> Vec<String> {
        match self {
            FileListView::Idle => Vec::new(),
            FileListView::Loading => vec!["Loading...".to_string()],
            FileListView::Empty => vec!["No files found.".to_string()],
            FileListView::Files(files) => files
                .iter()
                .map(|f| format!("{} ({})", f.name, f.content_id))
                .collect(),
            FileListView::Unavailable => {
                vec!["File listing is not available on this store.".to_string()]
            }
            FileListView::Error => vec!["Error fetching files.".to_string()],
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, FileListView::Unavailable | FileListView::Error)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStatus {
    Idle,
    EmptyInput,
    Searching,
    Found(Option<String>),
    NotFound,
    Unavailable,
    Error,
}

impl SearchStatus {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            SearchStatus::EmptyInput | SearchStatus::Unavailable | SearchStatus::Error
        )
    }
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchStatus::Idle => Ok(()),
            SearchStatus::EmptyInput => write!(f, "Please enter a hash."),
            SearchStatus::Searching => write!(f, "Searching..."),
            SearchStatus::Found(Some(name)) => write!(f, "File found: {name}"),
            SearchStatus::Found(None) => write!(f, "File found."),
            SearchStatus::NotFound => write!(f, "File not found in this node."),
            SearchStatus::Unavailable => write!(f, "Lookup is not available on this store."),
            SearchStatus::Error => write!(f, "Error searching for file."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_last_write_wins() {
        let region = Region::new(SearchStatus::Idle);
        let mut rx = region.subscribe();

        region.set(SearchStatus::Searching);
        region.set(SearchStatus::NotFound);

        assert_eq!(region.get(), SearchStatus::NotFound);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), SearchStatus::NotFound);
    }

    #[test]
    fn test_file_rows() {
        let view = FileListView::Files(vec![FileEntry {
            name: "a.txt".into(),
            content_id: "h1".into(),
            size: None,
            chunks: None,
        }]);
        assert_eq!(view.rows(), vec!["a.txt (h1)"]);
        assert_eq!(FileListView::Empty.rows(), vec!["No files found."]);
        assert!(FileListView::Idle.rows().is_empty());
    }

    #[test]
    fn test_upload_message_names_file_and_identifier() {
        let status = UploadStatus::Uploaded {
            result: UploadResult {
                filename: "cat.png".into(),
                content_id: "bafy1".into(),
            },
            label: "CID",
        };
        assert_eq!(status.to_string(), "Uploaded cat.png successfully. CID: bafy1");
        assert!(!status.is_failure());
        assert!(UploadStatus::Failed.is_failure());
    }
}
