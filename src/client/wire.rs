// Response bodies as the stores send them. Both protocol variants and the
// older node responses are accepted here so the rest of the client only sees
// `UploadResult`, `LookupResult` and `FileEntry`.

use serde::Deserialize;

use crate::models::FileEntry;

#[derive(Debug, Deserialize)]
pub(crate) struct UploadReply {
    hash: Option<String>,
    cid: Option<String>,
    filename: Option<String>,
    #[serde(rename = "fileId")]
    file_id: Option<String>,
}

impl UploadReply {
    pub(crate) fn content_id(&self) -> Option<&str> {
        [self.hash.as_deref(), self.cid.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|id| !id.is_empty())
    }

    pub(crate) fn filename(&self) -> Option<&str> {
        [self.filename.as_deref(), self.file_id.as_deref()]
            .into_iter()
            .flatten()
            .find(|name| !name.is_empty())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListReply {
    Bare(Vec<FileEntry>),
    Wrapped { files: Vec<FileEntry> },
}

impl ListReply {
    pub(crate) fn into_entries(self) -> Vec<FileEntry> {
        match self {
            ListReply::Bare(files) | ListReply::Wrapped { files } => files,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LookupReply {
    #[serde(default)]
    pub(crate) found: bool,
    filename: Option<String>,
    file: Option<LookupFile>,
}

#[derive(Debug, Deserialize)]
struct LookupFile {
    name: Option<String>,
}

impl LookupReply {
    pub(crate) fn filename(self) -> Option<String> {
        self.filename
            .or_else(|| self.file.and_then(|f| f.name))
            .filter(|name| !name.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_reply_prefers_hash_then_cid() {
        let reply: UploadReply = serde_json::from_str(r#"{"hash": "aa", "cid": "bb"}"#).unwrap();
        assert_eq!(reply.content_id(), Some("aa"));

        let reply: UploadReply = serde_json::from_str(r#"{"hash": "  ", "cid": "bb"}"#).unwrap();
        assert_eq!(reply.content_id(), Some("bb"));

        let reply: UploadReply = serde_json::from_str(r#"{"status": "error"}"#).unwrap();
        assert_eq!(reply.content_id(), None);
    }

    #[test]
    fn test_upload_reply_filename_falls_back_to_file_id() {
        let reply: UploadReply =
            serde_json::from_str(r#"{"hash": "aa", "fileId": "report.pdf"}"#).unwrap();
        assert_eq!(reply.filename(), Some("report.pdf"));
    }

    #[test]
    fn test_list_reply_accepts_both_shapes() {
        let bare: ListReply =
            serde_json::from_str(r#"[{"name": "a.txt", "hash": "h1"}]"#).unwrap();
        assert_eq!(bare.into_entries().len(), 1);

        let wrapped: ListReply = serde_json::from_str(
            r#"{"files": [{"name": "a.txt", "hash": "h1", "chunks": 2, "size": 10}, {"name": "b", "cid": "c2"}]}"#,
        )
        .unwrap();
        let entries = wrapped.into_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].content_id, "c2");
        assert_eq!(entries[0].size, Some(10));
    }

    #[test]
    fn test_lookup_reply_reads_nested_file_name() {
        let reply: LookupReply =
            serde_json::from_str(r#"{"found": true, "file": {"name": "x.txt", "hash": "h"}}"#).unwrap();
        assert!(reply.found);
        assert_eq!(reply.filename().as_deref(), Some("x.txt"));

        let reply: LookupReply =
            serde_json::from_str(r#"{"found": false, "message": "File not found"}"#).unwrap();
        assert!(!reply.found);
        assert_eq!(reply.filename(), None);
    }
}
