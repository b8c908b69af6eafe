//! Store Client
//!
//! Asynchronous HTTP client for a content-addressed file store. One client
//! covers both store protocols that are in use:
//!
//! - **Hash** (`/api/upload`, `/api/files`, `/api/find/{hash}`, `/api/download/{hash}`)
//! - **CID** (`/upload`, `/download/{cid}`)
//!
//! The protocol only picks the default paths. Every path can be overridden in
//! [`ClientOptions`], and endpoints a store does not offer are left unset.

mod error;
mod wire;

pub use error::{ClientError, ClientResult};

use futures::StreamExt;
use percent_encoding::percent_decode_str;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::models::{FileEntry, LocalFile, LookupResult, UploadResult};
use crate::utils::fs::{link_new, temp_path};
use wire::{ListReply, LookupReply, UploadReply};

/// Multipart field the stores read the uploaded file from.
pub const UPLOAD_FIELD: &str = "file";

/// Numbered names tried before a download gives up on finding a free one.
const MAX_NAME_ATTEMPTS: usize = 1000;

/// Store protocol variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Hash-addressed store with listing and lookup under `/api`
    Hash,
    /// CID-addressed store with upload and download only
    Cid,
}

impl Protocol {
    /// How the identifier is named to the user.
    pub fn identifier_label(&self) -> &'static str {
        match self {
            Protocol::Hash => "Hash",
            Protocol::Cid => "CID",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Hash => write!(f, "hash"),
            Protocol::Cid => write!(f, "cid"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown store protocol '{0}', expected 'hash' or 'cid'")]
pub struct ParseProtocolError(String);

impl std::str::FromStr for Protocol {
    type Err = ParseProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hash" => Ok(Protocol::Hash),
            "cid" => Ok(Protocol::Cid),
            other => Err(ParseProtocolError(other.to_string())),
        }
    }
}

/// Where the store lives and which paths it answers on.
///
/// `lookup_path` and `download_path` are prefixes: the identifier is appended
/// as one more path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub protocol: Protocol,
    pub base_url: Url,
    pub upload_path: String,
    pub list_path: Option<String>,
    pub lookup_path: Option<String>,
    pub download_path: String,
    pub timeout_secs: Option<u64>,
}

impl ClientOptions {
    /// Default paths for `protocol` on the store at `base_url`.
    pub fn preset(protocol: Protocol, base_url: &str) -> ClientResult<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }

        Ok(match protocol {
            Protocol::Hash => Self {
                protocol,
                base_url,
                upload_path: "/api/upload".to_string(),
                list_path: Some("/api/files".to_string()),
                lookup_path: Some("/api/find".to_string()),
                download_path: "/api/download".to_string(),
                timeout_secs: None,
            },
            Protocol::Cid => Self {
                protocol,
                base_url,
                upload_path: "/upload".to_string(),
                list_path: None,
                lookup_path: None,
                download_path: "/download".to_string(),
                timeout_secs: None,
            },
        })
    }
}

/// HTTP client for one store.
#[derive(Debug, Clone)]
pub struct StoreClient {
    http: Client,
    options: ClientOptions,
}

impl StoreClient {
    pub fn new(options: ClientOptions) -> ClientResult<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = options.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(|source| ClientError::Transport {
            endpoint: "client_init".to_string(),
            source,
        })?;

        Ok(Self { http, options })
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn protocol(&self) -> Protocol {
        self.options.protocol
    }

    pub fn supports_listing(&self) -> bool {
        self.options.list_path.is_some()
    }

    /// Send `file` as a multipart upload and return the identifier the store
    /// assigned to it.
    pub async fn upload(&self, file: LocalFile) -> ClientResult<UploadResult> {
        let path = self.options.upload_path.clone();
        let url = self.endpoint(&path, None)?;
        let mime = mime_guess::from_path(&file.name).first_or_octet_stream();

        info!(
            filename = %file.name,
            size = file.bytes.len(),
            url = %url,
            "Uploading file"
        );

        let part = Part::bytes(file.bytes)
            .file_name(file.name.clone())
            .mime_str(mime.as_ref())
            .map_err(|source| ClientError::Transport {
                endpoint: path.clone(),
                source,
            })?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self.send(&path, self.http.post(url).multipart(form)).await?;
        let reply: UploadReply = decode(&path, response).await?;

        let content_id = reply
            .content_id()
            .ok_or_else(|| ClientError::Malformed {
                endpoint: path.clone(),
                reason: "response carries no content identifier".to_string(),
            })?
            .to_string();
        let filename = reply.filename().unwrap_or(&file.name).to_string();

        debug!(filename = %filename, content_id = %content_id, "Upload accepted");
        Ok(UploadResult { filename, content_id })
    }

    /// Every file the store knows about.
    pub async fn list_files(&self) -> ClientResult<Vec<FileEntry>> {
        let path = self
            .options
            .list_path
            .clone()
            .ok_or(ClientError::Unsupported("file listing"))?;
        let url = self.endpoint(&path, None)?;

        let response = self.send(&path, self.http.get(url)).await?;
        let reply: ListReply = decode(&path, response).await?;
        let files = reply.into_entries();

        debug!(count = files.len(), "Fetched file listing");
        Ok(files)
    }

    /// Ask the store whether it holds `content_id`. A 404 answer counts as
    /// "not found" rather than an error.
    pub async fn lookup(&self, content_id: &str) -> ClientResult<LookupResult> {
        let path = self
            .options
            .lookup_path
            .clone()
            .ok_or(ClientError::Unsupported("lookup by identifier"))?;
        let url = self.endpoint(&path, Some(content_id))?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: path.clone(),
                source,
            })?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(LookupResult::missing());
        }
        let response = check_status(&path, response)?;
        let reply: LookupReply = decode(&path, response).await?;

        if reply.found {
            Ok(LookupResult::found(reply.filename()))
        } else {
            Ok(LookupResult::missing())
        }
    }

    /// URL the store serves the bytes of `content_id` from.
    pub fn download_url(&self, content_id: &str) -> ClientResult<Url> {
        self.endpoint(&self.options.download_path, Some(content_id))
    }

    /// Stream the body at `url` into `out_dir`. The file is named after the
    /// `Content-Disposition` header when present, otherwise `fallback_name`.
    ///
    /// The body lands in a temporary file first and only gets its name once
    /// complete. An existing file is never replaced; a numbered name such as
    /// `notes-1.txt` is used instead.
    pub async fn download_to(
        &self,
        url: &Url,
        out_dir: &Path,
        fallback_name: &str,
    ) -> ClientResult<PathBuf> {
        let endpoint = url.path().to_string();
        let response = self.send(&endpoint, self.http.get(url.clone())).await?;

        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(attachment_filename)
            .map(|name| safe_filename(&name))
            .unwrap_or_else(|| safe_filename(fallback_name));

        tokio::fs::create_dir_all(out_dir)
            .await
            .map_err(|source| ClientError::Io {
                path: out_dir.to_path_buf(),
                source,
            })?;

        let tmp = temp_path(&out_dir.join(&filename));
        let saved = async {
            let written = stream_to_file(&endpoint, response, &tmp).await?;
            let target = claim_name(&tmp, out_dir, &filename).await?;
            Ok::<_, ClientError>((target, written))
        }
        .await;
        // Once linked (or on failure) the temporary name is no longer needed.
        let _ = tokio::fs::remove_file(&tmp).await;

        let (target, written) = saved?;
        info!(path = %target.display(), bytes = written, "Download saved");
        Ok(target)
    }

    fn endpoint(&self, path: &str, content_id: Option<&str>) -> ClientResult<Url> {
        let mut url = self.options.base_url.clone();
        let joined = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url.set_path(&joined);

        if let Some(id) = content_id {
            url.path_segments_mut()
                .map_err(|_| ClientError::InvalidUrl(self.options.base_url.to_string()))?
                .pop_if_empty()
                .push(id);
        }
        Ok(url)
    }

    async fn send(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> ClientResult<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;
        check_status(endpoint, response)
    }
}

fn check_status(endpoint: &str, response: reqwest::Response) -> ClientResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ClientError::Status {
            endpoint: endpoint.to_string(),
            status,
        })
    }
}

async fn decode<T: DeserializeOwned>(endpoint: &str, response: reqwest::Response) -> ClientResult<T> {
    let body = response
        .bytes()
        .await
        .map_err(|source| ClientError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;
    serde_json::from_slice(&body).map_err(|e| ClientError::Malformed {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })
}

async fn stream_to_file(
    endpoint: &str,
    response: reqwest::Response,
    path: &Path,
) -> ClientResult<usize> {
    let io_error = |source| ClientError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::File::create(path).await.map_err(io_error)?;
    let mut stream = response.bytes_stream();
    let mut written = 0usize;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| ClientError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;
        file.write_all(&chunk).await.map_err(io_error)?;
        written += chunk.len();
    }
    file.flush().await.map_err(io_error)?;
    Ok(written)
}

/// Link the finished download at `tmp` to the first free name in `out_dir`.
async fn claim_name(tmp: &Path, out_dir: &Path, filename: &str) -> ClientResult<PathBuf> {
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let target = out_dir.join(numbered_name(filename, attempt));
        let linked = link_new(tmp, &target)
            .await
            .map_err(|source| ClientError::Io {
                path: target.clone(),
                source,
            })?;
        if linked {
            return Ok(target);
        }
        debug!(path = %target.display(), "Download target exists, trying another name");
    }

    Err(ClientError::Io {
        path: out_dir.join(filename),
        source: std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "no free file name for download",
        ),
    })
}

/// `report.pdf` -> `report-2.pdf`; attempt 0 keeps the name as is.
fn numbered_name(filename: &str, attempt: usize) -> String {
    if attempt == 0 {
        return filename.to_string();
    }
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{attempt}.{ext}"),
        _ => format!("{filename}-{attempt}"),
    }
}

/// Pull the file name out of a `Content-Disposition` value, preferring the
/// RFC 5987 `filename*` form over plain `filename`.
fn attachment_filename(header: &str) -> Option<String> {
    let params: Vec<&str> = header.split(';').map(str::trim).collect();

    let extended = params.iter().find_map(|param| {
        let value = param.strip_prefix("filename*=")?;
        let mut parts = value.trim().trim_matches('"').splitn(3, '\'');
        let charset = parts.next()?;
        let _language = parts.next()?;
        let encoded = parts.next()?;
        if !charset.eq_ignore_ascii_case("utf-8") {
            return None;
        }
        let decoded = percent_decode_str(encoded).decode_utf8().ok()?;
        (!decoded.is_empty()).then(|| decoded.into_owned())
    });

    extended.or_else(|| {
        params.iter().find_map(|param| {
            let value = param.strip_prefix("filename=")?;
            let value = value.trim().trim_matches('"');
            (!value.is_empty()).then(|| value.to_string())
        })
    })
}

/// Reduce a store supplied name to a single safe path component.
fn safe_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "download".to_string()
    } else {
        cleaned
    }
}
