//! Node HTTP routes
//!
//! The reference node answers both store protocols over one content store:
//! - `/api/upload`, `/api/files`, `/api/find/{hash}`, `/api/download/{hash}` - hash protocol
//! - `/upload`, `/download/{cid}` - CID protocol
//! - `/api/health` and `/` - health check and endpoint index

pub mod cid;
pub mod files;
pub mod health;

use axum::{
    extract::{DefaultBodyLimit, Multipart},
    http::header,
    response::{IntoResponse, Response},
    Router,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::client::UPLOAD_FIELD;
use crate::middleware;
use crate::models::AppState;
use crate::storage::Manifest;
use crate::types::{AppError, AppResult};

/// RFC 5987 `attr-char`s are sent as is; everything else is percent-encoded.
const FILENAME_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// Create the node router with CORS, tracing and the upload size limit applied.
pub fn create_router(state: AppState) -> Router {
    info!("Creating node router");

    let body_limit = state.config.store.max_upload_bytes;
    let cors = middleware::cors_layer(&state.config.server.cors_allowed_origins);

    Router::new()
        .merge(files::router(state.clone()))
        .merge(cid::router(state.clone()))
        .merge(health::router(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
}

/// Pull the uploaded file out of a multipart body. Other fields are ignored.
pub(crate) async fn read_upload(mut multipart: Multipart) -> AppResult<(String, Vec<u8>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("Failed to parse multipart data: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!(field = ?field.name(), "Ignoring multipart field");
            continue;
        }

        let filename = field.file_name().unwrap_or("upload.bin").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidRequest(format!("Failed to read uploaded file: {e}")))?;
        return Ok((filename, data.to_vec()));
    }

    Err(AppError::InvalidRequest(format!(
        "multipart field '{UPLOAD_FIELD}' is required"
    )))
}

/// Serve reassembled file bytes as an attachment.
pub(crate) fn file_response(manifest: &Manifest, data: Vec<u8>) -> Response {
    let mime = mime_guess::from_path(&manifest.original_name).first_or_octet_stream();
    let disposition = content_disposition(&manifest.original_name);

    (
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    )
        .into_response()
}

/// Attachment header with an ASCII `filename` and the exact name as `filename*`.
fn content_disposition(name: &str) -> String {
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        header_safe(name),
        utf8_percent_encode(name, FILENAME_ENCODE)
    )
}

fn header_safe(name: &str) -> String {
    name.chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
