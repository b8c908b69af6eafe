use axum::{
    extract::{Multipart, Path, State},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::info;

use crate::models::{AppState, FileEntry};
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/upload", post(upload_file))
        .route("/api/files", get(list_files))
        .route("/api/find/{hash}", get(find_file))
        .route("/api/download/{hash}", get(download_file))
        .with_state(state)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    status: &'static str,
    message: &'static str,
    file_id: String,
    filename: String,
    hash: String,
    chunks: usize,
}

#[derive(Debug, Serialize)]
struct FindResponse {
    found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

async fn upload_file(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let (filename, data) = super::read_upload(multipart).await?;
    info!(filename = %filename, size = data.len(), "File upload request received");

    let manifest = state.store.put(&filename, &data).await?;

    Ok(Json(UploadResponse {
        status: "success",
        message: "File uploaded successfully",
        file_id: manifest.file_id.clone(),
        filename: manifest.original_name,
        hash: manifest.file_id,
        chunks: manifest.total_chunks,
    }))
}

async fn list_files(State(state): State<AppState>) -> AppResult<Json<Vec<FileEntry>>> {
    let files = state
        .store
        .list()
        .await?
        .iter()
        .map(|manifest| manifest.entry())
        .collect();
    Ok(Json(files))
}

async fn find_file(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> AppResult<Json<FindResponse>> {
    let response = match state.store.find(&hash).await? {
        Some(manifest) => FindResponse {
            found: true,
            filename: Some(manifest.original_name),
            hash: Some(manifest.file_id),
            message: None,
        },
        None => FindResponse {
            found: false,
            filename: None,
            hash: None,
            message: Some("File not found"),
        },
    };
    Ok(Json(response))
}

async fn download_file(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> AppResult<Response> {
    let (manifest, data) = state
        .store
        .get(&hash)
        .await?
        .ok_or_else(|| AppError::NotFound(hash.clone()))?;

    info!(file_id = %manifest.file_id, size = data.len(), "Serving download");
    Ok(super::file_response(&manifest, data))
}
