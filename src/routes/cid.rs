use axum::{
    extract::{Multipart, Path, State},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::info;

use crate::models::AppState;
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/upload", post(upload))
        .route("/download/{cid}", get(download))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct CidUploadResponse {
    filename: String,
    cid: String,
}

async fn upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<CidUploadResponse>> {
    let (filename, data) = super::read_upload(multipart).await?;
    let manifest = state.store.put(&filename, &data).await?;

    info!(cid = %manifest.file_id, filename = %manifest.original_name, "Stored upload");
    Ok(Json(CidUploadResponse {
        filename: manifest.original_name,
        cid: manifest.file_id,
    }))
}

async fn download(State(state): State<AppState>, Path(cid): Path<String>) -> AppResult<Response> {
    let (manifest, data) = state
        .store
        .get(&cid)
        .await?
        .ok_or_else(|| AppError::NotFound(cid.clone()))?;
    Ok(super::file_response(&manifest, data))
}
