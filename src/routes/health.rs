use axum::{routing::get, extract::State, Json, Router};
use crate::models::{AppState, HealthResponse};
use crate::types::AppResult;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health_check))
        .with_state(state)
}

async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "dstore content node",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "/api/upload",
            "files": "/api/files",
            "find": "/api/find/{hash}",
            "download": "/api/download/{hash}",
            "cidUpload": "/upload",
            "cidDownload": "/download/{cid}",
            "health": "/api/health"
        }
    }))
}

async fn health_check(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    let files = state.store.list().await?.len();

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        files,
    }))
}
