// dstore - client portal and reference node for a content-addressed file store

pub mod client;
pub mod config;
pub mod middleware;
pub mod models;
pub mod portal;
pub mod routes;
pub mod storage;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use client::{ClientOptions, Protocol, StoreClient};
pub use config::Config;
pub use models::AppState;
pub use portal::Portal;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
