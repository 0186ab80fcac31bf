pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::any, Router};
use utoipa::OpenApi;

pub use config::AppConfig;
pub use services::file::{FileStore, PostgresFileStore};

use crate::middleware::AuthSecret;

#[derive(Clone)]
pub struct AppState {
    /// Persistence gateway shared by all requests
    pub file_store: Arc<dyn FileStore>,
    /// Application configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(file_store: Arc<dyn FileStore>, config: Arc<AppConfig>) -> Self {
        Self { file_store, config }
    }
}

/// Builds the complete service: `/add`, a `404` fallback, and the
/// interceptor chain around both.
pub fn create_router(state: AppState) -> Router {
    let secret = AuthSecret::new(&state.config.auth.secret);
    let body_limit = handlers::file::body_limit(state.config.upload.max_file_bytes);

    let routes = Router::new()
        .route(
            "/add",
            any(handlers::file::upload_file).layer(DefaultBodyLimit::max(body_limit)),
        )
        .fallback(handlers::not_found)
        .with_state(state);

    middleware::apply(routes, secret)
}

#[derive(OpenApi)]
#[openapi(
    paths(handlers::file::upload_file),
    tags(
        (name = "file", description = "File upload API")
    )
)]
pub struct ApiDoc;
