//! API routes.

use std::path::Path;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::handlers::{generate, get_status, is_marked, list_jobs, mark, unmark};
use crate::state::AppState;

/// Directories exposed as static file roots.
pub struct StaticRoots<'a> {
    pub assets: &'a Path,
    pub output: &'a Path,
    pub cache: &'a Path,
}

/// Create the API router. The API is mounted at both `/api` and
/// `/api/v1` for client compatibility.
pub fn create_router(state: AppState, roots: StaticRoots<'_>) -> Router {
    let api_routes = Router::new()
        .route("/generate", post(generate))
        .route("/status/:id", get(get_status))
        .route("/jobs", get(list_jobs))
        .route("/mark/:id", post(mark))
        .route("/unmark/:id", post(unmark))
        .route("/is-marked/:id", get(is_marked));

    Router::new()
        .nest("/api", api_routes.clone())
        .nest("/api/v1", api_routes)
        .nest_service("/assets", ServeDir::new(roots.assets))
        .nest_service("/output", ServeDir::new(roots.output))
        .nest_service("/cache", ServeDir::new(roots.cache))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
