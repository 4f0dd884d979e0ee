//! Axum HTTP surface for the reelforge backend.
//!
//! The binary in `main.rs` composes the whole application: job
//! store, asset cache, oracle router, worker pool, retention sweeps
//! and this router, all owned by a single [`AppState`].

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
