//! Job polling endpoints.

use axum::extract::{Path, State};
use axum::Json;

use reel_models::{Job, JobId};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /api/status/:id — the full job record.
pub async fn get_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Job>> {
    let job = state
        .store
        .get(&JobId::from_string(id.clone()))
        .await
        .ok_or_else(|| ApiError::not_found(format!("Unknown job: {}", id)))?;
    Ok(Json(job))
}

/// GET /api/jobs — every job record, newest first.
pub async fn list_jobs(State(state): State<AppState>) -> Json<Vec<Job>> {
    Json(state.store.list().await)
}
