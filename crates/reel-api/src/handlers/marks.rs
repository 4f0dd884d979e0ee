//! Mark/unmark endpoints for retention protection.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MarkResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct IsMarkedResponse {
    #[serde(rename = "isMarked")]
    pub is_marked: bool,
}

/// POST /api/mark/:id — protect a job's files from retention.
pub async fn mark(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MarkResponse>> {
    let success = state
        .marks
        .mark(&id)
        .await
        .map_err(|e| ApiError::internal(format!("Mark failed: {}", e)))?;
    info!(job_id = %id, success, "Mark requested");
    Ok(Json(MarkResponse { success }))
}

/// POST /api/unmark/:id — lift retention protection.
pub async fn unmark(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MarkResponse>> {
    let success = state
        .marks
        .unmark(&id)
        .await
        .map_err(|e| ApiError::internal(format!("Unmark failed: {}", e)))?;
    info!(job_id = %id, success, "Unmark requested");
    Ok(Json(MarkResponse { success }))
}

/// GET /api/is-marked/:id
pub async fn is_marked(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<IsMarkedResponse> {
    Json(IsMarkedResponse {
        is_marked: state.marks.is_marked(&id).await,
    })
}
