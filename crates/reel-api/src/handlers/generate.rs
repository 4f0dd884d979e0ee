//! POST /api/generate

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use reel_models::{JobRequest, Tone};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const MAX_TOPIC_CHARS: usize = 200;
const MIN_DURATION_SECS: i64 = 20;
const MAX_DURATION_SECS: i64 = 60;

/// Raw request body; everything optional so validation owns the
/// error messages instead of serde.
#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    duration_seconds: Option<serde_json::Value>,
    #[serde(default)]
    tone: Option<String>,
    #[serde(default)]
    dry_run: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub job_id: String,
    pub status: String,
}

fn validate(body: GenerateBody) -> Result<JobRequest, ApiError> {
    let topic = body
        .topic
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::validation("Topic must be a non-empty string"))?
        .to_string();
    if topic.chars().count() > MAX_TOPIC_CHARS {
        return Err(ApiError::validation(format!(
            "Topic must be at most {} characters",
            MAX_TOPIC_CHARS
        )));
    }

    let duration = body
        .duration_seconds
        .as_ref()
        .and_then(|v| v.as_i64())
        .ok_or_else(|| ApiError::validation("Duration must be between 20 and 60 seconds"))?;
    if !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&duration) {
        return Err(ApiError::validation(
            "Duration must be between 20 and 60 seconds",
        ));
    }

    let tone: Tone = body
        .tone
        .as_deref()
        .unwrap_or("informative")
        .parse()
        .map_err(|_| {
            ApiError::validation("Tone must be one of informative, dramatic, motivational, neutral")
        })?;

    Ok(JobRequest {
        topic,
        duration_seconds: duration as u32,
        tone,
        dry_run: body.dry_run.unwrap_or(false),
    })
}

/// Validate the request and enqueue a job; 202 with its ID.
pub async fn generate(
    State(state): State<AppState>,
    Json(body): Json<GenerateBody>,
) -> ApiResult<(StatusCode, Json<GenerateResponse>)> {
    let request = validate(body)?;
    info!(topic = %request.topic, duration = request.duration_seconds, "Generate requested");

    let job_id = state.store.create(request).await;
    Ok((
        StatusCode::ACCEPTED,
        Json(GenerateResponse {
            job_id: job_id.to_string(),
            status: "queued".to_string(),
        }),
    ))
}
