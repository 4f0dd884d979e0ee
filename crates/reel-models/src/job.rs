//! Job definitions and the job state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Voice tone requested for a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Informative,
    Dramatic,
    Motivational,
    Neutral,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Informative => "informative",
            Tone::Dramatic => "dramatic",
            Tone::Motivational => "motivational",
            Tone::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Error)]
#[error("Invalid tone: {0}")]
pub struct ToneParseError(pub String);

impl FromStr for Tone {
    type Err = ToneParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "informative" => Ok(Tone::Informative),
            "dramatic" => Ok(Tone::Dramatic),
            "motivational" => Ok(Tone::Motivational),
            "neutral" => Ok(Tone::Neutral),
            other => Err(ToneParseError(other.to_string())),
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Job processing status.
///
/// `Queued` and `Processing` are the coarse states; the stage
/// sub-statuses between `Processing` and the terminals are
/// informational for polling clients. Only the worker that owns a
/// job transitions its status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting in the FIFO for a worker slot
    #[default]
    Queued,
    /// Picked up by a worker
    Processing,
    /// Script generation in flight
    Scripting,
    /// Per-scene audio synthesis
    AudioGen,
    /// Caption grouping
    CaptionGen,
    /// Visual timeline construction
    VisualGen,
    /// Edit plan construction
    Editing,
    /// Edit plans validated, segment renders pending
    EditReady,
    /// Concatenating rendered scene segments
    Merging,
    /// Final quality audit
    Auditing,
    /// Job finished successfully
    Completed,
    /// Job failed
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Scripting => "scripting",
            JobStatus::AudioGen => "audio_gen",
            JobStatus::CaptionGen => "caption_gen",
            JobStatus::VisualGen => "visual_gen",
            JobStatus::Editing => "editing",
            JobStatus::EditReady => "edit_ready",
            JobStatus::Merging => "merging",
            JobStatus::Auditing => "auditing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated video generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    /// Video topic (1-200 chars)
    pub topic: String,
    /// Target duration in seconds (20-60)
    pub duration_seconds: u32,
    /// Voice tone
    pub tone: Tone,
    /// Stop after the validated script (no audio/visual pipeline)
    #[serde(default)]
    pub dry_run: bool,
}

/// Terminal payload attached to a job on completion or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOutcome {
    /// Path to the final MP4 (on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    /// Validated script (always present once scripting succeeded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<crate::Script>,
    /// Aggregated pipeline metadata (scene durations, clip counts, audit verdict)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    /// Error message (on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Classified error type (on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Stage diagnostics collected before the failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<serde_json::Value>,
    /// When the outcome was recorded
    pub timestamp: DateTime<Utc>,
}

impl JobOutcome {
    /// Build a success outcome.
    pub fn success(output_path: impl Into<String>) -> Self {
        Self {
            output_path: Some(output_path.into()),
            script: None,
            metadata: None,
            error: None,
            error_type: None,
            diagnostics: None,
            timestamp: Utc::now(),
        }
    }

    /// Build a dry-run outcome carrying only the validated script.
    pub fn script_only(script: crate::Script) -> Self {
        Self {
            output_path: None,
            script: Some(script),
            metadata: None,
            error: None,
            error_type: None,
            diagnostics: None,
            timestamp: Utc::now(),
        }
    }

    /// Build a failure outcome.
    pub fn failure(error: impl Into<String>, error_type: impl Into<String>) -> Self {
        Self {
            output_path: None,
            script: None,
            metadata: None,
            error: Some(error.into()),
            error_type: Some(error_type.into()),
            diagnostics: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_script(mut self, script: crate::Script) -> Self {
        self.script = Some(script);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: serde_json::Value) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }
}

/// A video generation job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job ID
    pub id: JobId,

    /// The validated request that created this job
    pub request: JobRequest,

    /// Current status
    #[serde(default)]
    pub status: JobStatus,

    /// Progress (0-100)
    #[serde(default)]
    pub progress: u8,

    /// Estimated seconds remaining
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_seconds: Option<u64>,

    /// Latest human-readable progress message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Terminal payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobOutcome>,
}

impl Job {
    /// Create a new queued job from a validated request.
    pub fn new(request: JobRequest) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            request,
            status: JobStatus::Queued,
            progress: 0,
            eta_seconds: None,
            message: None,
            created_at: now,
            updated_at: now,
            result: None,
        }
    }

    /// Set the status and bump the updated_at timestamp.
    pub fn set_status(&mut self, status: JobStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Update progress (clamped to 100).
    pub fn set_progress(&mut self, progress: u8) {
        self.progress = progress.min(100);
        self.updated_at = Utc::now();
    }

    /// Mark the job completed with its outcome.
    pub fn complete(&mut self, outcome: JobOutcome) {
        self.status = JobStatus::Completed;
        self.progress = 100;
        self.eta_seconds = Some(0);
        self.result = Some(outcome);
        self.updated_at = Utc::now();
    }

    /// Mark the job failed with its outcome.
    pub fn fail(&mut self, outcome: JobOutcome) {
        self.status = JobStatus::Failed;
        self.result = Some(outcome);
        self.updated_at = Utc::now();
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> JobRequest {
        JobRequest {
            topic: "The Science of Caffeine".to_string(),
            duration_seconds: 30,
            tone: Tone::Informative,
            dry_run: false,
        }
    }

    #[test]
    fn test_job_creation() {
        let job = Job::new(request());
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.progress, 0);
        assert!(!job.is_terminal());
    }

    #[test]
    fn test_job_transitions() {
        let mut job = Job::new(request());

        job.set_status(JobStatus::Processing);
        assert_eq!(job.status, JobStatus::Processing);

        job.set_progress(150);
        assert_eq!(job.progress, 100);

        job.complete(JobOutcome::success("/output/final.mp4"));
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.is_terminal());
        assert_eq!(
            job.result.unwrap().output_path.as_deref(),
            Some("/output/final.mp4")
        );
    }

    #[test]
    fn test_job_failure_outcome() {
        let mut job = Job::new(request());
        job.fail(JobOutcome::failure("renderer exploded", "CODEC_FAILURE"));
        assert_eq!(job.status, JobStatus::Failed);
        let outcome = job.result.unwrap();
        assert_eq!(outcome.error_type.as_deref(), Some("CODEC_FAILURE"));
    }

    #[test]
    fn test_tone_parsing() {
        assert_eq!("dramatic".parse::<Tone>().unwrap(), Tone::Dramatic);
        assert!("sarcastic".parse::<Tone>().is_err());
    }

    #[test]
    fn test_status_serde_snake_case() {
        let json = serde_json::to_string(&JobStatus::AudioGen).unwrap();
        assert_eq!(json, "\"audio_gen\"");
    }
}
