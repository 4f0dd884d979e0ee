//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    /// Oracle returned a non-retryable HTTP failure or retries ran out.
    #[error("Oracle failed: {0}")]
    OracleFatal(String),

    /// Oracle response was not a valid script.
    #[error("Oracle response parse failed: {0}")]
    ParseError(String),

    /// A quality gate rejected a stage output.
    #[error("{stage} gate rejected: {errors:?}")]
    GateReject { stage: &'static str, errors: Vec<String> },

    /// Layered asset fallbacks ran dry.
    #[error("Asset shortage: {0}")]
    AssetShortage(String),

    /// FFmpeg failed; carries the classified kind.
    #[error("Render failed ({kind}): {message}")]
    RenderFailure {
        kind: reel_media::RenderErrorKind,
        message: String,
        stderr: Option<String>,
    },

    /// Final auditor issued NO-GO.
    #[error("Audit NO-GO: {0}")]
    AuditNoGo(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Queue error: {0}")]
    Queue(#[from] reel_queue::QueueError),

    #[error("Asset error: {0}")]
    Asset(#[from] reel_assets::AssetError),

    #[error("Media error: {0}")]
    Media(#[from] reel_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn oracle_fatal(msg: impl Into<String>) -> Self {
        Self::OracleFatal(msg.into())
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    pub fn gate_reject(stage: &'static str, errors: Vec<String>) -> Self {
        Self::GateReject { stage, errors }
    }

    pub fn asset_shortage(msg: impl Into<String>) -> Self {
        Self::AssetShortage(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Wrap a media error as a classified render failure.
    pub fn render_failure(err: reel_media::MediaError) -> Self {
        let kind = err.render_kind();
        let stderr = match &err {
            reel_media::MediaError::FfmpegFailed { stderr, .. } => stderr.clone(),
            _ => None,
        };
        Self::RenderFailure {
            kind,
            message: err.to_string(),
            stderr,
        }
    }

    /// Error-type label surfaced in `job.result.error_type`.
    pub fn error_type(&self) -> &'static str {
        match self {
            WorkerError::OracleFatal(_) => "ORACLE_FATAL",
            WorkerError::ParseError(_) => "PARSE_ERROR",
            WorkerError::GateReject { .. } => "GATE_REJECT",
            WorkerError::AssetShortage(_) => "ASSET_SHORTAGE",
            WorkerError::RenderFailure { kind, .. } => kind.as_str(),
            WorkerError::AuditNoGo(_) => "AUDIT_NOGO",
            WorkerError::ConfigError(_) => "CONFIG_ERROR",
            WorkerError::Queue(_) => "QUEUE_ERROR",
            WorkerError::Asset(_) => "ASSET_ERROR",
            WorkerError::Media(_) => "RENDER_FAILURE",
            WorkerError::Io(_) => "IO_ERROR",
        }
    }
}
