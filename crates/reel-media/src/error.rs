//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Classified render failure cause, derived from FFmpeg stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderErrorKind {
    AssetMissing,
    TimingMismatch,
    CodecFailure,
    ResourceExhaustion,
    Unknown,
}

impl RenderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderErrorKind::AssetMissing => "ASSET_MISSING",
            RenderErrorKind::TimingMismatch => "TIMING_MISMATCH",
            RenderErrorKind::CodecFailure => "CODEC_FAILURE",
            RenderErrorKind::ResourceExhaustion => "RESOURCE_EXHAUSTION",
            RenderErrorKind::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Classify an FFmpeg error message by substring match.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("no such file")
            || lower.contains("does not exist")
            || lower.contains("could not open")
            || lower.contains("invalid data found when processing input")
        {
            RenderErrorKind::AssetMissing
        } else if lower.contains("invalid duration")
            || lower.contains("timestamp")
            || lower.contains("non-monotonic")
            || lower.contains("pts")
        {
            RenderErrorKind::TimingMismatch
        } else if lower.contains("codec")
            || lower.contains("encoder")
            || lower.contains("decoder")
            || lower.contains("unknown format")
        {
            RenderErrorKind::CodecFailure
        } else if lower.contains("cannot allocate")
            || lower.contains("out of memory")
            || lower.contains("no space left")
            || lower.contains("resource temporarily unavailable")
        {
            RenderErrorKind::ResourceExhaustion
        } else {
            RenderErrorKind::Unknown
        }
    }
}

impl std::fmt::Display for RenderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Render produced no usable output: {0}")]
    OutputRejected(PathBuf),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("WAV write failed: {0}")]
    WavWrite(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Classify this error for job diagnostics.
    pub fn render_kind(&self) -> RenderErrorKind {
        match self {
            MediaError::FfmpegFailed { message, stderr, .. } => {
                let combined = match stderr {
                    Some(s) => format!("{} {}", message, s),
                    None => message.clone(),
                };
                RenderErrorKind::classify(&combined)
            }
            MediaError::FileNotFound(_) | MediaError::FfmpegNotFound => {
                RenderErrorKind::AssetMissing
            }
            MediaError::OutputRejected(_) => RenderErrorKind::CodecFailure,
            MediaError::Io(_) | MediaError::WavWrite(_) => RenderErrorKind::ResourceExhaustion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_asset_missing() {
        assert_eq!(
            RenderErrorKind::classify("clips/abc.mp4: No such file or directory"),
            RenderErrorKind::AssetMissing
        );
    }

    #[test]
    fn test_classify_timing() {
        assert_eq!(
            RenderErrorKind::classify("Non-monotonic DTS in output stream"),
            RenderErrorKind::TimingMismatch
        );
    }

    #[test]
    fn test_classify_codec() {
        assert_eq!(
            RenderErrorKind::classify("Unknown encoder 'libx265'"),
            RenderErrorKind::CodecFailure
        );
    }

    #[test]
    fn test_classify_resources() {
        assert_eq!(
            RenderErrorKind::classify("Cannot allocate memory"),
            RenderErrorKind::ResourceExhaustion
        );
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(
            RenderErrorKind::classify("something entirely new"),
            RenderErrorKind::Unknown
        );
    }

    #[test]
    fn test_error_kind_from_ffmpeg_failure() {
        let err = MediaError::ffmpeg_failed(
            "FFmpeg exited with non-zero status",
            Some("x.mp4: No such file or directory".to_string()),
            Some(1),
        );
        assert_eq!(err.render_kind(), RenderErrorKind::AssetMissing);
    }
}
