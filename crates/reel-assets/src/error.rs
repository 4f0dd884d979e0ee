//! Asset error types.

use thiserror::Error;

pub type AssetResult<T> = Result<T, AssetError>;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Provider request failed: {0}")]
    ProviderFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Asset supply exhausted for keyword set: {0}")]
    SupplyExhausted(String),

    #[error("Marks file corrupt: {0}")]
    MarksCorrupt(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AssetError {
    pub fn provider_failed(msg: impl Into<String>) -> Self {
        Self::ProviderFailed(msg.into())
    }

    pub fn download_failed(msg: impl Into<String>) -> Self {
        Self::DownloadFailed(msg.into())
    }
}
