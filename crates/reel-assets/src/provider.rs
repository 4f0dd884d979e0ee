//! Stock footage provider adapters.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use reel_models::StockAsset;

use crate::error::{AssetError, AssetResult};

/// Broad keywords used when an exact keyword yields nothing.
const FALLBACK_KEYWORDS: [&str; 4] = ["city", "nature", "abstract", "technology"];

/// Capability interface over a stock footage source.
#[async_trait]
pub trait StockProvider: Send + Sync {
    /// Provider name recorded on assets.
    fn name(&self) -> &'static str;

    /// Search portrait-oriented footage for a keyword.
    async fn search(&self, keyword: &str) -> AssetResult<Vec<StockAsset>>;

    /// Generic assets usable when keyword search comes up empty.
    async fn fallbacks(&self) -> AssetResult<Vec<StockAsset>> {
        let mut assets = Vec::new();
        for keyword in FALLBACK_KEYWORDS {
            match self.search(keyword).await {
                Ok(found) => assets.extend(found),
                Err(e) => warn!(keyword, "Fallback search failed: {}", e),
            }
        }
        Ok(assets)
    }
}

// ============================================================================
// Pexels
// ============================================================================

#[derive(Debug, Deserialize)]
struct PexelsSearchResponse {
    videos: Vec<PexelsVideo>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideo {
    id: u64,
    width: u32,
    height: u32,
    video_files: Vec<PexelsVideoFile>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideoFile {
    link: String,
    width: Option<u32>,
    height: Option<u32>,
}

/// Pexels video search client.
pub struct PexelsProvider {
    api_key: String,
    client: reqwest::Client,
    per_page: u32,
}

impl PexelsProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: reqwest::Client::new(),
            per_page: 10,
        }
    }

    /// Create from `PEXELS_API_KEY`, if set.
    pub fn from_env() -> Option<Self> {
        std::env::var("PEXELS_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(Self::new)
    }
}

#[async_trait]
impl StockProvider for PexelsProvider {
    fn name(&self) -> &'static str {
        "pexels"
    }

    async fn search(&self, keyword: &str) -> AssetResult<Vec<StockAsset>> {
        let url = format!(
            "https://api.pexels.com/videos/search?query={}&orientation=portrait&per_page={}",
            urlencode(keyword),
            self.per_page
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AssetError::provider_failed(format!(
                "Pexels returned {} for '{}'",
                response.status(),
                keyword
            )));
        }

        let parsed: PexelsSearchResponse = response.json().await?;
        let assets: Vec<StockAsset> = parsed
            .videos
            .into_iter()
            .filter_map(|video| {
                // Prefer the largest portrait rendition.
                let file = video
                    .video_files
                    .into_iter()
                    .max_by_key(|f| f.width.unwrap_or(0).min(f.height.unwrap_or(0)))?;
                Some(StockAsset {
                    id: format!("pexels_{}", video.id),
                    provider: "pexels".to_string(),
                    url: Some(file.link),
                    width: video.width,
                    height: video.height,
                    reused: false,
                })
            })
            .collect();

        debug!(keyword, count = assets.len(), "Pexels search complete");
        Ok(assets)
    }
}

fn urlencode(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            ' ' => "+".to_string(),
            c if c.is_ascii_alphanumeric() || "-_.~".contains(c) => c.to_string(),
            c => {
                let mut buf = [0u8; 4];
                c.encode_utf8(&mut buf)
                    .bytes()
                    .map(|b| format!("%{:02X}", b))
                    .collect()
            }
        })
        .collect()
}

// ============================================================================
// Mock
// ============================================================================

/// Deterministic offline provider backed by placeholder files.
pub struct MockProvider {
    per_keyword: usize,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(5)
    }
}

impl MockProvider {
    pub fn new(per_keyword: usize) -> Self {
        Self { per_keyword }
    }
}

#[async_trait]
impl StockProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn search(&self, keyword: &str) -> AssetResult<Vec<StockAsset>> {
        let slug: String = keyword
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        Ok((0..self.per_keyword)
            .map(|n| StockAsset {
                id: format!("mock_{}_{}", slug, n),
                provider: "mock".to_string(),
                url: None,
                width: 1080,
                height: 1920,
                reused: false,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_is_deterministic() {
        let provider = MockProvider::new(3);
        let first = provider.search("coffee beans").await.unwrap();
        let second = provider.search("coffee beans").await.unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(first[0].id, "mock_coffee_beans_0");
        assert_eq!(
            first.iter().map(|a| &a.id).collect::<Vec<_>>(),
            second.iter().map(|a| &a.id).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_mock_fallbacks_cover_generic_keywords() {
        let provider = MockProvider::new(2);
        let fallbacks = provider.fallbacks().await.unwrap();
        assert_eq!(fallbacks.len(), 8);
        assert!(fallbacks.iter().any(|a| a.id.starts_with("mock_city")));
    }

    #[test]
    fn test_urlencode() {
        assert_eq!(urlencode("coffee beans"), "coffee+beans");
        assert_eq!(urlencode("a/b"), "a%2Fb");
    }
}
