//! Process-wide keyword -> asset cache with a used-ID set.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use reel_models::StockAsset;

struct CacheInner {
    /// Search results by lower-cased keyword
    by_keyword: HashMap<String, Vec<StockAsset>>,
    /// Asset IDs already placed on some timeline
    used_ids: HashSet<String>,
}

/// Shared asset cache.
///
/// Reads dominate (concurrent scene builders consulting search
/// results); mutations take the write lock. Uniqueness bookkeeping
/// for clip selection lives here so parallel scenes never hand out
/// the same asset twice unless reuse was explicitly enabled.
#[derive(Clone)]
pub struct AssetCache {
    inner: Arc<RwLock<CacheInner>>,
}

impl Default for AssetCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner {
                by_keyword: HashMap::new(),
                used_ids: HashSet::new(),
            })),
        }
    }

    /// Store search results for a keyword (lower-cased key).
    pub async fn insert(&self, keyword: &str, assets: Vec<StockAsset>) {
        let key = keyword.to_lowercase();
        debug!(keyword = %key, count = assets.len(), "Caching search results");
        self.inner.write().await.by_keyword.insert(key, assets);
    }

    /// Cached assets for a keyword, if previously searched.
    pub async fn get(&self, keyword: &str) -> Option<Vec<StockAsset>> {
        self.inner
            .read()
            .await
            .by_keyword
            .get(&keyword.to_lowercase())
            .cloned()
    }

    pub async fn contains_keyword(&self, keyword: &str) -> bool {
        self.inner
            .read()
            .await
            .by_keyword
            .contains_key(&keyword.to_lowercase())
    }

    /// Every cached asset across all keywords, deduplicated by ID.
    pub async fn all_assets(&self) -> Vec<StockAsset> {
        let inner = self.inner.read().await;
        let mut seen = HashSet::new();
        let mut assets = Vec::new();
        for list in inner.by_keyword.values() {
            for asset in list {
                if seen.insert(asset.id.clone()) {
                    assets.push(asset.clone());
                }
            }
        }
        assets
    }

    /// Count of cached assets not yet placed on any timeline.
    pub async fn unused_count(&self) -> usize {
        let inner = self.inner.read().await;
        let mut seen = HashSet::new();
        let mut count = 0;
        for list in inner.by_keyword.values() {
            for asset in list {
                if seen.insert(asset.id.clone()) && !inner.used_ids.contains(&asset.id) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Atomically claim an asset ID as used. Returns false if it was
    /// already claimed by another scene.
    pub async fn try_claim(&self, asset_id: &str) -> bool {
        self.inner
            .write()
            .await
            .used_ids
            .insert(asset_id.to_string())
    }

    pub async fn is_used(&self, asset_id: &str) -> bool {
        self.inner.read().await.used_ids.contains(asset_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(id: &str) -> StockAsset {
        StockAsset {
            id: id.to_string(),
            provider: "mock".to_string(),
            url: None,
            width: 1080,
            height: 1920,
            reused: false,
        }
    }

    #[tokio::test]
    async fn test_keyword_is_case_insensitive() {
        let cache = AssetCache::new();
        cache.insert("Coffee", vec![asset("a")]).await;
        assert!(cache.get("coffee").await.is_some());
        assert!(cache.contains_keyword("COFFEE").await);
    }

    #[tokio::test]
    async fn test_claim_is_exclusive() {
        let cache = AssetCache::new();
        cache.insert("coffee", vec![asset("a")]).await;

        assert!(cache.try_claim("a").await);
        assert!(!cache.try_claim("a").await);
        assert!(cache.is_used("a").await);
    }

    #[tokio::test]
    async fn test_unused_count_dedupes_across_keywords() {
        let cache = AssetCache::new();
        cache.insert("coffee", vec![asset("a"), asset("b")]).await;
        cache.insert("beans", vec![asset("b"), asset("c")]).await;

        assert_eq!(cache.unused_count().await, 3);
        cache.try_claim("b").await;
        assert_eq!(cache.unused_count().await, 2);
    }
}
