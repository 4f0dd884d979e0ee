//! Visual timeline construction: pacing, uniqueness, fallbacks.

use std::path::PathBuf;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::Rng;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use reel_assets::{ensure_local, AssetCache, StockProvider};
use reel_models::{Pan, StockAsset, Transform, VisualClip, Zoom, PANS};

use crate::error::{WorkerError, WorkerResult};
use crate::gate::GateReport;

/// Clip duration bounds on the timeline.
const MIN_CLIP_MS: u64 = 800;
const MAX_CLIP_MS: u64 = 3000;
/// Gap/overlap tolerance between neighboring clips.
const CONTIGUITY_TOLERANCE_MS: u64 = 20;
/// Coverage slack at the timeline tail.
const TAIL_TOLERANCE_MS: u64 = 200;

/// Shared context for building per-scene visual timelines.
pub struct VisualTimelineBuilder {
    cache: AssetCache,
    providers: Arc<Vec<Box<dyn StockProvider>>>,
    clips_dir: PathBuf,
    placeholder: PathBuf,
}

impl VisualTimelineBuilder {
    pub fn new(
        cache: AssetCache,
        providers: Arc<Vec<Box<dyn StockProvider>>>,
        clips_dir: PathBuf,
        placeholder: PathBuf,
    ) -> Self {
        Self {
            cache,
            providers,
            clips_dir,
            placeholder,
        }
    }

    /// Search every provider for the distinct keywords not yet
    /// cached, concurrently, and merge results per keyword.
    async fn prefetch(&self, keywords: &[String]) -> WorkerResult<()> {
        let mut distinct: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        distinct.sort();
        distinct.dedup();

        let mut tasks: JoinSet<(String, Vec<StockAsset>)> = JoinSet::new();
        for keyword in distinct {
            if self.cache.contains_keyword(&keyword).await {
                continue;
            }
            let providers = Arc::clone(&self.providers);
            tasks.spawn(async move {
                let mut merged = Vec::new();
                for provider in providers.iter() {
                    match provider.search(&keyword).await {
                        Ok(assets) => merged.extend(assets),
                        Err(e) => warn!(keyword = %keyword, "Provider search failed: {}", e),
                    }
                }
                (keyword, merged)
            });
        }

        while let Some(result) = tasks.join_next().await {
            let (keyword, assets) = result
                .map_err(|e| WorkerError::config_error(format!("Prefetch task failed: {}", e)))?;
            self.cache.insert(&keyword, assets).await;
        }
        Ok(())
    }

    /// Generic provider fallbacks, fetched at most once per timeline
    /// build and folded into the cache so the nuclear scan and reuse
    /// layers see them too.
    async fn fetch_fallbacks(&self) -> Vec<StockAsset> {
        let mut merged = Vec::new();
        for provider in self.providers.iter() {
            match provider.fallbacks().await {
                Ok(assets) => merged.extend(assets),
                Err(e) => warn!("Fallback fetch failed: {}", e),
            }
        }
        self.cache.insert("fallbacks", merged.clone()).await;
        merged
    }

    /// Layered asset selection for one clip slot.
    ///
    /// L1: exact keyword cache, preferring unclaimed IDs.
    /// L2: the provider's generic fallback pool.
    /// L3: any unclaimed asset in the whole cache.
    /// L4: with reuse enabled, any asset other than the previous clip.
    async fn select_asset(
        &self,
        keyword: &str,
        fallbacks: &mut Option<Vec<StockAsset>>,
        allow_reuse: bool,
        previous_id: Option<&str>,
    ) -> WorkerResult<StockAsset> {
        // L1: exact keyword.
        if let Some(candidates) = self.cache.get(keyword).await {
            for asset in &candidates {
                if self.cache.try_claim(&asset.id).await {
                    return Ok(asset.clone());
                }
            }
        }

        // L2: generic fallback pool, fetched on first miss.
        if fallbacks.is_none() {
            *fallbacks = Some(self.fetch_fallbacks().await);
        }
        for asset in fallbacks.as_deref().unwrap_or(&[]) {
            if self.cache.try_claim(&asset.id).await {
                debug!(keyword, asset_id = %asset.id, "Using generic fallback asset");
                return Ok(asset.clone());
            }
        }

        // L3: scan the entire database for anything unclaimed.
        for asset in self.cache.all_assets().await {
            if self.cache.try_claim(&asset.id).await {
                debug!(keyword, asset_id = %asset.id, "Nuclear fallback asset");
                return Ok(asset);
            }
        }

        // L4: reuse, never repeating the immediately previous clip.
        if allow_reuse {
            let pool = self.cache.all_assets().await;
            if let Some(asset) = pool.iter().find(|a| Some(a.id.as_str()) != previous_id) {
                let mut reused = asset.clone();
                reused.reused = true;
                debug!(keyword, asset_id = %reused.id, "Reusing asset under supply shortage");
                return Ok(reused);
            }
        }

        Err(WorkerError::asset_shortage(format!(
            "No asset available for keyword '{}' on any fallback layer",
            keyword
        )))
    }

    /// Build a contiguous clip sequence covering `[0, duration_ms]`.
    /// Returns the clips and whether reuse had to be enabled.
    pub async fn build(
        &self,
        job_id: &str,
        keywords: &[String],
        duration_ms: u64,
        rng: &mut StdRng,
    ) -> WorkerResult<(Vec<VisualClip>, bool)> {
        if keywords.is_empty() {
            return Err(WorkerError::asset_shortage("Scene has no keywords"));
        }
        self.prefetch(keywords).await?;

        let total_unique = self.cache.unused_count().await;
        let allow_reuse = (total_unique as u64) * MAX_CLIP_MS < duration_ms;
        if allow_reuse {
            warn!(
                total_unique,
                duration_ms, "Asset supply short, enabling clip reuse"
            );
        }
        let min_clip_ms =
            (duration_ms.div_ceil(total_unique.max(1) as u64)).clamp(MIN_CLIP_MS, MAX_CLIP_MS);

        let mut fallbacks: Option<Vec<StockAsset>> = None;
        let mut clips: Vec<VisualClip> = Vec::new();
        let mut cursor: u64 = 0;
        let mut slot = 0usize;

        while cursor < duration_ms {
            let remaining = duration_ms - cursor;
            let mut clip_duration = rng.gen_range(min_clip_ms..=MAX_CLIP_MS).min(remaining);

            // Tail lookahead: never leave an unformable (<800ms) remainder.
            let leftover = remaining - clip_duration;
            if leftover > 0 && leftover < MIN_CLIP_MS {
                if remaining <= MAX_CLIP_MS {
                    clip_duration = remaining;
                } else {
                    clip_duration = remaining - MIN_CLIP_MS;
                }
            }

            let keyword = &keywords[slot % keywords.len()];
            let previous_id = clips.last().map(|c| c.clip_id.to_string());
            let asset = self
                .select_asset(keyword, &mut fallbacks, allow_reuse, previous_id.as_deref())
                .await?;

            let local_path =
                ensure_local(&asset, &self.clips_dir, &self.placeholder, job_id).await?;

            let zoom = if rng.gen_bool(0.5) {
                if rng.gen_bool(0.5) {
                    Zoom::Subtle
                } else {
                    Zoom::Strong
                }
            } else {
                Zoom::None
            };
            let pan = if rng.gen_bool(0.5) {
                PANS[rng.gen_range(1..PANS.len())]
            } else {
                Pan::None
            };

            clips.push(VisualClip {
                clip_id: asset.id.clone(),
                provider: asset.provider.clone(),
                local_path: local_path.to_string_lossy().to_string(),
                start_ms: cursor,
                end_ms: cursor + clip_duration,
                keyword: keyword.clone(),
                transform: Transform { zoom, pan },
            });

            cursor += clip_duration;
            slot += 1;
        }

        info!(
            clips = clips.len(),
            duration_ms, allow_reuse, "Visual timeline built"
        );
        Ok((clips, allow_reuse))
    }
}

/// Validate a visual timeline: coverage, clip duration bounds,
/// uniqueness (unless reuse was enabled).
pub fn validate_visuals(clips: &[VisualClip], duration_ms: u64, allow_reuse: bool) -> GateReport {
    let mut report = GateReport::new();

    if clips.is_empty() {
        report.reject("Visual timeline is empty");
        return report;
    }

    if clips[0].start_ms > CONTIGUITY_TOLERANCE_MS {
        report.reject(format!(
            "Timeline starts at {}ms instead of 0",
            clips[0].start_ms
        ));
    }

    for pair in clips.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let drift = next.start_ms.abs_diff(prev.end_ms);
        if drift > CONTIGUITY_TOLERANCE_MS {
            report.reject(format!(
                "Gap/overlap of {}ms between clips at {}ms",
                drift, prev.end_ms
            ));
        }
    }

    for (index, clip) in clips.iter().enumerate() {
        let duration = clip.duration_ms();
        if !(MIN_CLIP_MS..=MAX_CLIP_MS).contains(&duration) {
            report.reject(format!(
                "Clip {} lasts {}ms, outside [{}ms, {}ms]",
                index, duration, MIN_CLIP_MS, MAX_CLIP_MS
            ));
        }
    }

    let last_end = clips.last().unwrap().end_ms;
    if last_end.abs_diff(duration_ms) > TAIL_TOLERANCE_MS {
        report.reject(format!(
            "Timeline ends at {}ms, target {}ms",
            last_end, duration_ms
        ));
    }

    if !allow_reuse {
        let mut seen = std::collections::HashSet::new();
        for clip in clips {
            if !seen.insert(clip.clip_id.as_str()) {
                report.reject(format!("Duplicate clip_id {} without reuse", clip.clip_id));
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use reel_assets::MockProvider;

    async fn builder(dir: &std::path::Path, per_keyword: usize) -> VisualTimelineBuilder {
        let placeholder = dir.join("placeholder.mp4");
        tokio::fs::write(&placeholder, vec![0u8; 64]).await.unwrap();
        let providers: Arc<Vec<Box<dyn StockProvider>>> =
            Arc::new(vec![Box::new(MockProvider::new(per_keyword))]);
        VisualTimelineBuilder::new(
            AssetCache::new(),
            providers,
            dir.join("clips"),
            placeholder,
        )
    }

    #[tokio::test]
    async fn test_timeline_covers_duration_with_valid_clips() {
        let dir = tempfile::TempDir::new().unwrap();
        let builder = builder(dir.path(), 10).await;
        let mut rng = StdRng::seed_from_u64(7);

        let keywords = vec!["coffee".to_string(), "beans".to_string()];
        let (clips, allow_reuse) = builder
            .build("job1", &keywords, 8000, &mut rng)
            .await
            .unwrap();

        assert!(!allow_reuse);
        let report = validate_visuals(&clips, 8000, false);
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert_eq!(clips[0].start_ms, 0);
        assert_eq!(clips.last().unwrap().end_ms, 8000);
    }

    #[tokio::test]
    async fn test_timeline_cycles_keywords() {
        let dir = tempfile::TempDir::new().unwrap();
        let builder = builder(dir.path(), 10).await;
        let mut rng = StdRng::seed_from_u64(11);

        let keywords = vec!["city".to_string(), "river".to_string()];
        let (clips, _) = builder
            .build("job1", &keywords, 6000, &mut rng)
            .await
            .unwrap();

        for (i, clip) in clips.iter().enumerate() {
            assert_eq!(clip.keyword, keywords[i % 2]);
        }
    }

    #[tokio::test]
    async fn test_supply_shortage_enables_reuse() {
        let dir = tempfile::TempDir::new().unwrap();
        // One asset per keyword, one keyword: 1 * 3000ms < 10000ms.
        let builder = builder(dir.path(), 1).await;
        let mut rng = StdRng::seed_from_u64(3);

        let keywords = vec!["rain".to_string()];
        let (clips, allow_reuse) = builder
            .build("job1", &keywords, 10_000, &mut rng)
            .await
            .unwrap();

        assert!(allow_reuse);
        let report = validate_visuals(&clips, 10_000, true);
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        // Reuse must have kicked in for the later clips.
        assert!(clips.len() >= 2);
    }

    #[tokio::test]
    async fn test_invariants_hold_across_seeds() {
        let dir = tempfile::TempDir::new().unwrap();
        let builder = builder(dir.path(), 20).await;
        let keywords = vec!["sea".to_string(), "cliff".to_string(), "gull".to_string()];

        for seed in 0..5u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let (clips, _) = builder
                .build(&format!("job{}", seed), &keywords, 7200, &mut rng)
                .await
                .unwrap();
            let report = validate_visuals(&clips, 7200, true);
            assert!(report.is_valid(), "seed {}: {:?}", seed, report.errors);
        }
    }

    #[test]
    fn test_gate_rejects_gap() {
        let clip = |start: u64, end: u64, id: &str| VisualClip {
            clip_id: id.to_string(),
            provider: "mock".to_string(),
            local_path: "/tmp/x.mp4".to_string(),
            start_ms: start,
            end_ms: end,
            keyword: "k".to_string(),
            transform: Transform::default(),
        };

        let clips = vec![clip(0, 1000, "a"), clip(1100, 2000, "b")];
        let report = validate_visuals(&clips, 2000, false);
        assert!(report.errors.iter().any(|e| e.contains("Gap/overlap")));
    }

    #[test]
    fn test_gate_rejects_duplicates_without_reuse() {
        let clip = |start: u64, end: u64, id: &str| VisualClip {
            clip_id: id.to_string(),
            provider: "mock".to_string(),
            local_path: "/tmp/x.mp4".to_string(),
            start_ms: start,
            end_ms: end,
            keyword: "k".to_string(),
            transform: Transform::default(),
        };

        let clips = vec![clip(0, 1000, "a"), clip(1000, 2000, "a")];
        let report = validate_visuals(&clips, 2000, false);
        assert!(report.errors.iter().any(|e| e.contains("Duplicate clip_id")));
        assert!(validate_visuals(&clips, 2000, true).is_valid());
    }
}
