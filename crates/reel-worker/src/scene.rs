//! Per-scene pipeline driver.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use rand::rngs::StdRng;

use reel_models::{AudioResult, Caption, EditPlan, Pacing, Scene, VisualClip, SCENE_COUNT};

use crate::captions::{group_captions, validate_captions};
use crate::config::WorkerConfig;
use crate::edit_plan::{build_edit_plan, validate_edit_plan};
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::timing::{synthesize_scene, validate_timeline};
use crate::tts::SpeechSynth;
use crate::visuals::{validate_visuals, VisualTimelineBuilder};

/// Acceptable spoken pace, words per second. Outside this the pacing
/// check warns but never fails the scene.
const PACING_WPS_RANGE: (f64, f64) = (1.5, 5.0);

/// Everything one scene contributes to the final assembly.
#[derive(Debug)]
pub struct SceneArtifacts {
    pub scene_index: usize,
    pub audio: AudioResult,
    pub captions: Vec<Caption>,
    pub clips: Vec<VisualClip>,
    pub plan: EditPlan,
    pub segment_path: PathBuf,
    pub reuse_enabled: bool,
}

/// Seam over the external renderer so the pipeline is testable
/// without FFmpeg on the path.
#[async_trait]
pub trait SegmentRenderer: Send + Sync {
    /// Render one scene segment, returning the MP4 path.
    async fn render_segment(
        &self,
        job_id: &str,
        scene_index: usize,
        plan: &EditPlan,
        clips: &[VisualClip],
        captions: &[Caption],
        audio_path: &Path,
    ) -> WorkerResult<PathBuf>;

    /// Concatenate scene segments into the final video.
    async fn concat(&self, job_id: &str, segments: &[PathBuf]) -> WorkerResult<PathBuf>;
}

/// FFmpeg-backed renderer.
pub struct FfmpegSegmentRenderer {
    render_dir: PathBuf,
    output_dir: PathBuf,
}

impl FfmpegSegmentRenderer {
    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            render_dir: config.render_dir.clone(),
            output_dir: config.output_dir.clone(),
        }
    }
}

#[async_trait]
impl SegmentRenderer for FfmpegSegmentRenderer {
    async fn render_segment(
        &self,
        job_id: &str,
        scene_index: usize,
        plan: &EditPlan,
        clips: &[VisualClip],
        captions: &[Caption],
        audio_path: &Path,
    ) -> WorkerResult<PathBuf> {
        tokio::fs::create_dir_all(&self.render_dir).await?;
        let output_path = self
            .render_dir
            .join(format!("job_{}_scene_{}.mp4", job_id, scene_index));

        reel_media::render_scene(reel_media::RenderRequest {
            plan,
            clips,
            captions,
            audio_path,
            work_dir: &self.render_dir,
            output_path: &output_path,
        })
        .await
        .map_err(WorkerError::render_failure)?;

        Ok(output_path)
    }

    async fn concat(&self, job_id: &str, segments: &[PathBuf]) -> WorkerResult<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let output_path = self.output_dir.join(format!("job_{}_final.mp4", job_id));

        reel_media::concat_segments(segments, &self.render_dir, &output_path)
            .await
            .map_err(WorkerError::render_failure)?;

        Ok(output_path)
    }
}

/// Drives one scene through its ordered stages.
pub struct SceneProcessor {
    pub config: WorkerConfig,
    pub synth: Arc<dyn SpeechSynth>,
    pub visuals: Arc<VisualTimelineBuilder>,
    pub renderer: Arc<dyn SegmentRenderer>,
}

impl SceneProcessor {
    /// Run the sub-pipeline for `scene`: timing synth, warn-only
    /// keyword/pacing checks, speech synthesis, visual timeline (two
    /// attempts), captions, edit plan, segment render. Gates that
    /// reject abort the scene.
    pub async fn process(
        &self,
        job_id: &str,
        scene_index: usize,
        scene: &Scene,
        target_ms: u64,
        rng: &mut StdRng,
        logger: &JobLogger,
    ) -> WorkerResult<SceneArtifacts> {
        let logger = logger.stage(&format!("scene_{}", scene_index));

        // Audio timing (deterministic) + gate.
        let timing = synthesize_scene(scene_index, SCENE_COUNT, &scene.text);
        validate_timeline(&timing.timestamps, timing.duration_ms, target_ms)
            .into_result("audio")?;

        // Keyword check: warn only.
        if scene.keywords.len() < 2 {
            logger.warning(&format!(
                "Scene has only {} keywords, stock search will be thin",
                scene.keywords.len()
            ));
        }

        // Pacing check: warn only.
        if timing.speech_ms > 0 {
            let wps = timing.timestamps.len() as f64 / (timing.speech_ms as f64 / 1000.0);
            if wps < PACING_WPS_RANGE.0 || wps > PACING_WPS_RANGE.1 {
                logger.warning(&format!("Scene pace {:.2} words/sec is unusual", wps));
            }
        }

        // Speech synthesis (the timing model stays authoritative).
        let audio_path = self
            .synth
            .synthesize(
                &scene.text,
                timing.duration_ms,
                &self.config.audio_dir,
                &format!("job_{}_scene_{}", job_id, scene_index),
            )
            .await?;

        // Visual timeline: up to two attempts, second failure fatal.
        let mut attempt = 0;
        let (clips, reuse_enabled) = loop {
            attempt += 1;
            let result = self
                .visuals
                .build(job_id, &scene.keywords, timing.duration_ms, rng)
                .await
                .and_then(|(clips, reuse)| {
                    validate_visuals(&clips, timing.duration_ms, reuse)
                        .into_result("visual")
                        .map(|_| (clips, reuse))
                });
            match result {
                Ok(built) => break built,
                Err(e) if attempt < self.config.max_visual_attempts => {
                    logger.warning(&format!("Visual timeline attempt {} failed: {}", attempt, e));
                }
                Err(e) => return Err(e),
            }
        };

        // Captions + gate.
        let captions = group_captions(&timing.timestamps);
        validate_captions(&captions, timing.duration_ms).into_result("caption")?;

        // Edit plan + gate.
        let plan = build_edit_plan(
            &timing.timestamps,
            &captions,
            &clips,
            timing.duration_ms,
        )?;
        validate_edit_plan(&plan).into_result("edit")?;

        // Segment render.
        let segment_path = self
            .renderer
            .render_segment(job_id, scene_index, &plan, &clips, &captions, &audio_path)
            .await?;

        logger.completion(&format!(
            "Scene rendered: {} clips, {} captions, {} segments",
            clips.len(),
            captions.len(),
            plan.segment_count()
        ));

        Ok(SceneArtifacts {
            scene_index,
            audio: AudioResult {
                audio_path: audio_path.to_string_lossy().to_string(),
                timestamps: timing.timestamps,
                duration_ms: timing.duration_ms,
                pacing: Pacing::default(),
            },
            captions,
            clips,
            plan,
            segment_path,
            reuse_enabled,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::MockRenderer;
    use super::*;
    use crate::tts::SilentSynth;
    use rand::SeedableRng;
    use reel_assets::{AssetCache, MockProvider, StockProvider};
    use reel_models::SceneKind;

    async fn processor(dir: &Path) -> SceneProcessor {
        let placeholder = dir.join("placeholder.mp4");
        tokio::fs::write(&placeholder, vec![0u8; 64]).await.unwrap();

        let config = WorkerConfig {
            audio_dir: dir.join("audio"),
            clips_dir: dir.join("clips"),
            render_dir: dir.join("render"),
            output_dir: dir.join("output"),
            placeholder_clip: placeholder.clone(),
            marks_file: dir.join("marks.json"),
            ..WorkerConfig::default()
        };

        let providers: Arc<Vec<Box<dyn StockProvider>>> =
            Arc::new(vec![Box::new(MockProvider::new(10))]);
        let visuals = Arc::new(VisualTimelineBuilder::new(
            AssetCache::new(),
            providers,
            config.clips_dir.clone(),
            placeholder,
        ));

        SceneProcessor {
            config,
            synth: Arc::new(SilentSynth),
            visuals,
            renderer: Arc::new(MockRenderer::new(dir.to_path_buf())),
        }
    }

    #[tokio::test]
    async fn test_scene_pipeline_produces_consistent_artifacts() {
        let dir = tempfile::TempDir::new().unwrap();
        let processor = processor(dir.path()).await;
        let mut rng = StdRng::seed_from_u64(5);

        let scene = Scene {
            kind: SceneKind::Body2,
            text: "the hidden cost of speed is always accuracy in the end".to_string(),
            keywords: vec!["clock".to_string(), "racer".to_string()],
        };
        let logger = JobLogger::new(&reel_models::JobId::new(), "test");

        let artifacts = processor
            .process("jobA", 2, &scene, 30_000, &mut rng, &logger)
            .await
            .unwrap();

        assert_eq!(artifacts.scene_index, 2);
        assert!(!artifacts.captions.is_empty());
        assert!(!artifacts.clips.is_empty());
        assert_eq!(artifacts.plan.duration_ms, artifacts.audio.duration_ms);
        assert!(artifacts.segment_path.exists());
        assert!(artifacts.audio.audio_path.ends_with(".wav"));

        // Word timeline and plan agree on the scene length.
        let last_word_end = artifacts.audio.timestamps.last().unwrap().end_ms;
        assert!(artifacts.audio.duration_ms >= last_word_end);
    }

    #[tokio::test]
    async fn test_scene_with_no_keywords_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let processor = processor(dir.path()).await;
        let mut rng = StdRng::seed_from_u64(5);

        let scene = Scene {
            kind: SceneKind::Body1,
            text: "words without any keywords".to_string(),
            keywords: vec![],
        };
        let logger = JobLogger::new(&reel_models::JobId::new(), "test");

        let err = processor
            .process("jobB", 1, &scene, 30_000, &mut rng, &logger)
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), "ASSET_SHORTAGE");
    }
}
