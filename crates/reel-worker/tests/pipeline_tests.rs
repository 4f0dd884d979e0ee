//! End-to-end pipeline tests against mock collaborators.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use reel_assets::{AssetCache, MockProvider, StockProvider};
use reel_models::{Caption, EditPlan, JobRequest, JobStatus, Tone, VisualClip};
use reel_queue::JobStore;
use reel_worker::{
    JobProcessor, MockOracle, SceneProcessor, SegmentRenderer, SilentSynth,
    VisualTimelineBuilder, WorkerConfig, WorkerPool, WorkerResult,
};

/// Renderer that fabricates tiny files instead of invoking FFmpeg.
struct StubRenderer {
    dir: PathBuf,
}

#[async_trait]
impl SegmentRenderer for StubRenderer {
    async fn render_segment(
        &self,
        job_id: &str,
        scene_index: usize,
        _plan: &EditPlan,
        _clips: &[VisualClip],
        _captions: &[Caption],
        _audio_path: &Path,
    ) -> WorkerResult<PathBuf> {
        let path = self
            .dir
            .join(format!("job_{}_scene_{}.mp4", job_id, scene_index));
        tokio::fs::write(&path, b"segment").await?;
        Ok(path)
    }

    async fn concat(&self, job_id: &str, segments: &[PathBuf]) -> WorkerResult<PathBuf> {
        assert!(!segments.is_empty());
        let path = self.dir.join(format!("job_{}_final.mp4", job_id));
        tokio::fs::write(&path, b"final").await?;
        Ok(path)
    }
}

async fn build_world(dir: &Path, topic: &str) -> (JobStore, WorkerPool) {
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
        Arc::new(vec![Box::new(MockProvider::new(40))]);
    let visuals = Arc::new(VisualTimelineBuilder::new(
        AssetCache::new(),
        providers,
        config.clips_dir.clone(),
        placeholder,
    ));

    let store = JobStore::new();
    let scenes = Arc::new(SceneProcessor {
        config: config.clone(),
        synth: Arc::new(SilentSynth),
        visuals,
        renderer: Arc::new(StubRenderer {
            dir: dir.to_path_buf(),
        }),
    });
    let processor = Arc::new(JobProcessor {
        store: store.clone(),
        oracle: Arc::new(MockOracle::canned(topic)),
        scenes,
        max_script_attempts: 3,
    });
    let pool = WorkerPool::new(store.clone(), processor, config.max_concurrent_jobs);
    (store, pool)
}

async fn wait_terminal(store: &JobStore, id: &reel_models::JobId) -> reel_models::Job {
    for _ in 0..200 {
        if let Some(job) = store.get(id).await {
            if job.is_terminal() {
                return job;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("job {} never reached a terminal state", id);
}

#[tokio::test]
async fn test_job_runs_to_terminal_state_through_the_pool() {
    let dir = tempfile::TempDir::new().unwrap();
    let (store, pool) = build_world(dir.path(), "The Science of Caffeine").await;
    let handle = pool.spawn();

    let id = store
        .create(JobRequest {
            topic: "The Science of Caffeine".to_string(),
            duration_seconds: 30,
            tone: Tone::Informative,
            dry_run: false,
        })
        .await;

    let job = wait_terminal(&store, &id).await;
    handle.abort();

    match job.status {
        JobStatus::Completed => {
            let outcome = job.result.expect("completed job carries an outcome");
            assert!(outcome.output_path.unwrap().contains("final.mp4"));
            assert_eq!(outcome.script.unwrap().scenes.len(), 7);
            let metadata = outcome.metadata.unwrap();
            assert!(metadata["clip_count"].as_u64().unwrap() > 0);
        }
        JobStatus::Failed => {
            // The canned script may legitimately trip the pacing
            // auditor; anything else is a pipeline defect.
            let outcome = job.result.expect("failed job carries an outcome");
            assert_eq!(outcome.error_type.as_deref(), Some("AUDIT_NOGO"));
            assert!(outcome.error.unwrap().contains("Pacing"));
        }
        other => panic!("unexpected terminal status {other}"),
    }
}

#[tokio::test]
async fn test_dry_run_skips_rendering() {
    let dir = tempfile::TempDir::new().unwrap();
    let (store, pool) = build_world(dir.path(), "Night Trains").await;
    let handle = pool.spawn();

    let id = store
        .create(JobRequest {
            topic: "Night Trains".to_string(),
            duration_seconds: 30,
            tone: Tone::Dramatic,
            dry_run: true,
        })
        .await;

    let job = wait_terminal(&store, &id).await;
    handle.abort();

    assert_eq!(job.status, JobStatus::Completed);
    let outcome = job.result.unwrap();
    assert!(outcome.output_path.is_none());
    assert!(outcome.script.is_some());

    // No segments were rendered for the dry run.
    let mut render_entries = tokio::fs::read_dir(dir.path().join("render"))
        .await
        .ok();
    if let Some(entries) = render_entries.as_mut() {
        assert!(entries.next_entry().await.unwrap().is_none());
    }
}

#[tokio::test]
async fn test_queue_is_drained_in_order_under_capacity() {
    let dir = tempfile::TempDir::new().unwrap();
    let (store, pool) = build_world(dir.path(), "Tides").await;

    // Enqueue more jobs than the pool capacity before starting it.
    let mut ids = Vec::new();
    for n in 0..5 {
        ids.push(
            store
                .create(JobRequest {
                    topic: format!("Tides {}", n),
                    duration_seconds: 20,
                    tone: Tone::Neutral,
                    dry_run: true,
                })
                .await,
        );
    }
    assert_eq!(store.pending_len().await, 5);

    let handle = pool.spawn();
    for id in &ids {
        let job = wait_terminal(&store, id).await;
        assert_eq!(job.status, JobStatus::Completed);
    }
    handle.abort();

    assert_eq!(store.pending_len().await, 0);
}
