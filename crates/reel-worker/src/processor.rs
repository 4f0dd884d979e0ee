//! Job-level pipeline driver.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::task::JoinSet;
use tracing::info;

use reel_models::{Job, JobOutcome, JobStatus, Script, WordTimestamp};
use reel_queue::{JobStore, ProgressHandle};

use crate::audit::run_audit;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::oracle::ScriptOracle;
use crate::scene::{SceneArtifacts, SceneProcessor};
use crate::script_gate::validate_script;

/// Progress milestones (percent).
const PROGRESS_SCRIPTED: u8 = 15;
const PROGRESS_SCENES_DONE: u8 = 80;
const PROGRESS_MERGED: u8 = 92;

/// Drives one job from script to published output.
pub struct JobProcessor {
    pub store: JobStore,
    pub oracle: Arc<dyn ScriptOracle>,
    pub scenes: Arc<SceneProcessor>,
    pub max_script_attempts: u32,
}

impl JobProcessor {
    /// Generate a script, regenerating up to the attempt budget when
    /// the quality gate rejects it.
    async fn scripted(&self, job: &Job, logger: &JobLogger) -> WorkerResult<Script> {
        let request = &job.request;
        let mut last_errors = Vec::new();

        for attempt in 1..=self.max_script_attempts {
            let script = self
                .oracle
                .generate_script(&request.topic, request.duration_seconds, request.tone)
                .await?;

            let report = validate_script(&script);
            if report.is_valid() {
                return Ok(script);
            }
            logger.warning(&format!(
                "Script attempt {} rejected: {:?}",
                attempt, report.errors
            ));
            last_errors = report.errors;
        }

        Err(WorkerError::gate_reject("script", last_errors))
    }

    /// Run the whole pipeline for a popped job. Errors are caught by
    /// the worker pool at the job boundary.
    pub async fn process(&self, job: Job) -> WorkerResult<()> {
        let logger = JobLogger::new(&job.id, "pipeline");
        let handle = ProgressHandle::new(self.store.clone(), job.id.clone());
        let target_ms = job.request.duration_seconds as u64 * 1000;

        handle.set_status(JobStatus::Processing).await?;
        logger.start(&format!("topic: {}", job.request.topic));

        // Script generation + gate (up to 3 attempts).
        handle.set_status(JobStatus::Scripting).await?;
        let script = self.scripted(&job, &logger).await?;
        handle
            .report(PROGRESS_SCRIPTED, "Script validated")
            .await?;

        if job.request.dry_run {
            logger.completion("Dry run: returning validated script");
            self.store
                .update(&job.id, |j| j.complete(JobOutcome::script_only(script.clone())))
                .await?;
            return Ok(());
        }

        // Fan out scenes; any failure cancels the group.
        handle.set_status(JobStatus::AudioGen).await?;
        let scene_count = script.scenes.len();
        let mut tasks: JoinSet<WorkerResult<SceneArtifacts>> = JoinSet::new();
        for (index, scene) in script.scenes.iter().cloned().enumerate() {
            let scenes = Arc::clone(&self.scenes);
            let job_id = job.id.to_string();
            let logger = logger.clone();
            tasks.spawn(async move {
                let mut rng = StdRng::from_entropy();
                scenes
                    .process(&job_id, index, &scene, target_ms, &mut rng, &logger)
                    .await
            });
        }

        let mut artifacts: Vec<SceneArtifacts> = Vec::with_capacity(scene_count);
        while let Some(joined) = tasks.join_next().await {
            let artifact = match joined {
                Ok(Ok(artifact)) => artifact,
                Ok(Err(e)) => {
                    tasks.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    tasks.abort_all();
                    return Err(WorkerError::config_error(format!(
                        "Scene task panicked: {}",
                        e
                    )));
                }
            };

            let done = artifacts.len() + 1;
            let span = (PROGRESS_SCENES_DONE - PROGRESS_SCRIPTED) as usize;
            let progress = PROGRESS_SCRIPTED + (span * done / scene_count) as u8;
            handle
                .report(
                    progress,
                    format!("Scene {} of {} rendered", done, scene_count),
                )
                .await?;
            artifacts.push(artifact);
        }
        artifacts.sort_by_key(|a| a.scene_index);

        // Aggregate the word timeline with running scene offsets.
        let mut combined: Vec<WordTimestamp> = Vec::new();
        let mut offset_ms: u64 = 0;
        for artifact in &artifacts {
            combined.extend(artifact.audio.timestamps.iter().map(|t| WordTimestamp {
                word: t.word.clone(),
                start_ms: t.start_ms + offset_ms,
                end_ms: t.end_ms + offset_ms,
                emphasis: t.emphasis,
            }));
            offset_ms += artifact.audio.duration_ms;
        }
        let total_ms = offset_ms;

        // Aggregate audio gate: the whole narration must fit the budget.
        crate::timing::validate_timeline(&combined, total_ms, target_ms)
            .into_result("audio")?;

        // Barrier reached: every scene rendered. Concatenate.
        handle.set_status(JobStatus::EditReady).await?;
        handle.set_status(JobStatus::Merging).await?;
        let segment_paths: Vec<_> = artifacts.iter().map(|a| a.segment_path.clone()).collect();
        let output_path = self
            .scenes
            .renderer
            .concat(job.id.as_str(), &segment_paths)
            .await?;
        handle.report(PROGRESS_MERGED, "Scenes merged").await?;

        // Final audit.
        handle.set_status(JobStatus::Auditing).await?;
        let verdict = run_audit(&script, &combined);
        if !verdict.is_go() {
            return Err(WorkerError::AuditNoGo(verdict.failures.join("; ")));
        }

        let metadata = serde_json::json!({
            "duration_ms": total_ms,
            "scene_count": scene_count,
            "clip_count": artifacts.iter().map(|a| a.clips.len()).sum::<usize>(),
            "caption_count": artifacts.iter().map(|a| a.captions.len()).sum::<usize>(),
            "segment_count": artifacts.iter().map(|a| a.plan.segment_count()).sum::<usize>(),
            "reuse_enabled": artifacts.iter().any(|a| a.reuse_enabled),
            "audit": "go",
        });

        self.store
            .update(&job.id, |j| {
                j.complete(
                    JobOutcome::success(output_path.to_string_lossy().to_string())
                        .with_script(script.clone())
                        .with_metadata(metadata.clone()),
                )
            })
            .await?;

        info!(job_id = %job.id, "Job completed: {}", output_path.display());
        Ok(())
    }
}
