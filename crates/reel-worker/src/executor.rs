//! Bounded worker pool.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info};

use reel_models::{Job, JobOutcome};
use reel_queue::JobStore;

use crate::error::WorkerError;
use crate::processor::JobProcessor;

/// Fallback poll interval when no enqueue notification arrives.
const IDLE_POLL: Duration = Duration::from_millis(500);

/// Pool of workers pulling jobs off the FIFO under a concurrency cap.
///
/// A permit is acquired before popping, so queue order is strict
/// FIFO: at most `max_concurrent_jobs` jobs are in flight and the
/// head of the queue is always the next to start.
pub struct WorkerPool {
    store: JobStore,
    processor: Arc<JobProcessor>,
    permits: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(store: JobStore, processor: Arc<JobProcessor>, max_concurrent_jobs: usize) -> Self {
        Self {
            store,
            processor,
            permits: Arc::new(Semaphore::new(max_concurrent_jobs)),
        }
    }

    /// Run the dispatch loop forever on a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    async fn run(self) {
        info!(
            max_concurrent = self.permits.available_permits(),
            "Worker pool started"
        );

        loop {
            let permit = match Arc::clone(&self.permits).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return, // semaphore closed, shutting down
            };

            let job = loop {
                if let Some(job) = self.store.pop().await {
                    break job;
                }
                tokio::select! {
                    _ = self.store.wait_for_job() => {}
                    _ = tokio::time::sleep(IDLE_POLL) => {}
                }
            };

            let processor = Arc::clone(&self.processor);
            let store = self.store.clone();
            tokio::spawn(async move {
                let _permit = permit;
                Self::execute(processor, store, job).await;
            });
        }
    }

    /// Job boundary: every pipeline error lands here and becomes a
    /// FAILED status with classified diagnostics.
    async fn execute(processor: Arc<JobProcessor>, store: JobStore, job: Job) {
        let job_id = job.id.clone();
        let topic = job.request.topic.clone();

        if let Err(e) = processor.process(job).await {
            error!(job_id = %job_id, error_type = e.error_type(), "Job failed: {}", e);
            let outcome = failure_outcome(&e, &topic);
            if let Err(update_err) = store.update(&job_id, |j| j.fail(outcome.clone())).await {
                error!(job_id = %job_id, "Could not record failure: {}", update_err);
            }
        }
    }
}

/// Build the failure payload surfaced to polling clients.
fn failure_outcome(error: &WorkerError, topic: &str) -> JobOutcome {
    let diagnostics = match error {
        WorkerError::GateReject { stage, errors } => serde_json::json!({
            "stage": stage,
            "errors": errors,
            "topic": topic,
        }),
        WorkerError::RenderFailure { stderr, .. } => serde_json::json!({
            "stderr": stderr,
            "topic": topic,
        }),
        _ => serde_json::json!({ "topic": topic }),
    };

    JobOutcome {
        diagnostics: Some(diagnostics),
        timestamp: Utc::now(),
        ..JobOutcome::failure(error.to_string(), error.error_type())
    }
}
