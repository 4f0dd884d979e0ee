//! Per-job progress reporting.

use chrono::Utc;
use tracing::{debug, info};

use reel_models::{JobId, JobStatus};

use crate::error::QueueResult;
use crate::store::JobStore;

/// Handle bound to one job for reporting progress from the worker.
///
/// Wraps [`JobStore::update`] so pipeline stages never touch the
/// store directly; every transition is logged with the job ID.
#[derive(Clone)]
pub struct ProgressHandle {
    store: JobStore,
    job_id: JobId,
}

impl ProgressHandle {
    pub fn new(store: JobStore, job_id: JobId) -> Self {
        Self { store, job_id }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Transition the job status.
    pub async fn set_status(&self, status: JobStatus) -> QueueResult<()> {
        info!(job_id = %self.job_id, status = %status, "Status transition");
        self.store
            .update(&self.job_id, |job| job.set_status(status))
            .await?;
        Ok(())
    }

    /// Report progress with a human-readable message. ETA is derived
    /// from elapsed wall time and the fraction of work remaining.
    pub async fn report(&self, progress: u8, message: impl Into<String>) -> QueueResult<()> {
        let message = message.into();
        debug!(job_id = %self.job_id, progress, "{}", message);
        self.store
            .update(&self.job_id, |job| {
                job.set_progress(progress);
                if progress > 0 && progress < 100 {
                    let elapsed = (Utc::now() - job.created_at).num_seconds().max(1) as u64;
                    job.eta_seconds =
                        Some(elapsed * (100 - progress as u64) / progress as u64);
                }
                job.message = Some(message);
            })
            .await?;
        Ok(())
    }
}
