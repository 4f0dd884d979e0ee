//! Structured job logging utilities.

use tracing::{error, info, warn};

use reel_models::JobId;

/// Job logger with consistent formatting.
///
/// Every lifecycle event is tagged with the job ID and the operation
/// (pipeline stage) that emitted it.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: String,
}

impl JobLogger {
    pub fn new(job_id: &JobId, operation: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Derive a logger for a sub-operation of the same job.
    pub fn stage(&self, operation: &str) -> Self {
        Self {
            job_id: self.job_id.clone(),
            operation: operation.to_string(),
        }
    }

    pub fn start(&self, message: &str) {
        info!(job_id = %self.job_id, operation = %self.operation, "Started: {}", message);
    }

    pub fn progress(&self, message: &str) {
        info!(job_id = %self.job_id, operation = %self.operation, "{}", message);
    }

    pub fn warning(&self, message: &str) {
        warn!(job_id = %self.job_id, operation = %self.operation, "{}", message);
    }

    pub fn failure(&self, message: &str) {
        error!(job_id = %self.job_id, operation = %self.operation, "Failed: {}", message);
    }

    pub fn completion(&self, message: &str) {
        info!(job_id = %self.job_id, operation = %self.operation, "Completed: {}", message);
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }
}
