//! Process-wide job store with a strict FIFO of pending jobs.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tokio::sync::{Mutex, Notify};
use tracing::{debug, info};

use reel_models::{Job, JobId, JobRequest};

use crate::error::{QueueError, QueueResult};

struct Inner {
    /// Pending job IDs in arrival order
    fifo: VecDeque<JobId>,
    /// All jobs by ID, retained until the retention sweep
    jobs: HashMap<JobId, Job>,
}

/// In-memory job store.
///
/// All accessors go through a single mutex so status transitions are
/// linearized per job. Durability: none; a process restart loses all
/// jobs.
#[derive(Clone)]
pub struct JobStore {
    inner: Arc<Mutex<Inner>>,
    /// Woken whenever a job is enqueued
    notify: Arc<Notify>,
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                fifo: VecDeque::new(),
                jobs: HashMap::new(),
            })),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Create a job from a validated request, append it to the FIFO
    /// and return its ID.
    pub async fn create(&self, request: JobRequest) -> JobId {
        let job = Job::new(request);
        let id = job.id.clone();

        let mut inner = self.inner.lock().await;
        inner.fifo.push_back(id.clone());
        inner.jobs.insert(id.clone(), job);
        drop(inner);

        info!(job_id = %id, "Job enqueued");
        self.notify.notify_one();
        id
    }

    /// Remove and return the job at the head of the FIFO, if any.
    pub async fn pop(&self) -> Option<Job> {
        let mut inner = self.inner.lock().await;
        while let Some(id) = inner.fifo.pop_front() {
            if let Some(job) = inner.jobs.get(&id).cloned() {
                debug!(job_id = %id, "Job popped from queue");
                return Some(job);
            }
            // Swept from the map while still queued; skip the stale ID.
        }
        None
    }

    /// Read a job by ID.
    pub async fn get(&self, id: &JobId) -> Option<Job> {
        self.inner.lock().await.jobs.get(id).cloned()
    }

    /// Snapshot of every job, newest first.
    pub async fn list(&self) -> Vec<Job> {
        let inner = self.inner.lock().await;
        let mut jobs: Vec<Job> = inner.jobs.values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    /// Atomically mutate a job.
    pub async fn update<F>(&self, id: &JobId, f: F) -> QueueResult<Job>
    where
        F: FnOnce(&mut Job),
    {
        let mut inner = self.inner.lock().await;
        let job = inner
            .jobs
            .get_mut(id)
            .ok_or_else(|| QueueError::job_not_found(id.to_string()))?;
        f(job);
        Ok(job.clone())
    }

    /// IDs of jobs that are not yet terminal. The retention sweep
    /// must not delete files belonging to these.
    pub async fn active_ids(&self) -> HashSet<String> {
        let inner = self.inner.lock().await;
        inner
            .jobs
            .values()
            .filter(|j| !j.is_terminal())
            .map(|j| j.id.to_string())
            .collect()
    }

    /// Number of jobs still waiting in the FIFO.
    pub async fn pending_len(&self) -> usize {
        self.inner.lock().await.fifo.len()
    }

    /// Wait until a job is enqueued.
    pub async fn wait_for_job(&self) {
        self.notify.notified().await;
    }
}
