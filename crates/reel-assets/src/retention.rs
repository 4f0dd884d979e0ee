//! Marked-job persistence and age-based retention sweeps.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{AssetError, AssetResult};

/// Files older than this are eligible for deletion.
const MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// How often the background sweep runs.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Persistent set of marked job IDs.
///
/// Marked jobs' files survive the retention sweep. The set is stored
/// as a JSON array in a single flat file and rewritten atomically
/// (temp file + rename) on every change.
pub struct MarkRegistry {
    path: PathBuf,
    marks: Mutex<HashSet<String>>,
}

impl MarkRegistry {
    /// Load the registry from `path`, tolerating a missing file.
    pub async fn load(path: impl AsRef<Path>) -> AssetResult<Self> {
        let path = path.as_ref().to_path_buf();
        let marks = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                let ids: Vec<String> = serde_json::from_str(&contents)
                    .map_err(|e| AssetError::MarksCorrupt(e.to_string()))?;
                ids.into_iter().collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => return Err(e.into()),
        };
        info!(count = marks.len(), "Loaded marked jobs from {}", path.display());
        Ok(Self {
            path,
            marks: Mutex::new(marks),
        })
    }

    /// Mark a job ID. Returns true if it was not already marked.
    pub async fn mark(&self, job_id: &str) -> AssetResult<bool> {
        let mut marks = self.marks.lock().await;
        let added = marks.insert(job_id.to_string());
        if added {
            self.persist(&marks).await?;
        }
        Ok(added)
    }

    /// Unmark a job ID. Returns true if it was present.
    pub async fn unmark(&self, job_id: &str) -> AssetResult<bool> {
        let mut marks = self.marks.lock().await;
        let removed = marks.remove(job_id);
        if removed {
            self.persist(&marks).await?;
        }
        Ok(removed)
    }

    pub async fn is_marked(&self, job_id: &str) -> bool {
        self.marks.lock().await.contains(job_id)
    }

    pub async fn snapshot(&self) -> HashSet<String> {
        self.marks.lock().await.clone()
    }

    /// Rewrite the marks file atomically.
    async fn persist(&self, marks: &HashSet<String>) -> AssetResult<()> {
        let mut ids: Vec<&String> = marks.iter().collect();
        ids.sort();
        let json = serde_json::to_string_pretty(&ids)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(count = marks.len(), "Persisted marks to {}", self.path.display());
        Ok(())
    }
}

/// Age-based file sweeper over the generated-asset directories.
pub struct RetentionSweeper {
    directories: Vec<PathBuf>,
    marks: Arc<MarkRegistry>,
}

impl RetentionSweeper {
    pub fn new(directories: Vec<PathBuf>, marks: Arc<MarkRegistry>) -> Self {
        Self { directories, marks }
    }

    /// Delete files older than seven days whose names carry no marked
    /// or active job ID. Returns the number of files deleted.
    pub async fn sweep(&self, active_ids: &HashSet<String>) -> AssetResult<usize> {
        let protected: HashSet<String> = self
            .marks
            .snapshot()
            .await
            .union(active_ids)
            .cloned()
            .collect();
        let now = SystemTime::now();
        let mut deleted = 0;

        for dir in &self.directories {
            let mut entries = match tokio::fs::read_dir(dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }

                let name = entry.file_name().to_string_lossy().to_string();
                if protected.iter().any(|id| name.contains(id.as_str())) {
                    debug!(file = %name, "Retention: protected by mark or active job");
                    continue;
                }

                let age = entry
                    .metadata()
                    .await
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(|modified| now.duration_since(modified).ok());

                if matches!(age, Some(age) if age > MAX_AGE) {
                    match tokio::fs::remove_file(&path).await {
                        Ok(()) => {
                            deleted += 1;
                            debug!(file = %name, "Retention: deleted");
                        }
                        Err(e) => warn!(file = %name, "Retention: delete failed: {}", e),
                    }
                }
            }
        }

        if deleted > 0 {
            info!(deleted, "Retention sweep complete");
        }
        Ok(deleted)
    }
}
