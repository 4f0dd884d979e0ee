//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Worker pool and pipeline configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum jobs in PROCESSING at once
    pub max_concurrent_jobs: usize,
    /// Minimum interval between oracle calls
    pub oracle_min_interval: Duration,
    /// Script gate regeneration attempts
    pub max_script_attempts: u32,
    /// Visual timeline attempts per scene
    pub max_visual_attempts: u32,
    /// Root for generated audio files
    pub audio_dir: PathBuf,
    /// Root for downloaded/copied clips
    pub clips_dir: PathBuf,
    /// Scratch space for per-scene renders and filter scripts
    pub render_dir: PathBuf,
    /// Final outputs
    pub output_dir: PathBuf,
    /// Placeholder clip used for mock assets
    pub placeholder_clip: PathBuf,
    /// Marked-job persistence file
    pub marks_file: PathBuf,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 3,
            oracle_min_interval: Duration::from_millis(1000),
            max_script_attempts: 3,
            max_visual_attempts: 2,
            audio_dir: PathBuf::from("assets/audio"),
            clips_dir: PathBuf::from("assets/clips"),
            render_dir: PathBuf::from("temp_render"),
            output_dir: PathBuf::from("temp_output"),
            placeholder_clip: PathBuf::from("assets/placeholder.mp4"),
            marks_file: PathBuf::from("marked_assets.json"),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_concurrent_jobs: std::env::var("MAX_CONCURRENT_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_concurrent_jobs),
            oracle_min_interval: Duration::from_millis(
                std::env::var("GEMINI_MIN_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1000),
            ),
            max_script_attempts: defaults.max_script_attempts,
            max_visual_attempts: defaults.max_visual_attempts,
            audio_dir: env_path("AUDIO_DIR", defaults.audio_dir),
            clips_dir: env_path("CLIPS_DIR", defaults.clips_dir),
            render_dir: env_path("RENDER_DIR", defaults.render_dir),
            output_dir: env_path("OUTPUT_DIR", defaults.output_dir),
            placeholder_clip: env_path("PLACEHOLDER_CLIP", defaults.placeholder_clip),
            marks_file: env_path("MARKS_FILE", defaults.marks_file),
        }
    }

    /// Directories covered by the retention sweep.
    pub fn sweep_dirs(&self) -> Vec<PathBuf> {
        vec![
            self.audio_dir.clone(),
            self.clips_dir.clone(),
            self.render_dir.clone(),
            self.output_dir.clone(),
        ]
    }
}

fn env_path(var: &str, default: PathBuf) -> PathBuf {
    std::env::var(var).map(PathBuf::from).unwrap_or(default)
}
