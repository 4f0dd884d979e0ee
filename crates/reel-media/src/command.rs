//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Minimum size for a render to count as usable output.
const MIN_OUTPUT_BYTES: u64 = 10 * 1024;

/// Builder for FFmpeg invocations with multiple inputs and an
/// optional filter-script file.
///
/// The filter graph is always passed via `-filter_complex_script`
/// when set, so arbitrarily long graphs never hit command-line
/// length limits.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Arguments placed before the input list (e.g. demuxer selection)
    input_args: Vec<String>,
    /// Input file paths, each becoming a `-i` argument in order
    inputs: Vec<PathBuf>,
    /// Path of the filter script file, if a graph was written
    filter_script: Option<PathBuf>,
    /// Output arguments (mappings, codecs, flags)
    output_args: Vec<String>,
    /// Output file path
    output: PathBuf,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command targeting `output`.
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            input_args: Vec::new(),
            inputs: Vec::new(),
            filter_script: None,
            output_args: Vec::new(),
            output: output.as_ref().to_path_buf(),
            log_level: "error".to_string(),
        }
    }

    /// Add an argument placed before the inputs (demuxer flags).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Append an input file.
    pub fn input(mut self, path: impl AsRef<Path>) -> Self {
        self.inputs.push(path.as_ref().to_path_buf());
        self
    }

    /// Write `graph` to `script_path` and reference it via
    /// `-filter_complex_script`.
    pub async fn filter_script(
        mut self,
        graph: &str,
        script_path: impl AsRef<Path>,
    ) -> MediaResult<Self> {
        let script_path = script_path.as_ref();
        if let Some(parent) = script_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(script_path, graph).await?;
        self.filter_script = Some(script_path.to_path_buf());
        Ok(self)
    }

    /// Add an output argument.
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Map a stream label into the output.
    pub fn map(self, label: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(label)
    }

    /// Standard vertical H.264 + AAC target encoding.
    pub fn vertical_h264(self) -> Self {
        self.output_args([
            "-c:v",
            "libx264",
            "-preset",
            "medium",
            "-crf",
            "18",
            "-c:a",
            "aac",
            "-b:a",
            "192k",
            "-ar",
            "44100",
            "-ac",
            "2",
            "-movflags",
            "+faststart",
        ])
    }

    /// Build the explicit argv (without the `ffmpeg` program name).
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-v".to_string(),
            self.log_level.clone(),
        ];

        args.extend(self.input_args.clone());

        for input in &self.inputs {
            args.push("-i".to_string());
            args.push(input.to_string_lossy().to_string());
        }

        if let Some(script) = &self.filter_script {
            args.push("-filter_complex_script".to_string());
            args.push(script.to_string_lossy().to_string());
        }

        args.extend(self.output_args.clone());
        args.push(self.output.to_string_lossy().to_string());
        args
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }
}

/// Runner that executes FFmpeg commands and validates their output.
#[derive(Debug, Default)]
pub struct FfmpegRunner;

impl FfmpegRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run the command.
    ///
    /// Success requires exit code 0 AND an output file of at least
    /// 10 KB; anything else is an error carrying the captured stderr.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let mut stderr = String::new();
        if let Some(mut pipe) = child.stderr.take() {
            pipe.read_to_string(&mut stderr).await.ok();
        }

        let status = child.wait().await?;
        if !status.success() {
            warn!(
                exit_code = ?status.code(),
                "FFmpeg failed: {}",
                stderr.lines().last().unwrap_or("<no stderr>")
            );
            return Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some(stderr),
                status.code(),
            ));
        }

        let meta = tokio::fs::metadata(cmd.output_path())
            .await
            .map_err(|_| MediaError::OutputRejected(cmd.output_path().to_path_buf()))?;
        if meta.len() < MIN_OUTPUT_BYTES {
            return Err(MediaError::OutputRejected(cmd.output_path().to_path_buf()));
        }

        Ok(())
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}
