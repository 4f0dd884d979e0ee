//! Scene rendering and final concatenation.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use reel_models::{Caption, EditPlan, VisualClip};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::{build_scene_graph, SegmentSource};

pub const OUTPUT_WIDTH: u32 = 1080;
pub const OUTPUT_HEIGHT: u32 = 1920;

/// Everything needed to render one scene segment.
#[derive(Debug)]
pub struct RenderRequest<'a> {
    pub plan: &'a EditPlan,
    pub clips: &'a [VisualClip],
    pub captions: &'a [Caption],
    /// Scene narration audio (WAV or MP3)
    pub audio_path: &'a Path,
    /// Working directory for the filter script
    pub work_dir: &'a Path,
    /// Destination MP4
    pub output_path: &'a Path,
}

/// Resolve each edit segment to its source clip and input index.
fn resolve_sources(
    plan: &EditPlan,
    clips: &[VisualClip],
) -> MediaResult<(Vec<PathBuf>, Vec<SegmentSource>)> {
    // One input per distinct clip, in first-use order.
    let mut inputs: Vec<PathBuf> = Vec::new();
    let mut input_of_clip: Vec<(String, usize)> = Vec::new();
    let mut sources = Vec::with_capacity(plan.segments.len());

    for segment in &plan.segments {
        // Prefer the instance covering the segment start: under
        // supply-shortage reuse the same clip_id can appear twice on
        // the timeline with different offsets.
        let clip = clips
            .iter()
            .find(|c| c.clip_id == segment.clip_id && c.covers(segment.start_ms))
            .or_else(|| clips.iter().find(|c| c.clip_id == segment.clip_id))
            .ok_or_else(|| {
                MediaError::ffmpeg_failed(
                    format!("Edit segment references unknown clip {}", segment.clip_id),
                    None,
                    None,
                )
            })?;

        let input_index = match input_of_clip.iter().find(|(id, _)| *id == clip.clip_id) {
            Some((_, idx)) => *idx,
            None => {
                let idx = inputs.len();
                inputs.push(PathBuf::from(&clip.local_path));
                input_of_clip.push((clip.clip_id.clone(), idx));
                idx
            }
        };

        sources.push(SegmentSource {
            input_index,
            file_offset_s: segment.start_ms.saturating_sub(clip.start_ms) as f64 / 1000.0,
            duration_s: segment.duration_ms() as f64 / 1000.0,
            zoom: segment.zoom,
            pan: segment.pan,
        });
    }

    Ok((inputs, sources))
}

/// Render a single scene: normalized segments concatenated, captions
/// overlaid, narration muxed, encoded to the vertical H.264 target.
pub async fn render_scene(request: RenderRequest<'_>) -> MediaResult<()> {
    let (inputs, sources) = resolve_sources(request.plan, request.clips)?;
    let graph = build_scene_graph(&sources, request.captions);

    let script_path = request.work_dir.join(format!(
        "{}.filter",
        request
            .output_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "segment".to_string())
    ));

    debug!(
        segments = sources.len(),
        inputs = inputs.len(),
        "Rendering scene to {}",
        request.output_path.display()
    );

    let audio_index = inputs.len();
    let mut cmd = FfmpegCommand::new(request.output_path);
    for input in &inputs {
        cmd = cmd.input(input);
    }
    cmd = cmd
        .input(request.audio_path)
        .filter_script(&graph, &script_path)
        .await?
        .map("[video_out]")
        .map(format!("{}:a", audio_index))
        .output_arg("-shortest")
        .vertical_h264();

    FfmpegRunner::new().run(&cmd).await?;
    info!("Rendered scene segment {}", request.output_path.display());
    Ok(())
}

/// Concatenate rendered scene segments with the concat demuxer
/// (stream copy, no re-encode).
pub async fn concat_segments(
    segment_paths: &[PathBuf],
    work_dir: &Path,
    output_path: &Path,
) -> MediaResult<()> {
    if segment_paths.is_empty() {
        return Err(MediaError::ffmpeg_failed(
            "No segments to concatenate",
            None,
            None,
        ));
    }
    for path in segment_paths {
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.clone()));
        }
    }

    let list_path = work_dir.join("concat_list.txt");
    let list = segment_paths
        .iter()
        .map(|p| format!("file '{}'", p.display()))
        .collect::<Vec<_>>()
        .join("\n");
    tokio::fs::create_dir_all(work_dir).await?;
    tokio::fs::write(&list_path, list).await?;

    let cmd = FfmpegCommand::new(output_path)
        .input_arg("-f")
        .input_arg("concat")
        .input_arg("-safe")
        .input_arg("0")
        .input(&list_path)
        .output_args(["-c", "copy"]);

    FfmpegRunner::new().run(&cmd).await?;
    info!(
        segments = segment_paths.len(),
        "Concatenated final video {}",
        output_path.display()
    );
    Ok(())
}
