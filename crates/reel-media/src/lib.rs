//! FFmpeg rendering adapter.
//!
//! This crate provides:
//! - Filter graph construction for normalized vertical segments
//!   (scale + zoom, pan-derived crops, fps/pixel-format normalization,
//!   drawtext caption overlays)
//! - An FFmpeg command builder/runner with filter-script files,
//!   captured stderr and output validation
//! - Stream-copy concatenation of rendered scene segments
//! - A silent WAV writer used when no TTS provider is configured

pub mod command;
pub mod error;
pub mod filters;
pub mod render;
pub mod wav;

pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult, RenderErrorKind};
pub use filters::{build_caption_overlays, build_scene_graph, build_segment_chain, SegmentSource};
pub use render::{concat_segments, render_scene, RenderRequest, OUTPUT_HEIGHT, OUTPUT_WIDTH};
pub use wav::write_silent_wav;
