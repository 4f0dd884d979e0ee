//! Shared data models for the reelforge backend.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs, job status and generation requests
//! - Scripts and scenes
//! - Word-level audio timings
//! - Captions
//! - Visual timelines and transforms
//! - Edit plans

pub mod caption;
pub mod edit;
pub mod job;
pub mod script;
pub mod timing;
pub mod visual;

// Re-export common types
pub use caption::{Caption, CaptionStyle};
pub use edit::{EditPlan, EditSegment, SegmentReason};
pub use job::{Job, JobId, JobOutcome, JobRequest, JobStatus, Tone, ToneParseError};
pub use script::{Scene, SceneKind, Script, SCENE_COUNT};
pub use timing::{AudioResult, Pacing, WordTimestamp};
pub use visual::{Pan, StockAsset, Transform, VisualClip, Zoom, PANS};
