//! Pipeline stages, quality gates and the worker pool.
//!
//! The per-scene pipeline (audio timing -> captions -> visuals ->
//! edit plan -> render) lives here, together with the script oracle
//! adapter, the final auditor, the scene processor that drives each
//! scene through its stages, and the bounded worker pool that owns
//! job state transitions.

pub mod audit;
pub mod captions;
pub mod config;
pub mod edit_plan;
pub mod error;
pub mod executor;
pub mod gate;
pub mod logging;
pub mod oracle;
pub mod processor;
pub mod retry;
pub mod scene;
pub mod script_gate;
pub mod timing;
pub mod tts;
pub mod visuals;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::WorkerPool;
pub use gate::GateReport;
pub use logging::JobLogger;
pub use oracle::{FallbackPolicy, MockOracle, OracleRouter, ScriptOracle};
pub use processor::JobProcessor;
pub use scene::{FfmpegSegmentRenderer, SceneProcessor, SegmentRenderer};
pub use tts::{synth_from_env, SilentSynth, SpeechSynth};
pub use visuals::VisualTimelineBuilder;
