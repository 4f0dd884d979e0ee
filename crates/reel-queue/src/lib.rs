//! In-memory job store and FIFO queue.
//!
//! This crate provides:
//! - A process-wide job store (ID -> Job) with a strict FIFO of
//!   pending job IDs
//! - Serialized mutation through a single mutex (single-writer
//!   discipline)
//! - A per-job progress handle for status/progress/ETA updates

pub mod error;
pub mod progress;
pub mod store;

pub use error::{QueueError, QueueResult};
pub use progress::ProgressHandle;
pub use store::JobStore;
