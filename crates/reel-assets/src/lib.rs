//! Stock footage acquisition and retention.
//!
//! This crate provides:
//! - The `StockProvider` capability interface with Pexels and mock
//!   implementations
//! - A process-wide keyword -> asset cache with a used-ID set, safe
//!   under concurrent scene processing
//! - Local materialization of assets (downloads, placeholder copies)
//! - Marked-job persistence and the age-based retention sweep

pub mod cache;
pub mod download;
pub mod error;
pub mod provider;
pub mod retention;

pub use cache::AssetCache;
pub use download::ensure_local;
pub use error::{AssetError, AssetResult};
pub use provider::{MockProvider, PexelsProvider, StockProvider};
pub use retention::{MarkRegistry, RetentionSweeper};
