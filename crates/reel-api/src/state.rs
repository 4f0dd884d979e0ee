//! Application state.

use std::sync::Arc;

use reel_assets::MarkRegistry;
use reel_queue::JobStore;

use crate::config::ApiConfig;

/// Shared application state.
///
/// One top-level owner for every process-wide handle; nothing in the
/// pipeline reaches for globals.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: JobStore,
    pub marks: Arc<MarkRegistry>,
}

impl AppState {
    pub fn new(config: ApiConfig, store: JobStore, marks: Arc<MarkRegistry>) -> Self {
        Self {
            config,
            store,
            marks,
        }
    }
}
