//! Application state shared across handlers.

use std::sync::Arc;

use alert_cache::AlertCache;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The alert cache every route reads from.
    pub cache: Arc<AlertCache>,
}

impl AppState {
    /// Create new application state.
    pub fn new(cache: Arc<AlertCache>) -> Self {
        Self { cache }
    }
}
