//! Route handlers for the alerts API.

pub mod alerts;
pub mod areas;
pub mod health;
pub mod refresh;
pub mod stats;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/stats", get(stats::stats))
        .route("/refresh", post(refresh::refresh))
        .route("/alerts/:zone", get(alerts::zone_alerts))
        .route("/alerts/:zone/live", get(alerts::live_alerts))
        .route("/areas/:area/metadata", get(areas::area_metadata))
}
