//! On-demand refresh.

use alert_cache::RefreshReport;
use axum::extract::State;
use axum::Json;
use tracing::info;

use crate::error::Result;
use crate::state::AppState;

/// Refresh every configured area now. Waits for any refresh in flight.
pub async fn refresh(State(state): State<AppState>) -> Result<Json<RefreshReport>> {
    info!("Manual refresh requested");
    let report = state.cache.refresh_configured().await?;
    Ok(Json(report))
}
