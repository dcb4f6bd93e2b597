//! Zone alert lookups.

use alert_cache::{ZoneMatch, ZoneQuery};
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::error::Result;
use crate::state::AppState;

/// Alerts for a zone from the cached snapshot.
pub async fn zone_alerts(
    State(state): State<AppState>,
    Path(zone): Path<String>,
) -> Result<Json<ZoneQuery>> {
    Ok(Json(state.cache.query(&zone).await?))
}

#[derive(Serialize)]
pub struct LiveAlerts {
    pub zone: String,
    pub count: usize,
    pub matches: Vec<ZoneMatch>,
}

/// Alerts for a zone fetched from upstream right now.
pub async fn live_alerts(
    State(state): State<AppState>,
    Path(zone): Path<String>,
) -> Result<Json<LiveAlerts>> {
    let matches = state.cache.live(&zone).await?;
    Ok(Json(LiveAlerts {
        zone,
        count: matches.len(),
        matches,
    }))
}
