//! Cache statistics.

use alert_cache::CacheStats;
use axum::extract::State;
use axum::Json;

use crate::state::AppState;

pub async fn stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats().await)
}
