//! Health check endpoint.

use alert_cache::CacheHealth;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    #[serde(flatten)]
    pub cache: CacheHealth,
}

/// Health check endpoint. Always `ok`; `stale` reports cache freshness.
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        cache: state.cache.health().await,
    })
}
