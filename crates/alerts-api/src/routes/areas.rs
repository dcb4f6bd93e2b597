//! Per-area metadata.

use axum::extract::{Path, State};
use axum::Json;

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Metadata document the last refresh fetched for `area`.
pub async fn area_metadata(
    State(state): State<AppState>,
    Path(area): Path<String>,
) -> Result<Json<serde_json::Value>> {
    state
        .cache
        .area_metadata(&area)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("metadata for area {area}")))
}
