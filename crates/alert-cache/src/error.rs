//! Error types for fetching, caching and persistence.

use thiserror::Error;

/// Failures talking to the upstream service for one area.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream answered with a non-success status.
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    /// The discovery body reported a failure in its own status field.
    #[error("discovery for area {area} reported estado {estado}: {description}")]
    Discovery {
        area: String,
        estado: u16,
        description: String,
    },

    /// The bundle download returned no bytes.
    #[error("{0} returned an empty bundle")]
    EmptyBundle(String),

    /// The discovery body had no data-bundle URL.
    #[error("discovery for area {0} returned no data URL")]
    MissingDataUrl(String),

    /// JSON decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Any other transport failure (used by non-reqwest clients).
    #[error("transport error: {0}")]
    Transport(String),
}

/// Failures reading or writing the durable snapshot.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serde json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The stored snapshot uses a schema this build does not understand.
    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

/// Errors surfaced by the cache's public operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Zone codes are exactly six ASCII digits.
    #[error("invalid zone code {0:?}: expected 6 digits")]
    InvalidZone(String),

    /// Refresh needs an upstream credential.
    #[error("missing API key for the discovery endpoint")]
    MissingApiKey,

    /// Every configured area failed; the previous snapshot is kept.
    #[error("all {attempted} areas failed to refresh")]
    AllAreasFailed {
        attempted: usize,
        errors: Vec<(String, String)>,
    },

    /// Live lookups surface the area's fetch failure directly.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl CacheError {
    /// Whether the caller supplied bad input (as opposed to an upstream fault).
    pub fn is_input_error(&self) -> bool {
        matches!(self, CacheError::InvalidZone(_) | CacheError::MissingApiKey)
    }
}
