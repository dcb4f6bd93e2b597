//! Configuration types for fetching and caching.

use std::path::PathBuf;
use std::time::Duration;

/// Default discovery API base.
pub const DEFAULT_BASE_URL: &str = "https://opendata.aemet.es/opendata/api";

/// The 19 regional areas published by the upstream service.
pub const DEFAULT_AREAS: [&str; 19] = [
    "61", "62", "63", "64", "65", "66", "67", "68", "69", "70", "71", "72", "73", "74", "75",
    "76", "77", "78", "79",
];

/// Configuration for talking to the discovery endpoint.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Base URL of the discovery API (no trailing slash).
    pub base_url: String,
    /// Credential sent in the `api_key` header.
    pub api_key: Option<String>,
    /// Outbound request timeout.
    pub timeout: Duration,
}

impl FetchConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether a non-blank credential is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.trim().is_empty())
    }

    /// Discovery URL for the most recently produced bundle of `area`.
    pub fn discovery_url(&self, area: &str) -> String {
        format!("{}/avisos_cap/ultimoelaborado/area/{}", self.base_url, area)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Configuration for the persistent cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Areas refreshed by [`AlertCache::refresh_configured`](crate::AlertCache::refresh_configured).
    pub areas: Vec<String>,
    /// Where the snapshot is persisted.
    pub cache_path: PathBuf,
}

impl CacheConfig {
    pub fn with_areas<I, S>(mut self, areas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.areas = areas.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            areas: DEFAULT_AREAS.iter().map(|area| area.to_string()).collect(),
            cache_path: PathBuf::from("./data/alerts-cache.json"),
        }
    }
}

/// Split a comma-separated area list, dropping blanks.
pub fn parse_area_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|area| !area.is_empty())
        .map(str::to_string)
        .collect()
}
