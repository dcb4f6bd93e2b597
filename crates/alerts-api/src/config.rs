//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use alert_cache::{parse_area_list, CacheConfig, FetchConfig, DEFAULT_AREAS, DEFAULT_BASE_URL};

/// Alerts API server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// Discovery API base URL.
    pub base_url: String,
    /// Discovery API credential.
    pub api_key: Option<String>,
    /// Areas refreshed on each cycle.
    pub areas: Vec<String>,
    /// Durable snapshot path.
    pub cache_path: PathBuf,
    /// Background refresh period; `None` disables the refresher.
    pub refresh_interval: Option<Duration>,
    /// Outbound HTTP timeout.
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `ALERTS_API_ADDR` | Server bind address | `127.0.0.1:8790` |
    /// | `AEMET_API_KEY` | Discovery API credential | (required for refresh) |
    /// | `AEMET_BASE_URL` | Discovery API base | `https://opendata.aemet.es/opendata/api` |
    /// | `ALERT_AREAS` | Comma-separated area codes | `61,...,79` |
    /// | `ALERT_CACHE_PATH` | Snapshot file | `./data/alerts-cache.json` |
    /// | `ALERT_REFRESH_SECS` | Refresh period, `0` disables | `900` |
    /// | `ALERT_HTTP_TIMEOUT_SECS` | Outbound HTTP timeout | `30` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr_raw = lookup("ALERTS_API_ADDR").unwrap_or_else(|| "127.0.0.1:8790".to_string());
        let addr = addr_raw
            .parse()
            .map_err(|_| ConfigError::InvalidAddr(addr_raw))?;

        let base_url = lookup("AEMET_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let api_key = lookup("AEMET_API_KEY").filter(|key| !key.trim().is_empty());

        let areas = match lookup("ALERT_AREAS") {
            Some(raw) => parse_area_list(&raw),
            None => DEFAULT_AREAS.iter().map(|area| area.to_string()).collect(),
        };

        let cache_path = lookup("ALERT_CACHE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| CacheConfig::default().cache_path);

        let refresh_secs = parse_secs(&lookup, "ALERT_REFRESH_SECS", 900)?;
        let timeout_secs = parse_secs(&lookup, "ALERT_HTTP_TIMEOUT_SECS", 30)?;

        Ok(Self {
            addr,
            base_url,
            api_key,
            areas,
            cache_path,
            refresh_interval: (refresh_secs > 0).then(|| Duration::from_secs(refresh_secs)),
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn fetch_config(&self) -> FetchConfig {
        let config = FetchConfig::new(&self.base_url).with_timeout(self.http_timeout);
        match &self.api_key {
            Some(key) => config.with_api_key(key),
            None => config,
        }
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::default()
            .with_areas(self.areas.iter().cloned())
            .with_cache_path(&self.cache_path)
    }
}

fn parse_secs<F>(lookup: &F, var: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { var, value: raw }),
        None => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid ALERTS_API_ADDR: {0}")]
    InvalidAddr(String),

    #[error("{var} must be a whole number of seconds, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}
