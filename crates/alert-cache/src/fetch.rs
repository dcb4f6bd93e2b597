//! Per-area fetch orchestration.
//!
//! For one area: discovery → bundle download → decode → parse, then an
//! optional metadata fetch. Areas are independent and run concurrently; a
//! failing area never affects the others.

use async_trait::async_trait;
use cap_parser::{decode_with_hint, open_bundle, parse_bytes, Alert, ArchiveEntry, Bundle};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::http::{HttpClient, HttpResponse, ReqwestClient};
use crate::zone::{match_zone, ZoneCode, ZoneMatch};

/// Discovery endpoint body.
#[derive(Debug, Clone, Deserialize)]
struct DiscoveryResponse {
    #[serde(default)]
    descripcion: Option<String>,
    #[serde(default)]
    estado: Option<u16>,
    #[serde(default)]
    datos: Option<String>,
    #[serde(default)]
    metadatos: Option<String>,
}

/// Resolved download locations for one area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub data_url: String,
    pub metadata_url: Option<String>,
}

/// Inventory record for one archive entry, or for a failed area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub area: String,
    pub name: Option<String>,
    pub size: u64,
    pub sha256: Option<String>,
    /// Set when the area failed or this document did not parse.
    pub error: Option<String>,
}

impl InventoryEntry {
    pub fn from_entry(area: &str, entry: &ArchiveEntry) -> Self {
        Self {
            area: area.to_string(),
            name: Some(entry.name.clone()),
            size: entry.size,
            sha256: Some(entry.sha256.clone()),
            error: None,
        }
    }

    pub fn failed_area(area: &str, error: impl ToString) -> Self {
        Self {
            area: area.to_string(),
            name: None,
            size: 0,
            sha256: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Everything one area's fetch produced.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaSnapshot {
    pub area: String,
    pub files: Vec<InventoryEntry>,
    pub alerts: Vec<Alert>,
    pub metadata: Option<serde_json::Value>,
    /// The bundle was not an archive and was read as one document.
    pub raw_document: bool,
}

/// Result of attempting one area.
#[derive(Debug)]
pub struct AreaOutcome {
    pub area: String,
    pub result: Result<AreaSnapshot, FetchError>,
}

/// A producer of per-area alert snapshots.
#[async_trait]
pub trait AlertSource: Send + Sync {
    /// Whether the upstream credential is configured.
    fn has_credentials(&self) -> bool;

    /// Fetch and parse the latest bundle for one area.
    async fn fetch_area(&self, area: &str) -> Result<AreaSnapshot, FetchError>;

    /// Fetch the zone's area and select the zone's alerts from it.
    async fn fetch_zone(&self, zone: &ZoneCode) -> Result<Vec<ZoneMatch>, FetchError>;

    /// Fetch several areas concurrently. Outcomes follow input order.
    async fn fetch_areas(&self, areas: &[String]) -> Vec<AreaOutcome> {
        join_all(areas.iter().map(|area| async move {
            AreaOutcome {
                area: area.clone(),
                result: self.fetch_area(area).await,
            }
        }))
        .await
    }
}

/// [`AlertSource`] that talks to the discovery API over an [`HttpClient`].
pub struct AreaFetcher<H> {
    http: H,
    config: FetchConfig,
}

impl AreaFetcher<ReqwestClient> {
    /// Build a fetcher backed by `reqwest`.
    pub fn from_config(config: FetchConfig) -> Result<Self, FetchError> {
        let http = ReqwestClient::new(config.timeout)?;
        Ok(Self::new(http, config))
    }
}

impl<H: HttpClient> AreaFetcher<H> {
    pub fn new(http: H, config: FetchConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, FetchError> {
        self.http.get(url, headers).await?.error_for_status(url)
    }

    /// Resolve the bundle and metadata URLs for `area`.
    pub async fn discover(&self, area: &str) -> Result<Discovery, FetchError> {
        let url = self.config.discovery_url(area);
        let api_key = self.config.api_key.as_deref().unwrap_or_default();
        let response = self.get(&url, &[("api_key", api_key)]).await?;

        let (text, _) = decode_with_hint(&response.body, response.content_type.as_deref());
        let body: DiscoveryResponse = serde_json::from_str(&text)?;

        if let Some(estado) = body.estado {
            if !(200..300).contains(&estado) {
                return Err(FetchError::Discovery {
                    area: area.to_string(),
                    estado,
                    description: body.descripcion.unwrap_or_default(),
                });
            }
        }

        let data_url = body
            .datos
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| FetchError::MissingDataUrl(area.to_string()))?;

        Ok(Discovery {
            data_url,
            metadata_url: body.metadatos.filter(|url| !url.trim().is_empty()),
        })
    }

    /// Download and open the bundle at `data_url`. An empty body fails the area.
    pub async fn download_bundle(&self, data_url: &str) -> Result<Bundle, FetchError> {
        let response = self.get(data_url, &[]).await?;
        if response.body.is_empty() {
            return Err(FetchError::EmptyBundle(data_url.to_string()));
        }
        Ok(open_bundle(&response.body, data_url))
    }

    /// Fetch a metadata document and decode it as JSON.
    pub async fn fetch_metadata(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        let response = self.get(url, &[]).await?;
        let (text, encoding) = decode_with_hint(&response.body, response.content_type.as_deref());
        debug!(url = %url, ?encoding, "Decoded metadata");
        Ok(serde_json::from_str(&text)?)
    }
}

/// Parse the eligible documents of a bundle into alerts and inventory.
///
/// Documents that fail to parse stay in the inventory with an error marker;
/// their siblings are still processed.
pub fn read_bundle(area: &str, bundle: &Bundle) -> (Vec<InventoryEntry>, Vec<Alert>) {
    let mut files = Vec::with_capacity(bundle.entries().len());
    let mut alerts = Vec::new();

    for entry in bundle.entries() {
        let mut record = InventoryEntry::from_entry(area, entry);

        if bundle.is_raw() || entry.is_xml() {
            match parse_bytes(&entry.bytes) {
                Ok(parsed) => alerts.extend(
                    parsed
                        .into_iter()
                        .map(|alert| alert.with_source(area, entry.name.clone())),
                ),
                Err(err) => {
                    warn!(area = %area, file = %entry.name, error = %err, "Failed to parse CAP document");
                    record.error = Some(err.to_string());
                }
            }
        }

        files.push(record);
    }

    (files, alerts)
}

#[async_trait]
impl<H: HttpClient> AlertSource for AreaFetcher<H> {
    fn has_credentials(&self) -> bool {
        self.config.has_api_key()
    }

    async fn fetch_area(&self, area: &str) -> Result<AreaSnapshot, FetchError> {
        let discovery = self.discover(area).await?;
        let bundle = self.download_bundle(&discovery.data_url).await?;
        let (files, alerts) = read_bundle(area, &bundle);

        let metadata = match &discovery.metadata_url {
            Some(url) => match self.fetch_metadata(url).await {
                Ok(value) => Some(value),
                Err(err) => {
                    debug!(area = %area, error = %err, "Metadata unavailable");
                    None
                }
            },
            None => None,
        };

        info!(
            area = %area,
            files = files.len(),
            alerts = alerts.len(),
            raw = bundle.is_raw(),
            "Fetched area"
        );

        Ok(AreaSnapshot {
            area: area.to_string(),
            files,
            alerts,
            metadata,
            raw_document: bundle.is_raw(),
        })
    }

    async fn fetch_zone(&self, zone: &ZoneCode) -> Result<Vec<ZoneMatch>, FetchError> {
        let area = zone.area();
        let discovery = self.discover(area).await?;
        let bundle = self.download_bundle(&discovery.data_url).await?;
        Ok(match_zone(area, &bundle, zone))
    }
}
