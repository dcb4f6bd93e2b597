//! The persistent last-known-good alert cache.

use std::sync::Arc;
use std::time::Instant;

use cap_parser::Alert;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::fetch::AlertSource;
use crate::snapshot::CacheSnapshot;
use crate::store::SnapshotStore;
use crate::zone::{ZoneCode, ZoneCount, ZoneMatch};

/// Number of zones listed in [`CacheStats::top_zones`].
pub const TOP_ZONES: usize = 10;

#[derive(Debug, Default)]
struct CacheState {
    current: Option<Arc<CacheSnapshot>>,
    last_good: Option<Arc<CacheSnapshot>>,
    /// A refresh has failed since the last success.
    stale: bool,
}

impl CacheState {
    fn serving(&self) -> Option<Arc<CacheSnapshot>> {
        self.current.as_ref().or(self.last_good.as_ref()).cloned()
    }
}

/// Summary of a completed refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshReport {
    pub areas_tried: usize,
    pub areas_failed: Vec<String>,
    pub files_count: usize,
    pub alerts_count: usize,
    pub elapsed_ms: u64,
    pub generated_at: Option<DateTime<Utc>>,
}

/// Alerts for one zone from the served snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneQuery {
    pub zone: ZoneCode,
    pub generated_at: Option<DateTime<Utc>>,
    pub stale: bool,
    pub alerts: Vec<Alert>,
}

/// Aggregate view of the served snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub generated_at: Option<DateTime<Utc>>,
    pub stale: bool,
    pub areas: Vec<String>,
    pub files_count: usize,
    pub alerts_count: usize,
    pub zones_indexed: usize,
    pub top_zones: Vec<ZoneCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheHealth {
    pub generated_at: Option<DateTime<Utc>>,
    pub stale: bool,
}

/// Serves zone queries from an immutable snapshot while refreshes build the
/// next one in the background.
///
/// Refreshes are serialized. A refresh commits its snapshot in memory before
/// persisting it, so a failed write never loses fresh data. When every area
/// fails, the previous snapshot keeps being served and is marked stale.
pub struct AlertCache {
    source: Arc<dyn AlertSource>,
    store: Arc<dyn SnapshotStore>,
    config: CacheConfig,
    state: RwLock<CacheState>,
    refresh_lock: Mutex<()>,
}

impl AlertCache {
    pub fn new(
        source: Arc<dyn AlertSource>,
        store: Arc<dyn SnapshotStore>,
        config: CacheConfig,
    ) -> Self {
        Self {
            source,
            store,
            config,
            state: RwLock::new(CacheState::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The snapshot currently being served, if any.
    pub async fn snapshot(&self) -> Option<Arc<CacheSnapshot>> {
        self.state.read().await.serving()
    }

    /// Install the persisted snapshot, if one is readable.
    ///
    /// Missing, corrupt or unsupported data leaves the cache empty; the
    /// failure is logged and never returned. Returns whether a snapshot was
    /// installed. An in-memory snapshot from an earlier refresh is never
    /// replaced.
    pub async fn load_from_store(&self) -> bool {
        let location = self.store.location();
        let bytes = match self.store.read().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                info!(location = %location, "No persisted snapshot");
                return false;
            }
            Err(e) => {
                warn!(location = %location, error = %e, "Failed to read persisted snapshot");
                return false;
            }
        };

        let snapshot = match CacheSnapshot::decode(&bytes) {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                warn!(location = %location, error = %e, "Discarding unreadable snapshot");
                return false;
            }
        };

        let mut state = self.state.write().await;
        if state.current.is_some() {
            debug!("Snapshot already present, skipping persisted copy");
            return false;
        }

        info!(
            location = %location,
            alerts = snapshot.alerts().len(),
            zones = snapshot.index().len(),
            "Loaded persisted snapshot"
        );
        state.current = Some(snapshot.clone());
        state.last_good = Some(snapshot);
        true
    }

    /// Refresh the configured areas.
    pub async fn refresh_configured(&self) -> Result<RefreshReport, CacheError> {
        self.refresh(&self.config.areas).await
    }

    /// Fetch `areas` and replace the served snapshot.
    ///
    /// Partial failures still commit; failed areas appear in the inventory
    /// with their error. Zero areas is a valid, empty refresh.
    pub async fn refresh(&self, areas: &[String]) -> Result<RefreshReport, CacheError> {
        let _guard = self.refresh_lock.lock().await;
        let started = Instant::now();

        if !areas.is_empty() && !self.source.has_credentials() {
            return Err(CacheError::MissingApiKey);
        }

        info!(areas = areas.len(), "Refreshing alert cache");
        let outcomes = self.source.fetch_areas(areas).await;

        let areas_failed: Vec<String> = outcomes
            .iter()
            .filter(|outcome| outcome.result.is_err())
            .map(|outcome| outcome.area.clone())
            .collect();
        let produced = outcomes
            .iter()
            .filter(|outcome| matches!(&outcome.result, Ok(area) if !area.files.is_empty()))
            .count();

        // An area that answered with no documents at all counts as failed here,
        // so an empty upstream never replaces the last good snapshot.
        if !areas.is_empty() && produced == 0 {
            self.state.write().await.stale = true;

            let errors: Vec<(String, String)> = outcomes
                .into_iter()
                .map(|outcome| {
                    let reason = match outcome.result {
                        Ok(_) => "area produced no documents".to_string(),
                        Err(e) => e.to_string(),
                    };
                    (outcome.area, reason)
                })
                .collect();
            error!(attempted = areas.len(), "No area produced documents, keeping previous snapshot");
            return Err(CacheError::AllAreasFailed {
                attempted: areas.len(),
                errors,
            });
        }

        let snapshot = Arc::new(CacheSnapshot::from_outcomes(Utc::now(), areas, outcomes));

        {
            let mut state = self.state.write().await;
            state.current = Some(snapshot.clone());
            state.last_good = Some(snapshot.clone());
            state.stale = false;
        }

        self.persist(&snapshot).await;

        let report = RefreshReport {
            areas_tried: areas.len(),
            areas_failed,
            files_count: snapshot.files().len(),
            alerts_count: snapshot.alerts().len(),
            elapsed_ms: started.elapsed().as_millis() as u64,
            generated_at: snapshot.generated_at(),
        };

        info!(
            areas = report.areas_tried,
            failed = report.areas_failed.len(),
            files = report.files_count,
            alerts = report.alerts_count,
            elapsed_ms = report.elapsed_ms,
            "Refresh complete"
        );

        Ok(report)
    }

    async fn persist(&self, snapshot: &CacheSnapshot) {
        let result = match snapshot.encode() {
            Ok(bytes) => self.store.write(&bytes).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => debug!(location = %self.store.location(), "Persisted snapshot"),
            Err(e) => warn!(
                location = %self.store.location(),
                error = %e,
                "Failed to persist snapshot, serving from memory"
            ),
        }
    }

    /// Alerts indexed under `zone` in the served snapshot.
    pub async fn query(&self, zone: &str) -> Result<ZoneQuery, CacheError> {
        let zone = ZoneCode::parse(zone)?;
        let (snapshot, stale) = {
            let state = self.state.read().await;
            (state.serving(), state.stale)
        };

        Ok(match snapshot {
            Some(snapshot) => ZoneQuery {
                generated_at: snapshot.generated_at(),
                alerts: snapshot.alerts_for(&zone),
                zone,
                stale,
            },
            None => ZoneQuery {
                zone,
                generated_at: None,
                stale,
                alerts: Vec::new(),
            },
        })
    }

    /// Metadata fetched for `area` by the refresh that built the served
    /// snapshot. Not persisted, so empty until the first refresh after startup.
    pub async fn area_metadata(&self, area: &str) -> Option<serde_json::Value> {
        self.snapshot().await?.metadata(area).cloned()
    }

    /// Fetch the zone's area now, bypassing the snapshot.
    pub async fn live(&self, zone: &str) -> Result<Vec<ZoneMatch>, CacheError> {
        let zone = ZoneCode::parse(zone)?;
        if !self.source.has_credentials() {
            return Err(CacheError::MissingApiKey);
        }
        Ok(self.source.fetch_zone(&zone).await?)
    }

    pub async fn stats(&self) -> CacheStats {
        let (snapshot, stale) = {
            let state = self.state.read().await;
            (state.serving(), state.stale)
        };

        match snapshot {
            Some(snapshot) => CacheStats {
                generated_at: snapshot.generated_at(),
                stale,
                areas: snapshot.areas().to_vec(),
                files_count: snapshot.files().len(),
                alerts_count: snapshot.alerts().len(),
                zones_indexed: snapshot.index().len(),
                top_zones: snapshot.index().top_zones(TOP_ZONES),
            },
            None => CacheStats {
                generated_at: None,
                stale,
                areas: Vec::new(),
                files_count: 0,
                alerts_count: 0,
                zones_indexed: 0,
                top_zones: Vec::new(),
            },
        }
    }

    pub async fn health(&self) -> CacheHealth {
        let state = self.state.read().await;
        CacheHealth {
            generated_at: state.serving().and_then(|snapshot| snapshot.generated_at()),
            stale: state.stale,
        }
    }
}
