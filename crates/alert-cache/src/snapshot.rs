//! Immutable point-in-time cache snapshots and their persisted form.

use cap_parser::Alert;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StoreError;
use crate::fetch::{AreaOutcome, InventoryEntry};
use crate::zone::{ZoneCode, ZoneIndex};

/// Persisted schema version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// The on-disk projection of a snapshot. The zone index is not part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSnapshot {
    pub version: u32,
    pub generated_at: Option<DateTime<Utc>>,
    pub areas: Vec<String>,
    pub files: Vec<InventoryEntry>,
    pub alerts: Vec<Alert>,
}

#[derive(Serialize)]
struct PersistedSnapshotRef<'a> {
    version: u32,
    generated_at: Option<&'a DateTime<Utc>>,
    areas: &'a [String],
    files: &'a [InventoryEntry],
    alerts: &'a [Alert],
}

#[derive(Deserialize)]
struct VersionHeader {
    version: u32,
}

/// All areas' alerts at one point in time, plus the derived zone index.
///
/// Snapshots are never mutated after construction; a refresh builds a new one.
#[derive(Debug, Clone, Default)]
pub struct CacheSnapshot {
    generated_at: Option<DateTime<Utc>>,
    areas: Vec<String>,
    files: Vec<InventoryEntry>,
    alerts: Vec<Alert>,
    index: ZoneIndex,
    /// Per-area metadata documents. In memory only.
    metadata: IndexMap<String, serde_json::Value>,
}

impl CacheSnapshot {
    pub fn new(
        generated_at: Option<DateTime<Utc>>,
        areas: Vec<String>,
        files: Vec<InventoryEntry>,
        alerts: Vec<Alert>,
    ) -> Self {
        let index = ZoneIndex::build(&alerts);
        Self {
            generated_at,
            areas,
            files,
            alerts,
            index,
            metadata: IndexMap::new(),
        }
    }

    /// Merge per-area outcomes. Failed areas appear in the inventory with
    /// their error; successful areas contribute files and alerts.
    pub fn from_outcomes(
        generated_at: DateTime<Utc>,
        areas: &[String],
        outcomes: Vec<AreaOutcome>,
    ) -> Self {
        let mut files = Vec::new();
        let mut alerts = Vec::new();
        let mut metadata = IndexMap::new();

        for outcome in outcomes {
            match outcome.result {
                Ok(area) => {
                    if let Some(value) = area.metadata {
                        metadata.insert(area.area, value);
                    }
                    files.extend(area.files);
                    alerts.extend(area.alerts);
                }
                Err(err) => {
                    warn!(area = %outcome.area, error = %err, "Area refresh failed");
                    files.push(InventoryEntry::failed_area(&outcome.area, &err));
                }
            }
        }

        Self {
            metadata,
            ..Self::new(Some(generated_at), areas.to_vec(), files, alerts)
        }
    }

    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        self.generated_at
    }

    pub fn areas(&self) -> &[String] {
        &self.areas
    }

    pub fn files(&self) -> &[InventoryEntry] {
        &self.files
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn index(&self) -> &ZoneIndex {
        &self.index
    }

    pub fn metadata(&self, area: &str) -> Option<&serde_json::Value> {
        self.metadata.get(area)
    }

    /// The alerts indexed under `zone`, in discovery order.
    pub fn alerts_for(&self, zone: &ZoneCode) -> Vec<Alert> {
        self.index
            .get(zone)
            .iter()
            .filter_map(|&position| self.alerts.get(position).cloned())
            .collect()
    }

    /// Serialize the persisted projection.
    pub fn encode(&self) -> Result<Vec<u8>, StoreError> {
        let persisted = PersistedSnapshotRef {
            version: SNAPSHOT_VERSION,
            generated_at: self.generated_at.as_ref(),
            areas: &self.areas,
            files: &self.files,
            alerts: &self.alerts,
        };
        Ok(serde_json::to_vec(&persisted)?)
    }

    /// Deserialize a persisted projection and rebuild the zone index.
    pub fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        let header: VersionHeader = serde_json::from_slice(bytes)?;
        if header.version != SNAPSHOT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                found: header.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        let persisted: PersistedSnapshot = serde_json::from_slice(bytes)?;
        Ok(Self::from(persisted))
    }
}

impl From<PersistedSnapshot> for CacheSnapshot {
    fn from(persisted: PersistedSnapshot) -> Self {
        Self::new(
            persisted.generated_at,
            persisted.areas,
            persisted.files,
            persisted.alerts,
        )
    }
}
