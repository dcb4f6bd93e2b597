//! Normalized CAP alert records and archive entries.
//!
//! Every CAP element that may repeat is a `Vec` here, even when the source
//! document carried a single occurrence. Optional scalars are `Option<String>`:
//! `None` means the element was absent, `Some("")` means it was present but blank.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A `{name, value}` pair (`parameter`, `eventCode`, `geocode`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameValue {
    pub name: Option<String>,
    pub value: Option<String>,
}

impl NameValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: Some(value.into()),
        }
    }
}

/// Top-level `<alert>` fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertHeader {
    pub identifier: Option<String>,
    pub sender: Option<String>,
    pub sent: Option<String>,
    pub status: Option<String>,
    pub msg_type: Option<String>,
    pub scope: Option<String>,
    pub references: Option<String>,
    pub note: Option<String>,
}

/// One `<area>` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertArea {
    pub area_desc: Option<String>,
    pub altitude: Option<String>,
    pub ceiling: Option<String>,
    /// Raw `"lat,lon lat,lon ..."` point lists.
    pub polygons: Vec<String>,
    pub circles: Vec<String>,
    pub geocodes: Vec<NameValue>,
}

/// One `<info>` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertInfo {
    pub language: Option<String>,
    pub category: Vec<String>,
    pub event: Option<String>,
    pub response_type: Vec<String>,
    pub urgency: Option<String>,
    pub severity: Option<String>,
    pub certainty: Option<String>,
    pub effective: Option<String>,
    pub onset: Option<String>,
    pub expires: Option<String>,
    pub sender_name: Option<String>,
    pub headline: Option<String>,
    pub description: Option<String>,
    pub instruction: Option<String>,
    pub web: Option<String>,
    pub contact: Option<String>,
    pub parameters: Vec<NameValue>,
    pub event_codes: Vec<NameValue>,
    pub areas: Vec<AlertArea>,
}

/// One parsed `<alert>` root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Area code of the bundle this alert came from.
    pub area: Option<String>,
    /// Archive entry name (or bundle URL for raw documents).
    pub file: Option<String>,
    pub header: AlertHeader,
    pub infos: Vec<AlertInfo>,
    /// The `<alert>` element exactly as it appeared in the source text.
    pub raw_xml: String,
}

impl Alert {
    /// Tag the alert with the area and file it was read from.
    pub fn with_source(mut self, area: impl Into<String>, file: impl Into<String>) -> Self {
        self.area = Some(area.into());
        self.file = Some(file.into());
        self
    }

    /// Every geocode value across all info and area blocks, in document order.
    pub fn geocode_values(&self) -> impl Iterator<Item = &str> {
        self.infos
            .iter()
            .flat_map(|info| info.areas.iter())
            .flat_map(|area| area.geocodes.iter())
            .filter_map(|geocode| geocode.value.as_deref())
    }
}

/// A file extracted from a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path within the archive.
    pub name: String,
    pub size: u64,
    /// Hex-encoded SHA-256 of `bytes`.
    pub sha256: String,
    pub bytes: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            sha256: sha256_hex(&bytes),
            bytes,
        }
    }

    /// Whether the entry name carries an `.xml` suffix (case-insensitive).
    pub fn is_xml(&self) -> bool {
        self.name.to_ascii_lowercase().ends_with(".xml")
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
