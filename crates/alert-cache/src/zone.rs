//! Zone codes, the single-zone matcher and the aggregated zone index.

use std::fmt;
use std::str::FromStr;

use cap_parser::{parse_bytes, Alert, ArchiveEntry, Bundle};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CacheError;

/// Length of a zone code.
pub const ZONE_CODE_LEN: usize = 6;

/// A 6-digit meteorological zone code, e.g. `614102`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ZoneCode(String);

impl ZoneCode {
    pub fn parse(raw: &str) -> Result<Self, CacheError> {
        if raw.len() == ZONE_CODE_LEN && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(raw.to_string()))
        } else {
            Err(CacheError::InvalidZone(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The 2-digit area the zone belongs to.
    pub fn area(&self) -> &str {
        &self.0[..2]
    }
}

impl FromStr for ZoneCode {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ZoneCode {
    type Error = CacheError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ZoneCode> for String {
    fn from(zone: ZoneCode) -> Self {
        zone.0
    }
}

impl fmt::Display for ZoneCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Every 6-digit run in `text`, scanning left to right without overlap.
///
/// A longer digit run yields one code per complete group of six, so a
/// 14-digit timestamp contributes two codes.
pub fn extract_zone_codes(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut codes = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let run_end = bytes[i..]
            .iter()
            .position(|b| !b.is_ascii_digit())
            .map_or(bytes.len(), |offset| i + offset);
        while run_end - i >= ZONE_CODE_LEN {
            codes.push(&text[i..i + ZONE_CODE_LEN]);
            i += ZONE_CODE_LEN;
        }
        i = run_end;
    }

    codes
}

/// Which strategy matched an alert to a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedBy {
    FileName,
    Geocode,
}

impl fmt::Display for MatchedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchedBy::FileName => f.write_str("file_name"),
            MatchedBy::Geocode => f.write_str("geocode"),
        }
    }
}

/// One alert selected for a zone by [`match_zone`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneMatch {
    pub file: String,
    pub matched_by: MatchedBy,
    pub alert: Alert,
}

fn parse_entry(area: &str, entry: &ArchiveEntry) -> Vec<Alert> {
    match parse_bytes(&entry.bytes) {
        Ok(alerts) => alerts
            .into_iter()
            .map(|alert| alert.with_source(area, entry.name.clone()))
            .collect(),
        Err(err) => {
            warn!(area = %area, file = %entry.name, error = %err, "Skipping unparseable document");
            Vec::new()
        }
    }
}

/// Select the alerts in one area's bundle that belong to `zone`.
///
/// Entries whose name contains the zone code win outright. Only when no
/// entry name matches is every document parsed and filtered by geocode
/// value. Archive entries must carry an `.xml` suffix; a raw-document
/// bundle is always eligible.
pub fn match_zone(area: &str, bundle: &Bundle, zone: &ZoneCode) -> Vec<ZoneMatch> {
    let eligible: Vec<&ArchiveEntry> = bundle
        .entries()
        .iter()
        .filter(|entry| bundle.is_raw() || entry.is_xml())
        .collect();

    let by_name: Vec<&ArchiveEntry> = eligible
        .iter()
        .copied()
        .filter(|entry| entry.name.contains(zone.as_str()))
        .collect();

    if !by_name.is_empty() {
        return by_name
            .into_iter()
            .flat_map(|entry| {
                parse_entry(area, entry).into_iter().map(move |alert| ZoneMatch {
                    file: entry.name.clone(),
                    matched_by: MatchedBy::FileName,
                    alert,
                })
            })
            .collect();
    }

    eligible
        .into_iter()
        .flat_map(|entry| {
            parse_entry(area, entry)
                .into_iter()
                .filter(move |alert| alert.geocode_values().any(|value| value.contains(zone.as_str())))
                .map(move |alert| ZoneMatch {
                    file: entry.name.clone(),
                    matched_by: MatchedBy::Geocode,
                    alert,
                })
        })
        .collect()
}

/// Alert count for one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneCount {
    pub zone: String,
    pub count: usize,
}

/// Zone code to alert positions, derived from an alert list.
///
/// Buckets and their contents keep discovery order. The index is never
/// persisted; it is rebuilt from the alerts whenever they are loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneIndex {
    buckets: IndexMap<String, Vec<usize>>,
}

impl ZoneIndex {
    pub fn build(alerts: &[Alert]) -> Self {
        let mut buckets: IndexMap<String, Vec<usize>> = IndexMap::new();

        for (position, alert) in alerts.iter().enumerate() {
            let mut codes: IndexSet<&str> = IndexSet::new();
            if let Some(file) = alert.file.as_deref() {
                codes.extend(extract_zone_codes(file));
            }
            for value in alert.geocode_values() {
                codes.extend(extract_zone_codes(value));
            }
            for code in codes {
                buckets.entry(code.to_string()).or_default().push(position);
            }
        }

        Self { buckets }
    }

    /// Positions of the alerts in `zone`, in discovery order.
    pub fn get(&self, zone: &ZoneCode) -> &[usize] {
        self.buckets
            .get(zone.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn zones(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// The `limit` largest buckets, ties broken by zone code.
    pub fn top_zones(&self, limit: usize) -> Vec<ZoneCount> {
        let mut counts: Vec<ZoneCount> = self
            .buckets
            .iter()
            .map(|(zone, positions)| ZoneCount {
                zone: zone.clone(),
                count: positions.len(),
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.zone.cmp(&b.zone)));
        counts.truncate(limit);
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cap_parser::{AlertArea, AlertInfo, NameValue};

    fn cap(identifier: &str, zone: &str) -> Vec<u8> {
        format!(
            "<alert><identifier>{identifier}</identifier><info><area>\
             <geocode><valueName>AEMET</valueName><value>{zone}</value></geocode>\
             </area></info></alert>"
        )
        .into_bytes()
    }

    fn alert(file: &str, geocodes: &[&str]) -> Alert {
        Alert {
            file: Some(file.to_string()),
            infos: vec![AlertInfo {
                areas: vec![AlertArea {
                    geocodes: geocodes.iter().map(|g| NameValue::new("AEMET", *g)).collect(),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_zone_code_validation() {
        assert!(ZoneCode::parse("614102").is_ok());
        for bad in ["61410", "6141023", "61410a", "", " 614102", "６１４１０２"] {
            assert!(matches!(ZoneCode::parse(bad), Err(CacheError::InvalidZone(_))), "{bad}");
        }
        assert_eq!(ZoneCode::parse("614102").unwrap().area(), "61");
    }

    #[test]
    fn test_zone_code_serde() {
        let zone: ZoneCode = serde_json::from_str("\"614102\"").unwrap();
        assert_eq!(zone.as_str(), "614102");
        assert!(serde_json::from_str::<ZoneCode>("\"61410\"").is_err());
    }

    #[test]
    fn test_extract_zone_codes() {
        assert_eq!(extract_zone_codes("Z_CAP_C_LEMM_614102_x.xml"), vec!["614102"]);
        assert_eq!(extract_zone_codes("12345"), Vec::<&str>::new());
        assert_eq!(
            extract_zone_codes("20240101120000_AFAZ614102VI"),
            vec!["202401", "011200", "614102"]
        );
        assert_eq!(extract_zone_codes("a1234567b"), vec!["123456"]);
    }

    #[test]
    fn test_filename_match_wins() {
        let bundle = Bundle::Archive(vec![
            ArchiveEntry::new("Z_CAP_C_LEMM_614102_x.xml", cap("by-name", "614102")),
            ArchiveEntry::new("Z_CAP_C_LEMM_999999_y.xml", cap("by-geocode", "614102")),
        ]);
        let zone = ZoneCode::parse("614102").unwrap();

        let matches = match_zone("61", &bundle, &zone);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].matched_by, MatchedBy::FileName);
        assert_eq!(matches[0].alert.header.identifier.as_deref(), Some("by-name"));
        assert_eq!(matches[0].alert.area.as_deref(), Some("61"));
    }

    #[test]
    fn test_geocode_fallback() {
        let bundle = Bundle::Archive(vec![
            ArchiveEntry::new("a.xml", cap("other", "614103")),
            ArchiveEntry::new("b.xml", cap("hit", "ES614102")),
            ArchiveEntry::new("614102.txt", cap("not-xml", "614102")),
        ]);
        let zone = ZoneCode::parse("614102").unwrap();

        let matches = match_zone("61", &bundle, &zone);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].file, "b.xml");
        assert_eq!(matches[0].matched_by, MatchedBy::Geocode);
        assert_eq!(matches[0].matched_by.to_string(), "geocode");
    }

    #[test]
    fn test_raw_bundle_is_eligible() {
        let bundle = Bundle::Raw(ArchiveEntry::new("https://host/datos", cap("raw", "614102")));
        let zone = ZoneCode::parse("614102").unwrap();
        let matches = match_zone("61", &bundle, &zone);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].matched_by, MatchedBy::Geocode);
    }

    #[test]
    fn test_unparseable_entry_is_skipped() {
        let bundle = Bundle::Archive(vec![
            ArchiveEntry::new("x_614102.xml", b"<alert>".to_vec()),
            ArchiveEntry::new("y_614102.xml", cap("ok", "614102")),
        ]);
        let zone = ZoneCode::parse("614102").unwrap();
        let matches = match_zone("61", &bundle, &zone);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].file, "y_614102.xml");
    }

    #[test]
    fn test_index_collects_file_and_geocode_codes() {
        let alerts = vec![
            alert("Z_614102_a.xml", &["614102", "614103"]),
            alert("b.xml", &["614103"]),
        ];
        let index = ZoneIndex::build(&alerts);

        assert_eq!(index.get(&ZoneCode::parse("614102").unwrap()), &[0]);
        assert_eq!(index.get(&ZoneCode::parse("614103").unwrap()), &[0, 1]);
        assert!(index.get(&ZoneCode::parse("000000").unwrap()).is_empty());
        assert_eq!(index.len(), 2);
        assert_eq!(index.zones().collect::<Vec<_>>(), vec!["614102", "614103"]);
    }

    #[test]
    fn test_top_zones_ordering() {
        let alerts = vec![
            alert("a.xml", &["700001"]),
            alert("b.xml", &["700002", "700001"]),
            alert("c.xml", &["700003"]),
        ];
        let top = ZoneIndex::build(&alerts).top_zones(2);
        assert_eq!(
            top,
            vec![
                ZoneCount { zone: "700001".into(), count: 2 },
                ZoneCount { zone: "700002".into(), count: 1 },
            ]
        );
    }
}
