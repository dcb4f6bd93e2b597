//! Bundle decoding and CAP 1.2 parsing for meteorological alert feeds.
//!
//! The upstream service publishes each area's current alerts as a tar archive
//! (usually gzipped) of CAP XML documents. This crate turns those bytes into
//! normalized [`Alert`] records:
//!
//! ```text
//! bytes ──▶ open_bundle ──▶ ArchiveEntry* ──▶ decode_xml ──▶ parse_alerts ──▶ Alert*
//!            (gzip? tar?)                      (utf-8/latin-1)  (strict records)
//! ```
//!
//! Nothing here performs I/O; fetching and caching live in `alert-cache`.
//!
//! # Example
//!
//! ```rust
//! use cap_parser::{open_bundle, parse_bytes};
//!
//! let xml = br#"<alert><identifier>a-1</identifier><info><event>Viento</event></info></alert>"#;
//! let bundle = open_bundle(xml, "raw.xml");
//! assert!(bundle.is_raw());
//!
//! let alerts = parse_bytes(&bundle.entries()[0].bytes).unwrap();
//! assert_eq!(alerts[0].header.identifier.as_deref(), Some("a-1"));
//! assert_eq!(alerts[0].infos[0].event.as_deref(), Some("Viento"));
//! ```

mod bundle;
mod cap;
mod error;
mod model;
mod text;
mod xml;

pub use bundle::{extract_entries, gunzip, is_gzip, open_bundle, unpack, Bundle, GZIP_MAGIC};
pub use cap::{build_alert, build_area, build_header, build_info, parse_alerts};
pub use error::{BundleError, ParseError};
pub use model::{sha256_hex, Alert, AlertArea, AlertHeader, AlertInfo, ArchiveEntry, NameValue};
pub use text::{
    decode_latin1, decode_with_hint, decode_xml, hint_is_latin1, replacement_count, TextEncoding,
};
pub use xml::{parse_document, Element};

/// Decode an XML body and parse every alert in it.
pub fn parse_bytes(bytes: &[u8]) -> Result<Vec<Alert>, ParseError> {
    let (text, _) = decode_xml(bytes);
    parse_alerts(&text)
}

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
