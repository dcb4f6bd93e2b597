//! Bundle decoding: optional gzip layer, then tar extraction.

use std::borrow::Cow;
use std::io::{self, Cursor, Read};

use flate2::read::MultiGzDecoder;
use tracing::debug;

use crate::error::BundleError;
use crate::model::ArchiveEntry;

/// Leading bytes of every gzip stream.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// The result of opening a downloaded bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bundle {
    /// The buffer was a tar archive (possibly gzipped).
    Archive(Vec<ArchiveEntry>),
    /// The buffer was not an archive and is treated as one document.
    Raw(ArchiveEntry),
}

impl Bundle {
    pub fn is_raw(&self) -> bool {
        matches!(self, Bundle::Raw(_))
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        match self {
            Bundle::Archive(entries) => entries,
            Bundle::Raw(entry) => std::slice::from_ref(entry),
        }
    }

    pub fn into_entries(self) -> Vec<ArchiveEntry> {
        match self {
            Bundle::Archive(entries) => entries,
            Bundle::Raw(entry) => vec![entry],
        }
    }
}

pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// Decompress a full gzip stream into memory, including every concatenated
/// member.
pub fn gunzip(bytes: &[u8]) -> Result<Vec<u8>, BundleError> {
    let mut decoder = MultiGzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).map_err(BundleError::Gzip)?;
    Ok(out)
}

/// Extract every file entry from a tar stream, in archive order.
///
/// Extraction is all-or-nothing: the first structural error aborts the whole
/// archive. Zero-byte entries are kept. Directory entries carry no document
/// and are skipped. A buffer without a single tar header (including an empty
/// one) is not an archive.
pub fn extract_entries(bytes: &[u8]) -> Result<Vec<ArchiveEntry>, BundleError> {
    let mut archive = tar::Archive::new(Cursor::new(bytes));
    let mut entries = Vec::new();
    let mut headers = 0usize;

    for entry in archive.entries().map_err(BundleError::Tar)? {
        let mut entry = entry.map_err(BundleError::Tar)?;
        headers += 1;
        let name = entry
            .path()
            .map_err(BundleError::Tar)?
            .to_string_lossy()
            .into_owned();

        if entry.header().entry_type().is_dir() {
            debug!(entry = %name, "Skipping directory entry");
            continue;
        }

        let declared = entry.size();
        let mut buf = Vec::with_capacity(declared.min(bytes.len() as u64) as usize);
        entry.read_to_end(&mut buf).map_err(BundleError::Tar)?;
        if buf.len() as u64 != declared {
            return Err(BundleError::Tar(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("entry {} truncated at {} of {} bytes", name, buf.len(), declared),
            )));
        }
        entries.push(ArchiveEntry::new(name, buf));
    }

    // tar reads empty, short or all-zero buffers as an empty archive.
    if headers == 0 {
        return Err(BundleError::NotAnArchive);
    }

    Ok(entries)
}

/// Strict decode: gunzip when the magic bytes are present, then extract.
pub fn unpack(bytes: &[u8]) -> Result<Vec<ArchiveEntry>, BundleError> {
    if is_gzip(bytes) {
        extract_entries(&gunzip(bytes)?)
    } else {
        extract_entries(bytes)
    }
}

/// Open a bundle, falling back to a single raw document when the buffer is
/// not an archive.
///
/// A gzip layer that decodes cleanly is removed even on the raw path, so a
/// gzipped lone XML file becomes one readable document.
pub fn open_bundle(bytes: &[u8], raw_name: &str) -> Bundle {
    let payload: Cow<'_, [u8]> = if is_gzip(bytes) {
        match gunzip(bytes) {
            Ok(decoded) => Cow::Owned(decoded),
            Err(err) => {
                debug!(error = %err, "Gzip magic present but stream is invalid");
                Cow::Borrowed(bytes)
            }
        }
    } else {
        Cow::Borrowed(bytes)
    };

    match extract_entries(&payload) {
        Ok(entries) => Bundle::Archive(entries),
        Err(err) => {
            debug!(error = %err, document = raw_name, "Not an archive, using raw document");
            Bundle::Raw(ArchiveEntry::new(raw_name, payload.into_owned()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn build_tar(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap()
    }

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_detects_gzip_magic() {
        assert!(is_gzip(&[0x1f, 0x8b, 0x08]));
        assert!(!is_gzip(b"<alert/>"));
        assert!(!is_gzip(&[0x1f]));
    }

    #[test]
    fn test_extract_preserves_order_and_empty_entries() {
        let tar = build_tar(&[
            ("b.xml", &b"<b/>"[..]),
            ("empty.xml", &b""[..]),
            ("a.xml", &b"<a/>"[..]),
        ]);
        let entries = extract_entries(&tar).unwrap();

        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b.xml", "empty.xml", "a.xml"]);
        assert_eq!(entries[1].size, 0);
        assert_eq!(entries[0].bytes, b"<b/>");
    }

    #[test]
    fn test_unpack_gzipped_tar() {
        let tar = build_tar(&[("Z_CAP_C_LEMM_614102_x.xml", &b"<alert/>"[..])]);
        let entries = unpack(&gzip(&tar)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Z_CAP_C_LEMM_614102_x.xml");
    }

    #[test]
    fn test_plain_xml_is_not_an_archive() {
        let xml = b"<?xml version=\"1.0\"?><alert><identifier>x</identifier></alert>";
        assert!(unpack(xml).is_err());
    }

    #[test]
    fn test_truncated_archive_fails_whole_bundle() {
        let mut tar = build_tar(&[("a.xml", &[b'a'; 2000][..]), ("b.xml", &b"<b/>"[..])]);
        tar.truncate(900);
        assert!(extract_entries(&tar).is_err());
    }

    #[test]
    fn test_open_bundle_falls_back_to_raw_document() {
        let xml = b"<alert><identifier>x</identifier></alert>".to_vec();
        let bundle = open_bundle(&xml, "https://example.test/datos");
        assert!(bundle.is_raw());
        assert_eq!(bundle.entries()[0].name, "https://example.test/datos");
        assert_eq!(bundle.entries()[0].bytes, xml);
    }

    #[test]
    fn test_open_bundle_gunzips_raw_document() {
        let xml = b"<alert><identifier>x</identifier></alert>";
        let bundle = open_bundle(&gzip(xml), "raw.xml");
        assert!(bundle.is_raw());
        assert_eq!(bundle.entries()[0].bytes, xml.to_vec());
    }

    #[test]
    fn test_empty_buffer_is_not_an_archive() {
        assert!(matches!(extract_entries(b""), Err(BundleError::NotAnArchive)));
        assert!(matches!(extract_entries(&[0u8; 1024]), Err(BundleError::NotAnArchive)));
        assert!(unpack(&gzip(b"")).is_err());
    }

    #[test]
    fn test_directory_only_archive_stays_an_archive() {
        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Directory);
        header.set_size(0);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, "avisos/", &b""[..]).unwrap();
        let tar = builder.into_inner().unwrap();

        assert!(extract_entries(&tar).unwrap().is_empty());
        let bundle = open_bundle(&gzip(&tar), "https://example.test/datos");
        assert!(!bundle.is_raw());
        assert!(bundle.entries().is_empty());
    }

    #[test]
    fn test_multi_member_gzip_is_fully_decoded() {
        let tar = build_tar(&[("a.xml", &[b'a'; 600][..]), ("b.xml", &b"<b/>"[..])]);
        let mut bytes = gzip(&tar[..700]);
        bytes.extend(gzip(&tar[700..]));

        assert_eq!(gunzip(&bytes).unwrap(), tar);
        let bundle = open_bundle(&bytes, "https://example.test/datos");
        assert!(!bundle.is_raw());
        let names: Vec<_> = bundle.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.xml", "b.xml"]);
    }

    #[test]
    fn test_open_bundle_archive() {
        let tar = build_tar(&[("a.xml", &b"<a/>"[..]), ("b.xml", &b"<b/>"[..])]);
        let bundle = open_bundle(&gzip(&tar), "raw");
        assert!(!bundle.is_raw());
        assert_eq!(bundle.into_entries().len(), 2);
    }
}
