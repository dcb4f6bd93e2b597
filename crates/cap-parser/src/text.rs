//! Byte-to-text decoding for payloads with unreliable charset labels.

/// Which decoding produced a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Latin1,
}

const BOM: char = '\u{feff}';

/// Whether a content-type or charset hint names the Latin-1 / ISO-8859 family.
pub fn hint_is_latin1(hint: &str) -> bool {
    let hint = hint.to_ascii_lowercase();
    hint.contains("iso-8859") || hint.contains("iso8859") || hint.contains("latin1") || hint.contains("latin-1")
}

/// Decode every byte as the code point of the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

pub fn replacement_count(text: &str) -> usize {
    text.chars().filter(|c| *c == char::REPLACEMENT_CHARACTER).count()
}

fn strip_bom(mut text: String) -> String {
    if text.starts_with(BOM) {
        text.drain(..BOM.len_utf8());
    }
    text
}

/// Decode a payload whose charset may be missing or wrong.
///
/// A Latin-1 hint is obeyed unconditionally. Otherwise the bytes are decoded
/// as both UTF-8 (lossy) and Latin-1, and whichever yields fewer replacement
/// characters wins; ties go to UTF-8.
pub fn decode_with_hint(bytes: &[u8], hint: Option<&str>) -> (String, TextEncoding) {
    if hint.is_some_and(hint_is_latin1) {
        return (strip_bom(decode_latin1(bytes)), TextEncoding::Latin1);
    }

    let utf8 = String::from_utf8_lossy(bytes).into_owned();
    let latin1 = decode_latin1(bytes);

    if replacement_count(&latin1) < replacement_count(&utf8) {
        (strip_bom(latin1), TextEncoding::Latin1)
    } else {
        (strip_bom(utf8), TextEncoding::Utf8)
    }
}

/// Decode an XML document body: strict UTF-8, Latin-1 only when UTF-8 fails.
pub fn decode_xml(bytes: &[u8]) -> (String, TextEncoding) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (strip_bom(text.to_string()), TextEncoding::Utf8),
        Err(_) => (strip_bom(decode_latin1(bytes)), TextEncoding::Latin1),
    }
}
