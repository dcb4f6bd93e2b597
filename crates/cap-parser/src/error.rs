//! Error types for bundle decoding and CAP parsing.

use thiserror::Error;

/// Structural failures while unpacking a downloaded bundle.
///
/// Any of these means the buffer is not a usable archive; callers fall back
/// to treating the whole buffer as a single raw document.
#[derive(Debug, Error)]
pub enum BundleError {
    /// The gzip stream was truncated or corrupt.
    #[error("gzip decode failed: {0}")]
    Gzip(#[source] std::io::Error),

    /// The tar stream could not be read.
    #[error("tar read failed: {0}")]
    Tar(#[source] std::io::Error),

    /// The buffer produced no entries and is not an empty archive.
    #[error("buffer is not a tar archive")]
    NotAnArchive,
}

/// Failures while parsing one CAP document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The XML was malformed.
    #[error("xml error at byte {position}: {source}")]
    Xml {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    /// An element was opened but never closed.
    #[error("unexpected end of document inside <{0}>")]
    UnexpectedEof(String),

    /// A closing tag appeared with nothing open.
    #[error("unbalanced closing tag </{0}>")]
    Unbalanced(String),

    /// The document parsed but contained no `<alert>` element.
    #[error("no <alert> element found")]
    NoAlert,
}
