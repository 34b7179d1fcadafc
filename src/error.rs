//! Error types for xenolexia operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::format::Format;

/// Errors that can occur while extracting a book or one of its chapters.
///
/// Format-specific library errors (ZIP, XML, PDF) never escape an extractor:
/// they are folded into [`Error::InvalidDocument`] so callers only ever have
/// to match on this enum.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Book file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The format is recognized but no backend can read it in this build.
    #[error("No {format} backend available: {reason}")]
    BackendUnavailable { format: Format, reason: String },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Chapter index {index} out of range (book has {len} chapters)")]
    IndexOutOfRange { index: isize, len: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for both "unknown extension" and "no backend for this format".
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedFormat(_) | Error::BackendUnavailable { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::FileNotFound { .. })
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidDocument(msg.into())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::InvalidDocument(format!("ZIP: {e}"))
    }
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        Error::InvalidDocument(format!("XML: {e}"))
    }
}

impl From<lopdf::Error> for Error {
    fn from(e: lopdf::Error) -> Self {
        Error::InvalidDocument(format!("PDF: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
