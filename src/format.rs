//! Book format detection.

use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Format {
    Epub,
    Fb2,
    Mobi,
    Pdf,
    Txt,
}

impl Format {
    /// Detect a format from a file path's extension (case-insensitive).
    ///
    /// Only the extension is consulted. A file named `.epub` that is not a
    /// ZIP archive is accepted here and rejected later by the extractor.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        Self::from_extension(&ext).ok_or_else(|| {
            if ext.is_empty() {
                Error::UnsupportedFormat(format!("no file extension: {}", path.display()))
            } else {
                Error::UnsupportedFormat(format!(".{ext}"))
            }
        })
    }

    /// Map a bare extension (without the dot) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "epub" => Some(Format::Epub),
            "fb2" => Some(Format::Fb2),
            "mobi" | "azw" | "azw3" => Some(Format::Mobi),
            "pdf" => Some(Format::Pdf),
            "txt" => Some(Format::Txt),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Format::Epub => "EPUB",
            Format::Fb2 => "FB2",
            Format::Mobi => "MOBI",
            Format::Pdf => "PDF",
            Format::Txt => "TXT",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
