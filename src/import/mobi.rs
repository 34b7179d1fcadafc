//! MOBI/AZW extractor.
//!
//! MOBI decoding is delegated to a [`NativeBackend`]. The extractor itself
//! only maps backend outcomes onto crate errors, so a missing backend and a
//! backend that rejected the file stay distinguishable.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use super::{ExtractedBook, Extractor};
use crate::book::ParsedBook;
use crate::error::{Error, Result};
use crate::format::Format;
use crate::parser::ParserConfig;

/// Outcome of a backend that could not produce a book.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend cannot run here (missing library, unsupported platform).
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend ran and rejected the file.
    #[error("{0}")]
    Failed(String),
}

/// A pluggable MOBI decoder.
pub trait NativeBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn extract(
        &self,
        path: &Path,
        data: &[u8],
        config: &ParserConfig,
    ) -> std::result::Result<ParsedBook, BackendError>;
}

/// Extractor for MOBI, AZW and AZW3 files.
#[derive(Clone, Default)]
pub struct MobiExtractor {
    backend: Option<Arc<dyn NativeBackend>>,
}

impl MobiExtractor {
    /// An extractor with no backend; every extraction reports
    /// [`Error::BackendUnavailable`].
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(backend: Arc<dyn NativeBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }
}

impl std::fmt::Debug for MobiExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MobiExtractor")
            .field("backend", &self.backend.as_ref().map(|b| b.name().to_string()))
            .finish()
    }
}

impl Extractor for MobiExtractor {
    fn format(&self) -> Format {
        Format::Mobi
    }

    fn extract(&self, path: &Path, data: &[u8], config: &ParserConfig) -> Result<ExtractedBook> {
        let Some(backend) = &self.backend else {
            return Err(Error::BackendUnavailable {
                format: Format::Mobi,
                reason: "no backend registered".into(),
            });
        };

        log::debug!("mobi: delegating {} to {}", path.display(), backend.name());
        match backend.extract(path, data, config) {
            Ok(book) => Ok(book.into()),
            Err(BackendError::Unavailable(reason)) => Err(Error::BackendUnavailable {
                format: Format::Mobi,
                reason,
            }),
            Err(BackendError::Failed(reason)) => Err(Error::InvalidDocument(format!(
                "{} backend: {reason}",
                backend.name()
            ))),
        }
    }
}
