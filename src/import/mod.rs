//! Format extractors.
//!
//! Each supported [`Format`] has one [`Extractor`] that turns raw file bytes
//! into an [`ExtractedBook`]: metadata, chapters in reading order and a TOC
//! whose hrefs use the same form as the chapter hrefs. Ids, indices, TOC
//! levels and word totals are assigned afterwards by
//! [`normalize`](crate::normalize).

mod epub;
mod fb2;
mod mobi;
mod pdf;
mod text;

pub use epub::EpubExtractor;
pub use fb2::Fb2Extractor;
pub use mobi::{BackendError, MobiExtractor, NativeBackend};
pub use pdf::PdfExtractor;
pub use text::TextExtractor;

use std::path::Path;

use crate::book::{BookMetadata, ParsedBook, TocItem};
use crate::error::Result;
use crate::format::Format;
use crate::parser::ParserConfig;
use crate::util::count_words;

/// Polymorphic interface for format-specific extraction.
pub trait Extractor: Send + Sync {
    /// The format this extractor reads.
    fn format(&self) -> Format;

    /// Extract a book from the raw bytes of `path`.
    ///
    /// `path` is only a hint (fallback title, backend diagnostics); the
    /// bytes are the source of truth.
    fn extract(&self, path: &Path, data: &[u8], config: &ParserConfig) -> Result<ExtractedBook>;
}

/// A chapter before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedChapter {
    /// `None` lets the normalizer pick a positional title.
    pub title: Option<String>,
    pub content: String,
    /// Whitespace-delimited tokens of the chapter's plain text.
    pub word_count: usize,
    pub href: Option<String>,
}

impl ExtractedChapter {
    /// A chapter whose content is already plain text.
    pub fn plain(title: Option<String>, text: String) -> Self {
        Self {
            title,
            word_count: count_words(&text),
            content: text,
            href: None,
        }
    }

    /// A chapter that keeps its source markup but counts words of `plain`.
    pub fn markup(title: Option<String>, source: String, plain: &str) -> Self {
        Self {
            title,
            word_count: count_words(plain),
            content: source,
            href: None,
        }
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }
}

/// Extractor output, consumed by the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedBook {
    pub metadata: BookMetadata,
    pub chapters: Vec<ExtractedChapter>,
    pub toc: Vec<TocItem>,
}

impl From<ParsedBook> for ExtractedBook {
    fn from(book: ParsedBook) -> Self {
        Self {
            metadata: book.metadata,
            chapters: book
                .chapters
                .into_iter()
                .map(|c| ExtractedChapter {
                    title: Some(c.title).filter(|t| !t.trim().is_empty()),
                    content: c.content,
                    word_count: c.word_count,
                    href: c.href,
                })
                .collect(),
            toc: book.toc,
        }
    }
}
