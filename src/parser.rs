//! Parser facade: format detection, extraction and normalization.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::book::{BookMetadata, Chapter, ParsedBook, TocItem};
use crate::error::{Error, Result};
use crate::format::Format;
use crate::import::{
    EpubExtractor, Extractor, Fb2Extractor, MobiExtractor, NativeBackend, PdfExtractor,
    TextExtractor,
};
use crate::normalize::normalize;

/// What ends up in [`Chapter::content`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContentMode {
    /// Markup stripped, readable plain text.
    #[default]
    Plain,
    /// Source markup of EPUB and MOBI documents, untouched. Word counts
    /// still come from the plain text.
    Markup,
}

/// How PDF pages map onto chapters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PdfLayout {
    /// All pages joined into one chapter.
    #[default]
    SingleChapter,
    /// One chapter per page with text, titled `Page N`.
    PagePerChapter,
}

/// Extraction options.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParserConfig {
    pub content_mode: ContentMode,
    pub pdf_layout: PdfLayout,
    /// Inserted between PDF pages in [`PdfLayout::SingleChapter`].
    pub page_separator: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            content_mode: ContentMode::Plain,
            pdf_layout: PdfLayout::SingleChapter,
            page_separator: "\n\n".to_string(),
        }
    }
}

impl ParserConfig {
    pub fn with_content_mode(mut self, mode: ContentMode) -> Self {
        self.content_mode = mode;
        self
    }

    pub fn with_pdf_layout(mut self, layout: PdfLayout) -> Self {
        self.pdf_layout = layout;
        self
    }

    pub fn with_page_separator(mut self, separator: impl Into<String>) -> Self {
        self.page_separator = separator.into();
        self
    }
}

/// Reads book files into [`ParsedBook`]s.
///
/// Holds no per-call state, so one parser can be shared across threads.
///
/// ```no_run
/// use xenolexia::BookParser;
///
/// let parser = BookParser::new();
/// let book = parser.parse_book("novel.epub")?;
/// for chapter in &book.chapters {
///     println!("{}: {} words", chapter.title, chapter.word_count);
/// }
/// # Ok::<(), xenolexia::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct BookParser {
    config: ParserConfig,
    mobi: MobiExtractor,
}

impl Default for BookParser {
    fn default() -> Self {
        Self::new()
    }
}

impl BookParser {
    /// A parser with default options and the built-in MOBI backend (when
    /// the `mobi` feature is enabled).
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            config,
            mobi: default_mobi_extractor(),
        }
    }

    /// Register the backend used for MOBI/AZW files.
    pub fn with_mobi_backend(mut self, backend: Arc<dyn NativeBackend>) -> Self {
        self.mobi = MobiExtractor::with_backend(backend);
        self
    }

    /// Drop any MOBI backend; MOBI files then fail with
    /// [`Error::BackendUnavailable`].
    pub fn without_mobi_backend(mut self) -> Self {
        self.mobi = MobiExtractor::new();
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse the book at `path`.
    pub fn parse_book(&self, path: impl AsRef<Path>) -> Result<ParsedBook> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        // Detect before reading so unsupported files are never loaded
        Format::from_path(path)?;
        let data = fs::read(path)?;
        self.parse_bytes(path, &data)
    }

    /// Parse an in-memory book. `path_hint` selects the format and supplies
    /// the fallback title; it does not have to exist.
    pub fn parse_bytes(&self, path_hint: impl AsRef<Path>, data: &[u8]) -> Result<ParsedBook> {
        let path = path_hint.as_ref();
        let format = Format::from_path(path)?;
        log::debug!("parsing {} as {format} ({} bytes)", path.display(), data.len());

        let extracted = self.extractor(format).extract(path, data, &self.config)?;
        let book = normalize(extracted, path);

        log::info!(
            "parsed {}: {} chapters, {} words",
            path.display(),
            book.chapters.len(),
            book.total_word_count
        );
        Ok(book)
    }

    /// Parse the book and return chapter `index` (zero-based).
    ///
    /// Negative and past-the-end indices fail with
    /// [`Error::IndexOutOfRange`].
    pub fn get_chapter(&self, path: impl AsRef<Path>, index: isize) -> Result<Chapter> {
        let book = self.parse_book(path)?;
        let len = book.chapters.len();
        usize::try_from(index)
            .ok()
            .and_then(|i| book.chapters.into_iter().nth(i))
            .ok_or(Error::IndexOutOfRange { index, len })
    }

    pub fn get_table_of_contents(&self, path: impl AsRef<Path>) -> Result<Vec<TocItem>> {
        Ok(self.parse_book(path)?.toc)
    }

    pub fn get_metadata(&self, path: impl AsRef<Path>) -> Result<BookMetadata> {
        Ok(self.parse_book(path)?.metadata)
    }

    fn extractor(&self, format: Format) -> &dyn Extractor {
        match format {
            Format::Epub => &EpubExtractor,
            Format::Fb2 => &Fb2Extractor,
            Format::Mobi => &self.mobi,
            Format::Pdf => &PdfExtractor,
            Format::Txt => &TextExtractor,
        }
    }
}

#[cfg(feature = "mobi")]
fn default_mobi_extractor() -> MobiExtractor {
    MobiExtractor::with_backend(Arc::new(crate::mobi::PalmDocBackend::new()))
}

#[cfg(not(feature = "mobi"))]
fn default_mobi_extractor() -> MobiExtractor {
    MobiExtractor::new()
}

/// Parse a book with default options.
pub fn parse_book(path: impl AsRef<Path>) -> Result<ParsedBook> {
    BookParser::new().parse_book(path)
}
