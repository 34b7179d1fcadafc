//! # xenolexia
//!
//! Ebook text extraction and foreign-word substitution for language
//! learning.
//!
//! ## Features
//!
//! - Read EPUB 2/3, FB2, PDF, MOBI/AZW and plain text into one normalized
//!   [`ParsedBook`]: metadata, chapters of plain text and a table of contents
//! - Replace a density-controlled sample of a chapter's words with
//!   translations, with byte-accurate spans for each replacement
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use xenolexia::{
//!     BookParser, DictionaryTranslator, Language, LanguagePair, ProficiencyLevel,
//!     TranslationEngine,
//! };
//!
//! let book = BookParser::new().parse_book("novel.epub")?;
//!
//! let pair = LanguagePair::new(Language::En, Language::Es);
//! let dictionary = DictionaryTranslator::new()
//!     .with_entry(pair, "house", "casa")
//!     .with_entry(pair, "dog", "perro");
//!
//! let engine = TranslationEngine::new(Arc::new(dictionary));
//! let processed = engine.process_chapter(&book.chapters[0], pair, ProficiencyLevel::Beginner, 0.2);
//! for word in &processed.foreign_words {
//!     assert_eq!(&processed.processed_content[word.start..word.end], word.foreign_word);
//! }
//! # Ok::<(), xenolexia::Error>(())
//! ```

pub mod book;
pub mod epub;
pub mod error;
pub mod fb2;
pub mod format;
pub mod import;
pub mod markup;
#[cfg(feature = "mobi")]
pub mod mobi;
pub mod normalize;
pub mod parser;
pub mod pdf;
pub mod translate;
pub(crate) mod util;

pub use book::{BookMetadata, Chapter, ParsedBook, TocItem};
pub use error::{Error, Result};
pub use format::Format;
pub use import::{BackendError, NativeBackend};
pub use markup::strip_markup;
pub use parser::{BookParser, ContentMode, ParserConfig, PdfLayout, parse_book};
pub use translate::{
    DictionaryTranslator, EngineConfig, ForeignWordData, Language, LanguagePair, PartOfSpeech,
    ProcessedChapter, ProficiencyLevel, Segment, TranslateError, TranslationEngine, Translator,
    WordEntry,
};
