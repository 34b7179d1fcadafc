//! EPUB container reading.

pub mod parser;
mod reader;

pub use reader::{EpubDocument, SpineDocument, read_epub_from_reader};
