//! Plain text extractor.

use std::path::Path;

use super::{ExtractedBook, ExtractedChapter, Extractor};
use crate::book::BookMetadata;
use crate::error::Result;
use crate::format::Format;
use crate::parser::ParserConfig;
use crate::util::{decode_text, strip_bom};

/// Reads `.txt` files as a single `"Content"` chapter holding the decoded
/// file text as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor;

impl Extractor for TextExtractor {
    fn format(&self) -> Format {
        Format::Txt
    }

    fn extract(&self, _path: &Path, data: &[u8], _config: &ParserConfig) -> Result<ExtractedBook> {
        let text = decode_text(strip_bom(data), None).into_owned();

        Ok(ExtractedBook {
            metadata: BookMetadata::default(),
            chapters: vec![ExtractedChapter::plain(Some("Content".into()), text)],
            toc: Vec::new(),
        })
    }
}
