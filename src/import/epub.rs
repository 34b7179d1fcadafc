//! EPUB extractor.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use super::{ExtractedBook, ExtractedChapter, Extractor};
use crate::book::TocItem;
use crate::epub::read_epub_from_reader;
use crate::error::Result;
use crate::format::Format;
use crate::markup::strip_markup;
use crate::parser::{ContentMode, ParserConfig};
use crate::util::normalize_href;

/// Reads EPUB 2 and EPUB 3 archives.
///
/// One chapter per spine document. Documents with no readable text are
/// dropped, unless every document is empty, in which case all of them are
/// kept so the book is never silently empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct EpubExtractor;

impl Extractor for EpubExtractor {
    fn format(&self) -> Format {
        Format::Epub
    }

    fn extract(&self, _path: &Path, data: &[u8], config: &ParserConfig) -> Result<ExtractedBook> {
        let doc = read_epub_from_reader(Cursor::new(data))?;
        let titles = titles_by_path(&doc.toc);

        let mut chapters: Vec<ExtractedChapter> = doc
            .documents
            .into_iter()
            .map(|document| {
                let plain = strip_markup(&document.source);
                let title = titles.get(&normalize_href(&document.href)).cloned();
                let chapter = match config.content_mode {
                    ContentMode::Plain => ExtractedChapter::plain(title, plain),
                    ContentMode::Markup => {
                        ExtractedChapter::markup(title, document.source, &plain)
                    }
                };
                chapter.with_href(document.href)
            })
            .collect();

        if chapters.iter().any(|c| c.word_count > 0) {
            let before = chapters.len();
            chapters.retain(|c| c.word_count > 0);
            if chapters.len() < before {
                log::debug!("epub: dropped {} empty spine documents", before - chapters.len());
            }
        } else if !chapters.is_empty() {
            log::warn!("epub: no spine document has text, keeping all {}", chapters.len());
        }

        Ok(ExtractedBook {
            metadata: doc.metadata,
            chapters,
            toc: doc.toc,
        })
    }
}

/// First TOC title for each content document, keyed by normalized path.
fn titles_by_path(toc: &[TocItem]) -> HashMap<String, String> {
    let mut titles = HashMap::new();
    for item in toc.iter().flat_map(|item| item.iter()) {
        if item.href.is_empty() {
            continue;
        }
        titles
            .entry(normalize_href(&item.href))
            .or_insert_with(|| item.title.clone());
    }
    titles
}
