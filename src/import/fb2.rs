//! FictionBook 2 extractor.

use std::path::Path;

use super::{ExtractedBook, ExtractedChapter, Extractor};
use crate::book::TocItem;
use crate::error::Result;
use crate::fb2::parse_fb2;
use crate::format::Format;
use crate::parser::ParserConfig;
use crate::util::decode_xml;

/// Reads `.fb2` documents: one chapter per top-level section of the main
/// body, with a flat TOC built from the section titles.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fb2Extractor;

impl Extractor for Fb2Extractor {
    fn format(&self) -> Format {
        Format::Fb2
    }

    fn extract(&self, _path: &Path, data: &[u8], _config: &ParserConfig) -> Result<ExtractedBook> {
        let text = decode_xml(data);
        let doc = parse_fb2(&text)?;

        if doc.sections.is_empty() {
            log::debug!("fb2: no sections, using the whole body");
            let content = doc.body_paragraphs.join("\n\n");
            return Ok(ExtractedBook {
                metadata: doc.metadata,
                chapters: vec![ExtractedChapter::plain(Some("Content".into()), content)],
                toc: Vec::new(),
            });
        }

        let mut chapters = Vec::with_capacity(doc.sections.len());
        let mut toc = Vec::with_capacity(doc.sections.len());
        for (index, section) in doc.sections.iter().enumerate() {
            let title = section
                .title
                .clone()
                .unwrap_or_else(|| format!("Section {}", index + 1));
            let href = section
                .id
                .as_ref()
                .map(|id| format!("#{id}"))
                .unwrap_or_default();

            let mut item = TocItem::new(title.clone(), href.clone());
            item.chapter_index = Some(index);
            toc.push(item);

            let chapter = ExtractedChapter::plain(Some(title), section.text());
            chapters.push(if href.is_empty() {
                chapter
            } else {
                chapter.with_href(href)
            });
        }

        Ok(ExtractedBook {
            metadata: doc.metadata,
            chapters,
            toc,
        })
    }
}
