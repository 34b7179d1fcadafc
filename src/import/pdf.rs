//! PDF extractor.

use std::path::Path;

use super::{ExtractedBook, ExtractedChapter, Extractor};
use crate::error::Result;
use crate::format::Format;
use crate::parser::{ParserConfig, PdfLayout};
use crate::pdf::read_pdf;

/// Reads text-based PDFs. Documents without extractable text yield no
/// chapters rather than an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl Extractor for PdfExtractor {
    fn format(&self) -> Format {
        Format::Pdf
    }

    fn extract(&self, _path: &Path, data: &[u8], config: &ParserConfig) -> Result<ExtractedBook> {
        let doc = read_pdf(data)?;

        let chapters = match config.pdf_layout {
            PdfLayout::SingleChapter => {
                let text = doc
                    .pages
                    .iter()
                    .filter(|page| !page.is_empty())
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(&config.page_separator);
                let chapter = ExtractedChapter::plain(None, text);
                if chapter.word_count > 0 {
                    vec![chapter]
                } else {
                    Vec::new()
                }
            }
            PdfLayout::PagePerChapter => doc
                .pages
                .into_iter()
                .enumerate()
                .map(|(i, page)| ExtractedChapter::plain(Some(format!("Page {}", i + 1)), page))
                .filter(|chapter| chapter.word_count > 0)
                .collect(),
        };

        if chapters.is_empty() {
            log::warn!("pdf: no extractable text");
        }

        Ok(ExtractedBook {
            metadata: doc.metadata,
            chapters,
            toc: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::tests::build_pdf;

    #[test]
    fn test_single_chapter_joins_pages() {
        let bytes = build_pdf(&["First page", "", "Third page"], None);
        let book = PdfExtractor
            .extract(Path::new("doc.pdf"), &bytes, &ParserConfig::default())
            .unwrap();

        assert_eq!(book.chapters.len(), 1);
        let chapter = &book.chapters[0];
        assert_eq!(chapter.title, None);
        assert!(chapter.content.contains("First page"));
        assert!(chapter.content.contains("\n\n"));
        assert!(chapter.content.contains("Third page"));
        assert_eq!(chapter.word_count, 4);
    }

    #[test]
    fn test_page_per_chapter_skips_empty_pages() {
        let bytes = build_pdf(&["First page", "", "Third page"], None);
        let config = ParserConfig::default().with_pdf_layout(PdfLayout::PagePerChapter);
        let book = PdfExtractor
            .extract(Path::new("doc.pdf"), &bytes, &config)
            .unwrap();

        let titles: Vec<_> = book
            .chapters
            .iter()
            .map(|c| c.title.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(titles, vec!["Page 1", "Page 3"]);
    }

    #[test]
    fn test_custom_separator() {
        let bytes = build_pdf(&["alpha", "beta"], None);
        let config = ParserConfig::default().with_page_separator("\n---\n");
        let book = PdfExtractor
            .extract(Path::new("doc.pdf"), &bytes, &config)
            .unwrap();
        assert!(book.chapters[0].content.contains("\n---\n"));
    }

    #[test]
    fn test_no_text_gives_no_chapters() {
        let bytes = build_pdf(&["", ""], None);
        let book = PdfExtractor
            .extract(Path::new("scan.pdf"), &bytes, &ParserConfig::default())
            .unwrap();
        assert!(book.chapters.is_empty());
    }
}
