mod common;

use std::path::Path;
use std::sync::Arc;

use common::write_file;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use tempfile::TempDir;
use xenolexia::{
    BackendError, BookMetadata, BookParser, Chapter, Error, Format, NativeBackend, ParsedBook,
    ParserConfig, PdfLayout, parse_book,
};

// ============================================================================
// Format detection
// ============================================================================

#[test]
fn test_format_detection() {
    assert_eq!(Format::from_path("a/b/Book.EPUB").unwrap(), Format::Epub);
    assert_eq!(Format::from_path("story.fb2").unwrap(), Format::Fb2);
    assert_eq!(Format::from_path("kindle.azw3").unwrap(), Format::Mobi);
    assert_eq!(Format::from_path("kindle.azw").unwrap(), Format::Mobi);
    assert_eq!(Format::from_path("paper.pdf").unwrap(), Format::Pdf);
    assert_eq!(Format::from_path("notes.txt").unwrap(), Format::Txt);

    let err = Format::from_path("letter.docx").unwrap_err();
    assert!(err.is_unsupported());
    assert!(Format::from_path("README").unwrap_err().is_unsupported());
}

#[test]
fn test_missing_file() {
    let err = parse_book("/nonexistent/dir/book.epub").unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_file(dir.path(), "letter.docx", b"PK\x03\x04");

    let err = parse_book(&path).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat(_)), "got {err:?}");
}

// ============================================================================
// Plain text
// ============================================================================

#[test]
fn test_text_content_is_not_rewritten() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_file(dir.path(), "story.txt", b"  Once upon a time.\r\n");

    let book = parse_book(&path).expect("Failed to parse text");
    assert_eq!(book.chapters[0].title, "Content");
    assert_eq!(book.chapters[0].content, "  Once upon a time.\r\n");
    assert_eq!(book.metadata.title, "story");
}

#[test]
fn test_parse_text_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_file(
        dir.path(),
        "field-notes.txt",
        b"\xEF\xBB\xBFFirst line here.\r\n\r\nSecond paragraph.\r\n",
    );

    let book = parse_book(&path).expect("Failed to parse text");
    assert_eq!(book.metadata.title, "field-notes");
    assert_eq!(book.chapters.len(), 1);
    assert_eq!(book.chapters[0].title, "Content");
    assert_eq!(
        book.chapters[0].content,
        "First line here.\r\n\r\nSecond paragraph.\r\n"
    );
    assert_eq!(book.chapters[0].word_count, 5);
    assert_eq!(book.total_word_count, 5);
    assert!(book.toc.is_empty());
}

// ============================================================================
// FB2
// ============================================================================

const FB2_SECTIONS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<FictionBook xmlns="http://www.gribuser.ru/xml/fictionbook/2.0">
  <description>
    <title-info>
      <genre>adventure</genre>
      <author><first-name>Jules</first-name><last-name>Verne</last-name></author>
      <book-title>Island</book-title>
      <lang>fr</lang>
    </title-info>
  </description>
  <body>
    <section id="s1">
      <title><p>Storm</p></title>
      <p>The wind rose in the night.</p>
    </section>
    <section>
      <p>Nobody named this one.</p>
    </section>
  </body>
</FictionBook>"#;

#[test]
fn test_parse_fb2_sections() {
    let book = BookParser::new()
        .parse_bytes("island.fb2", FB2_SECTIONS.as_bytes())
        .expect("Failed to parse FB2");

    assert_eq!(book.metadata.title, "Island");
    assert_eq!(book.metadata.author.as_deref(), Some("Jules Verne"));
    assert_eq!(book.metadata.language.as_deref(), Some("fr"));
    assert_eq!(book.metadata.subjects, vec!["adventure"]);

    assert_eq!(book.chapters.len(), 2);
    assert_eq!(book.chapters[0].title, "Storm");
    assert!(book.chapters[0].content.contains("The wind rose in the night."));
    assert_eq!(book.chapters[1].title, "Section 2");
    assert_eq!(book.chapters[1].content, "Nobody named this one.");

    assert_eq!(book.toc.len(), 2);
    assert_eq!(book.toc[0].title, "Storm");
    assert_eq!(book.toc[0].chapter_index, Some(0));
    assert_eq!(book.toc[1].chapter_index, Some(1));
    assert!(book.toc.iter().all(|t| t.level == 0 && t.children.is_empty()));
}

#[test]
fn test_parse_fb2_without_sections() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<FictionBook xmlns="http://www.gribuser.ru/xml/fictionbook/2.0">
  <description><title-info><book-title>Short</book-title></title-info></description>
  <body>
    <p>Just one paragraph.</p>
    <p>And another.</p>
  </body>
</FictionBook>"#;

    let book = BookParser::new()
        .parse_bytes("short.fb2", xml.as_bytes())
        .expect("Failed to parse FB2");

    assert_eq!(book.chapters.len(), 1);
    assert_eq!(book.chapters[0].title, "Content");
    assert_eq!(book.chapters[0].content, "Just one paragraph.\n\nAnd another.");
    assert_eq!(book.total_word_count, 5);
}

#[test]
fn test_malformed_fb2_is_invalid() {
    let xml = "<FictionBook><body><section><p>open</section></body></FictionBook>";
    let err = BookParser::new()
        .parse_bytes("bad.fb2", xml.as_bytes())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidDocument(_)), "got {err:?}");
}

// ============================================================================
// PDF
// ============================================================================

fn build_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for text in pages {
        let operations = if text.is_empty() {
            Vec::new()
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::from(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

#[test]
fn test_parse_pdf_layouts() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let pdf = build_pdf(&["Alpha beta gamma", "", "Delta epsilon"]);
    let path = write_file(dir.path(), "report.pdf", &pdf);

    let book = parse_book(&path).expect("Failed to parse PDF");
    assert_eq!(book.metadata.title, "report");
    assert_eq!(book.chapters.len(), 1);
    assert!(book.chapters[0].content.contains("Alpha beta gamma"));
    assert!(book.chapters[0].content.contains("Delta epsilon"));
    assert_eq!(book.total_word_count, 5);

    let parser =
        BookParser::with_config(ParserConfig::default().with_pdf_layout(PdfLayout::PagePerChapter));
    let book = parser.parse_book(&path).expect("Failed to parse PDF");
    let titles: Vec<&str> = book.chapters.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["Page 1", "Page 3"]);
    assert_eq!(book.chapters[1].index, 1);
}

#[test]
fn test_pdf_without_text_has_no_chapters() {
    let book = BookParser::new()
        .parse_bytes("scan.pdf", &build_pdf(&["", ""]))
        .expect("Failed to parse PDF");
    assert!(book.chapters.is_empty());
    assert_eq!(book.total_word_count, 0);
}

#[test]
fn test_garbage_pdf_is_invalid() {
    let err = BookParser::new()
        .parse_bytes("junk.pdf", b"%PDF-1.4 truncated nonsense")
        .unwrap_err();
    assert!(matches!(err, Error::InvalidDocument(_)), "got {err:?}");
}

// ============================================================================
// MOBI backends
// ============================================================================

struct FixedBackend;

impl NativeBackend for FixedBackend {
    fn name(&self) -> &str {
        "fixed"
    }

    fn extract(
        &self,
        _path: &Path,
        data: &[u8],
        _config: &ParserConfig,
    ) -> Result<ParsedBook, BackendError> {
        if data.is_empty() {
            return Err(BackendError::Failed("empty file".into()));
        }
        Ok(ParsedBook {
            metadata: BookMetadata::new("From Backend"),
            chapters: vec![Chapter {
                id: String::new(),
                title: String::new(),
                index: 7,
                content: "Three short words".into(),
                word_count: 3,
                href: None,
            }],
            toc: Vec::new(),
            total_word_count: 0,
        })
    }
}

struct OfflineBackend;

impl NativeBackend for OfflineBackend {
    fn name(&self) -> &str {
        "offline"
    }

    fn extract(
        &self,
        _path: &Path,
        _data: &[u8],
        _config: &ParserConfig,
    ) -> Result<ParsedBook, BackendError> {
        Err(BackendError::Unavailable("library not installed".into()))
    }
}

#[test]
fn test_custom_mobi_backend_output_is_normalized() {
    let parser = BookParser::new().with_mobi_backend(Arc::new(FixedBackend));
    let book = parser
        .parse_bytes("novel.mobi", b"anything")
        .expect("Failed to parse MOBI");

    assert_eq!(book.metadata.title, "From Backend");
    assert_eq!(book.chapters[0].index, 0);
    assert_eq!(book.chapters[0].id, "chapter-0");
    assert_eq!(book.chapters[0].title, "Chapter 1");
    assert_eq!(book.total_word_count, 3);
}

#[test]
fn test_mobi_backend_errors() {
    let parser = BookParser::new().with_mobi_backend(Arc::new(FixedBackend));
    let err = parser.parse_bytes("empty.azw3", b"").unwrap_err();
    assert!(matches!(err, Error::InvalidDocument(_)), "got {err:?}");

    let parser = BookParser::new().with_mobi_backend(Arc::new(OfflineBackend));
    let err = parser.parse_bytes("novel.mobi", b"data").unwrap_err();
    assert!(matches!(err, Error::BackendUnavailable { format: Format::Mobi, .. }));

    let parser = BookParser::new().without_mobi_backend();
    let err = parser.parse_bytes("novel.azw", b"data").unwrap_err();
    assert!(err.is_unsupported(), "got {err:?}");
}

#[cfg(feature = "mobi")]
#[test]
fn test_builtin_backend_rejects_garbage() {
    let err = BookParser::new()
        .parse_bytes("broken.mobi", b"definitely not a palm database")
        .unwrap_err();
    assert!(matches!(err, Error::InvalidDocument(_)), "got {err:?}");
}
