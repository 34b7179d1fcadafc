//! PDF text and metadata extraction via `lopdf`.

use lopdf::{Dictionary, Document, Object};

use crate::book::BookMetadata;
use crate::error::Result;

/// Text of each page plus the document information dictionary.
#[derive(Debug, Clone, Default)]
pub struct PdfDocument {
    pub metadata: BookMetadata,
    /// One entry per page in page order; pages without text are empty.
    pub pages: Vec<String>,
}

/// Load a PDF from memory and extract its page text.
///
/// Pages whose text cannot be extracted (unsupported fonts, images only)
/// come back empty rather than failing the whole document.
pub fn read_pdf(data: &[u8]) -> Result<PdfDocument> {
    let doc = Document::load_mem(data)?;

    let pages = doc
        .get_pages()
        .keys()
        .map(|&number| match doc.extract_text(&[number]) {
            Ok(text) => clean_page_text(&text),
            Err(e) => {
                log::warn!("pdf: no text on page {number}: {e}");
                String::new()
            }
        })
        .collect::<Vec<_>>();

    let metadata = read_metadata(&doc);
    log::debug!("pdf: {} pages", pages.len());

    Ok(PdfDocument { metadata, pages })
}

fn read_metadata(doc: &Document) -> BookMetadata {
    let mut meta = BookMetadata::default();

    if let Some(info) = trailer_dictionary(doc, b"Info") {
        let field = |key: &[u8]| info_string(doc, info, key);

        meta.title = field(b"Title").unwrap_or_default();
        meta.author = field(b"Author");
        meta.description = field(b"Subject");
        meta.publish_date = field(b"CreationDate").map(|d| pdf_date(&d));
        if let Some(keywords) = field(b"Keywords") {
            meta.subjects = keywords
                .split([',', ';'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
    }

    if let Some(catalog) = trailer_dictionary(doc, b"Root") {
        meta.language = info_string(doc, catalog, b"Lang");
    }

    meta
}

/// Look up a dictionary referenced from the trailer (`/Info`, `/Root`).
fn trailer_dictionary<'a>(doc: &'a Document, key: &[u8]) -> Option<&'a Dictionary> {
    match doc.trailer.get(key).ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn info_string(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    let object = match dict.get(key).ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let bytes = match object {
        Object::String(bytes, _) => bytes,
        _ => return None,
    };

    let text = decode_pdf_string(bytes);
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Decode a PDF text string: UTF-16BE with BOM, otherwise PDFDocEncoding
/// (approximated by Windows-1252).
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let (text, _) = encoding_rs::UTF_16BE.decode_without_bom_handling(utf16);
        return text.into_owned();
    }
    let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    text.into_owned()
}

/// `D:20240115093000+01'00'` -> `2024-01-15`; anything else passes through.
fn pdf_date(raw: &str) -> String {
    let digits = raw.strip_prefix("D:").unwrap_or(raw);
    let date: String = digits.chars().take_while(char::is_ascii_digit).take(8).collect();
    match date.len() {
        8 => format!("{}-{}-{}", &date[..4], &date[4..6], &date[6..8]),
        6 => format!("{}-{}", &date[..4], &date[4..6]),
        4 => date,
        _ => raw.to_string(),
    }
}

/// Trim each line and drop the trailing newline the extractor appends per
/// text object.
fn clean_page_text(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
