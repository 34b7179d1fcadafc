//! Built-in MOBI backend for PalmDOC-compressed and uncompressed books.
//!
//! Handles MOBI 6 and plain PalmDOC (`TEXtREAd`) databases: record table,
//! record 0 header, EXTH metadata, trailing-entry stripping, LZ77
//! decompression and CP1252/UTF-8 decoding. HUFF/CDIC compressed and
//! encrypted books are rejected.

mod headers;
mod palmdoc;

use std::path::Path;

use memchr::memmem;

use crate::book::{BookMetadata, Chapter, ParsedBook};
use crate::error::{Error, Result};
use crate::import::{BackendError, NativeBackend};
use crate::markup::strip_markup;
use crate::parser::{ContentMode, ParserConfig};
use crate::util::count_words;
use headers::{Compression, ExthHeader, MobiHeader, PdbInfo, strip_trailing_data};

const PAGE_BREAK: &[u8] = b"<mbp:pagebreak";

/// Decoded text stream and metadata of a MOBI file.
#[derive(Debug, Clone, Default)]
pub struct MobiText {
    pub metadata: BookMetadata,
    /// The full HTML text stream.
    pub html: String,
}

/// Read the metadata and the decompressed text stream of a MOBI file.
pub fn read_mobi(data: &[u8]) -> Result<MobiText> {
    let pdb = PdbInfo::parse(data)?;
    let record0 = pdb.record(data, 0)?;
    let header = MobiHeader::parse(record0)?;

    if header.encryption != 0 {
        return Err(Error::invalid("encrypted books are not supported"));
    }
    match header.compression {
        Compression::None | Compression::PalmDoc => {}
        Compression::Huffman => {
            return Err(Error::invalid("HUFF/CDIC compression is not supported"));
        }
        Compression::Unknown(n) => {
            return Err(Error::invalid(format!("unknown compression type {n}")));
        }
    }

    let mut text = Vec::new();
    for index in 1..=header.text_record_count as usize {
        let record = match pdb.record(data, index) {
            Ok(record) => record,
            Err(e) => {
                log::warn!("mobi: text stops at record {index}: {e}");
                break;
            }
        };
        let record = strip_trailing_data(record, header.extra_data_flags);
        match header.compression {
            Compression::PalmDoc => text.extend_from_slice(&palmdoc::decompress(record)),
            _ => text.extend_from_slice(record),
        }
    }

    let exth = header.exth(record0);
    let metadata = build_metadata(&pdb, &header, exth);
    log::debug!(
        "mobi: version {}, {} text records, {} bytes, {:?}",
        header.mobi_version,
        header.text_record_count,
        text.len(),
        header.encoding
    );

    Ok(MobiText {
        metadata,
        html: header.encoding.decode(&text),
    })
}

fn build_metadata(pdb: &PdbInfo, header: &MobiHeader, exth: Option<ExthHeader>) -> BookMetadata {
    let exth = exth.unwrap_or_default();
    let title = exth
        .title
        .or_else(|| Some(header.title.clone()).filter(|t| !t.is_empty()))
        .unwrap_or_else(|| pdb.name.replace('_', " ").trim().to_string());

    BookMetadata {
        title,
        author: (!exth.authors.is_empty()).then(|| exth.authors.join(", ")),
        description: exth.description,
        language: exth.language,
        publisher: exth.publisher,
        publish_date: exth.pub_date,
        isbn: exth.isbn,
        subjects: exth.subjects,
    }
}

/// Split the text stream at page-break markers.
///
/// Each part after the first starts with its marker tag, which the markup
/// stripper turns into a line break.
fn split_parts(html: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for pos in memmem::find_iter(html.as_bytes(), PAGE_BREAK) {
        if pos > start {
            parts.push(&html[start..pos]);
        }
        start = pos;
    }
    parts.push(&html[start..]);
    parts
}

/// PalmDOC/MOBI 6 reader registered as the default MOBI backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct PalmDocBackend;

impl PalmDocBackend {
    pub fn new() -> Self {
        Self
    }

    /// Read `data` into a book with one chapter per page-break part.
    pub fn read_book(&self, data: &[u8], config: &ParserConfig) -> Result<ParsedBook> {
        let MobiText { metadata, html } = read_mobi(data)?;

        let mut parts: Vec<(String, String)> = split_parts(&html)
            .into_iter()
            .map(|part| {
                let plain = strip_markup(part);
                let content = match config.content_mode {
                    ContentMode::Plain => plain.clone(),
                    ContentMode::Markup => part.to_string(),
                };
                (plain, content)
            })
            .filter(|(plain, _)| !plain.is_empty())
            .collect();

        if parts.is_empty() {
            let content = match config.content_mode {
                ContentMode::Plain => String::new(),
                ContentMode::Markup => html.clone(),
            };
            parts.push((String::new(), content));
        }

        let single = parts.len() == 1;
        let chapters: Vec<Chapter> = parts
            .into_iter()
            .enumerate()
            .map(|(index, (plain, content))| Chapter {
                id: Chapter::id_for(index),
                title: if single {
                    "Content".to_string()
                } else {
                    format!("Part {}", index + 1)
                },
                index,
                word_count: count_words(&plain),
                content,
                href: None,
            })
            .collect();

        let total_word_count = chapters.iter().map(|c| c.word_count).sum();
        Ok(ParsedBook {
            metadata,
            chapters,
            toc: Vec::new(),
            total_word_count,
        })
    }
}

impl NativeBackend for PalmDocBackend {
    fn name(&self) -> &str {
        "palmdoc"
    }

    fn extract(
        &self,
        _path: &Path,
        data: &[u8],
        config: &ParserConfig,
    ) -> std::result::Result<ParsedBook, BackendError> {
        self.read_book(data, config)
            .map_err(|e| BackendError::Failed(e.to_string()))
    }
}
