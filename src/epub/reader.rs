use std::io::{Read, Seek};

use zip::ZipArchive;

use super::parser::{OpfData, parse_container_xml, parse_ncx, parse_nav, parse_opf};
use crate::book::{BookMetadata, TocItem};
use crate::error::{Error, Result};
use crate::util::{decode_xml, resolve_relative_path};

/// A content document from the spine, still in its source markup.
#[derive(Debug, Clone)]
pub struct SpineDocument {
    /// Manifest href, relative to the package document.
    pub href: String,
    pub media_type: String,
    pub source: String,
}

/// Everything the extractor needs from an EPUB archive.
#[derive(Debug, Clone)]
pub struct EpubDocument {
    pub metadata: BookMetadata,
    /// Spine documents present in the archive, in reading order.
    pub documents: Vec<SpineDocument>,
    /// TOC with hrefs made relative to the package document.
    pub toc: Vec<TocItem>,
}

/// Read an EPUB from any [`Read`] + [`Seek`] source.
///
/// Spine items whose archive entry is missing are skipped with a warning.
/// A broken navigation document only costs the TOC, not the book.
pub fn read_epub_from_reader<R: Read + Seek>(reader: R) -> Result<EpubDocument> {
    let mut archive = ZipArchive::new(reader)?;

    // 1. Find the OPF file path from container.xml
    let container = read_archive_file_bytes(&mut archive, "META-INF/container.xml")
        .map_err(|_| Error::invalid("missing META-INF/container.xml"))?;
    let opf_path = parse_container_xml(&container)?;
    let opf_dir = opf_path
        .rfind('/')
        .map(|i| opf_path[..i].to_string())
        .unwrap_or_default();

    // 2. Parse the OPF file
    let opf_bytes = read_archive_file_bytes(&mut archive, &opf_path)
        .map_err(|_| Error::invalid(format!("missing package document {opf_path}")))?;
    let opf = parse_opf(&decode_xml(&opf_bytes))?;

    // 3. Load spine documents
    let mut documents = Vec::new();
    for (id, item) in opf.reading_order() {
        let full_path = resolve_path(&opf_dir, &item.href);
        match read_archive_file_bytes(&mut archive, &full_path) {
            Ok(bytes) => documents.push(SpineDocument {
                href: item.href.clone(),
                media_type: item.media_type.clone(),
                source: decode_xml(&bytes).into_owned(),
            }),
            Err(e) => log::warn!("spine item {id:?} ({full_path}) unreadable: {e}"),
        }
    }

    // 4. Navigation: EPUB 3 nav first, NCX as fallback
    let toc = read_toc(&mut archive, &opf, &opf_dir);

    let OpfData { metadata, .. } = opf;
    Ok(EpubDocument {
        metadata,
        documents,
        toc,
    })
}

fn read_toc<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    opf: &OpfData,
    opf_dir: &str,
) -> Vec<TocItem> {
    let candidates = [
        (opf.nav_href.as_deref(), parse_nav as fn(&str) -> Result<Vec<TocItem>>),
        (opf.ncx_href.as_deref(), parse_ncx),
    ];

    for (href, parse) in candidates {
        let Some(href) = href else { continue };
        let nav_path = resolve_path(opf_dir, href);

        let parsed = read_archive_file_bytes(archive, &nav_path)
            .and_then(|bytes| parse(&decode_xml(&bytes)));
        match parsed {
            Ok(mut toc) if !toc.is_empty() => {
                rebase_toc(&mut toc, &nav_path, opf_dir);
                return toc;
            }
            Ok(_) => log::debug!("navigation document {nav_path} has no entries"),
            Err(e) => log::warn!("navigation document {nav_path} unusable: {e}"),
        }
    }

    Vec::new()
}

/// Rewrite hrefs from nav-relative to package-relative, so they compare
/// equal to manifest hrefs.
fn rebase_toc(toc: &mut [TocItem], nav_path: &str, opf_dir: &str) {
    for item in toc {
        if !item.href.is_empty() {
            let full = resolve_relative_path(nav_path, &item.href);
            item.href = if opf_dir.is_empty() {
                full
            } else {
                match full.strip_prefix(&format!("{opf_dir}/")) {
                    Some(rest) => rest.to_string(),
                    None => full,
                }
            };
        }
        rebase_toc(&mut item.children, nav_path, opf_dir);
    }
}

fn read_archive_file_bytes<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<Vec<u8>> {
    // Try direct lookup first
    match archive.by_name(path) {
        Ok(mut file) => {
            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            return Ok(contents);
        }
        Err(zip::result::ZipError::FileNotFound) => {}
        Err(e) => return Err(e.into()),
    }

    // Fallback: try percent-decoded path (handles malformed EPUBs)
    let decoded = percent_encoding::percent_decode_str(path)
        .decode_utf8()
        .map_err(|_| Error::invalid(format!("Invalid UTF-8 in path: {path}")))?;

    let mut file = archive.by_name(&decoded)?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)?;
    Ok(contents)
}

fn resolve_path(base: &str, href: &str) -> String {
    if base.is_empty() {
        resolve_relative_path("", href)
    } else {
        resolve_relative_path(&format!("{base}/"), href)
    }
}
