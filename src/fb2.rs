//! FictionBook 2 (FB2) document parsing.
//!
//! FB2 is a single XML file: a `<description>` block with metadata
//! followed by one or more `<body>` elements holding a tree of
//! `<section>`s. Only the main body is read; bodies named `notes` or
//! `comments` hold footnotes and are skipped.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::book::BookMetadata;
use crate::error::Result;
use crate::util::{local_name, resolve_entity};

/// A top-level section of the main body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fb2Section {
    pub id: Option<String>,
    pub title: Option<String>,
    /// Paragraph text of this section and everything nested in it, depth-first.
    pub paragraphs: Vec<String>,
}

impl Fb2Section {
    pub fn text(&self) -> String {
        self.paragraphs.join("\n\n")
    }
}

#[derive(Debug, Clone, Default)]
pub struct Fb2Document {
    pub metadata: BookMetadata,
    pub sections: Vec<Fb2Section>,
    /// Every paragraph of the main body, in order, sections or not.
    pub body_paragraphs: Vec<String>,
}

#[derive(Default)]
struct AuthorName {
    first: Option<String>,
    middle: Option<String>,
    last: Option<String>,
    nickname: Option<String>,
}

impl AuthorName {
    /// "First Middle Last", or the nickname when no name parts are given.
    fn display(self) -> Option<String> {
        let parts: Vec<String> = [self.first, self.middle, self.last]
            .into_iter()
            .flatten()
            .collect();
        if parts.is_empty() {
            self.nickname
        } else {
            Some(parts.join(" "))
        }
    }
}

/// Text being collected for one element.
struct Capture {
    name: Vec<u8>,
    depth: usize,
    text: String,
}

/// Parse an FB2 document.
pub fn parse_fb2(content: &str) -> Result<Fb2Document> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    let mut doc = Fb2Document::default();
    let mut path: Vec<Vec<u8>> = Vec::new();

    let mut main_body_seen = false;
    let mut in_main_body = false;
    let mut section_depth = 0usize;
    let mut current: Option<Fb2Section> = None;
    let mut title_parts: Option<Vec<String>> = None;

    let mut capture: Option<Capture> = None;
    let mut author: Option<AuthorName> = None;
    let mut authors: Vec<String> = Vec::new();
    let mut annotation: Option<Vec<String>> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref()).to_vec();
                let in_title_info = contains(&path, b"title-info");
                let in_publish_info = contains(&path, b"publish-info");

                match local.as_slice() {
                    b"body" => {
                        let name = attribute(&e, b"name");
                        in_main_body = !main_body_seen
                            && !matches!(name.as_deref(), Some("notes") | Some("comments"));
                        main_body_seen |= in_main_body;
                    }
                    b"section" if in_main_body => {
                        section_depth += 1;
                        if section_depth == 1 {
                            current = Some(Fb2Section {
                                id: attribute(&e, b"id"),
                                ..Default::default()
                            });
                        }
                    }
                    b"title"
                        if in_main_body
                            && section_depth == 1
                            && path.last().is_some_and(|p| p == b"section") =>
                    {
                        title_parts = Some(Vec::new());
                    }
                    b"p" | b"v" | b"subtitle" | b"text-author" if in_main_body => {
                        start_capture(&mut capture, &local, path.len());
                    }
                    b"author" if in_title_info => author = Some(AuthorName::default()),
                    b"annotation" if in_title_info => annotation = Some(Vec::new()),
                    b"p" if annotation.is_some() => {
                        start_capture(&mut capture, &local, path.len());
                    }
                    b"first-name" | b"middle-name" | b"last-name" | b"nickname"
                        if author.is_some() =>
                    {
                        start_capture(&mut capture, &local, path.len());
                    }
                    b"book-title" | b"lang" | b"genre" | b"keywords" | b"date"
                        if in_title_info && author.is_none() =>
                    {
                        start_capture(&mut capture, &local, path.len());
                    }
                    b"publisher" | b"year" | b"isbn" if in_publish_info => {
                        start_capture(&mut capture, &local, path.len());
                    }
                    _ => {}
                }

                path.push(local);
            }
            Ok(Event::Empty(e)) => {
                // <date value="2004-01-01"/>
                if local_name(e.name().as_ref()) == b"date"
                    && contains(&path, b"title-info")
                    && doc.metadata.publish_date.is_none()
                {
                    doc.metadata.publish_date = attribute(&e, b"value");
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(cap) = capture.as_mut() {
                    cap.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(cap) = capture.as_mut() {
                    cap.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if let Some(cap) = capture.as_mut() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        cap.text.push_str(&resolved);
                    }
                }
            }
            Ok(Event::End(e)) => {
                path.pop();
                let name = e.name();
                let local = local_name(name.as_ref());

                if capture.as_ref().is_some_and(|c| c.depth == path.len()) {
                    if let Some(cap) = capture.take() {
                        let text = collapse_whitespace(&cap.text);
                        if in_main_body {
                            if !text.is_empty() {
                                match title_parts.as_mut() {
                                    Some(parts) => parts.push(text.clone()),
                                    None => {
                                        if let Some(section) = current.as_mut() {
                                            section.paragraphs.push(text.clone());
                                        }
                                    }
                                }
                                doc.body_paragraphs.push(text);
                            }
                        } else {
                            store_field(&mut doc.metadata, &mut author, &mut annotation, &cap.name, text);
                        }
                    }
                    continue;
                }

                match local {
                    b"title" if title_parts.is_some() && section_depth == 1 => {
                        if let Some(parts) = title_parts.take() {
                            let title = parts.join(" ");
                            if let Some(section) = current.as_mut()
                                && !title.is_empty()
                            {
                                section.title = Some(title);
                            }
                        }
                    }
                    b"section" if in_main_body && section_depth > 0 => {
                        section_depth -= 1;
                        if section_depth == 0
                            && let Some(section) = current.take()
                        {
                            doc.sections.push(section);
                        }
                    }
                    b"body" => in_main_body = false,
                    b"author" => {
                        if let Some(name) = author.take().and_then(AuthorName::display) {
                            authors.push(name);
                        }
                    }
                    b"annotation" => {
                        if let Some(parts) = annotation.take()
                            && !parts.is_empty()
                        {
                            doc.metadata.description = Some(parts.join("\n"));
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
    }

    if !authors.is_empty() {
        doc.metadata.author = Some(authors.join(", "));
    }

    log::debug!(
        "fb2: {} top-level sections, {} body paragraphs",
        doc.sections.len(),
        doc.body_paragraphs.len()
    );
    Ok(doc)
}

fn start_capture(capture: &mut Option<Capture>, name: &[u8], depth: usize) {
    if capture.is_none() {
        *capture = Some(Capture {
            name: name.to_vec(),
            depth,
            text: String::new(),
        });
    }
}

/// Store a finished description field.
fn store_field(
    meta: &mut BookMetadata,
    author: &mut Option<AuthorName>,
    annotation: &mut Option<Vec<String>>,
    name: &[u8],
    text: String,
) {
    if text.is_empty() {
        return;
    }

    if let Some(author) = author.as_mut() {
        match name {
            b"first-name" => author.first = Some(text),
            b"middle-name" => author.middle = Some(text),
            b"last-name" => author.last = Some(text),
            b"nickname" => author.nickname = Some(text),
            _ => {}
        }
        return;
    }

    match name {
        b"p" => {
            if let Some(parts) = annotation.as_mut() {
                parts.push(text);
            }
        }
        b"book-title" if meta.title.is_empty() => meta.title = text,
        b"lang" if meta.language.is_none() => meta.language = Some(text),
        b"genre" => meta.subjects.push(text),
        b"keywords" => meta.subjects.extend(
            text.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
        ),
        b"date" => meta.publish_date = Some(text),
        b"publisher" => meta.publisher = Some(text),
        b"year" if meta.publish_date.is_none() => meta.publish_date = Some(text),
        b"isbn" => meta.isbn = Some(text),
        _ => {}
    }
}

fn contains(path: &[Vec<u8>], name: &[u8]) -> bool {
    path.iter().any(|p| p == name)
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| local_name(a.key.as_ref()) == key)
        .map(|a| String::from_utf8_lossy(&a.value).trim().to_string())
        .filter(|v| !v.is_empty())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
