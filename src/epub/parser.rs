//! EPUB parsing utilities (container.xml, OPF, NCX, EPUB 3 nav)

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};

use crate::book::{BookMetadata, TocItem};
use crate::error::{Error, Result};
use crate::markup::decode_entities;
use crate::util::{local_name, resolve_entity, strip_bom};

/// A manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub href: String,
    pub media_type: String,
    pub properties: Option<String>,
}

impl ManifestItem {
    pub fn has_property(&self, name: &str) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|props| props.split_ascii_whitespace().any(|p| p == name))
    }
}

/// Parsed OPF package data.
#[derive(Debug, Default)]
pub struct OpfData {
    pub metadata: BookMetadata,
    /// Maps manifest id -> item
    pub manifest: HashMap<String, ManifestItem>,
    pub spine_ids: Vec<String>,
    /// EPUB 2 NCX, from `<spine toc="...">`
    pub ncx_href: Option<String>,
    /// EPUB 3 navigation document, from `properties="nav"`
    pub nav_href: Option<String>,
}

impl OpfData {
    /// Spine items in reading order, skipping idrefs missing from the manifest.
    pub fn reading_order(&self) -> impl Iterator<Item = (&str, &ManifestItem)> {
        self.spine_ids.iter().filter_map(|id| {
            let item = self.manifest.get(id);
            if item.is_none() {
                log::warn!("spine idref {id:?} not in manifest, skipping");
            }
            item.map(|item| (id.as_str(), item))
        })
    }
}

/// Parse META-INF/container.xml to find the OPF path.
pub fn parse_container_xml(bytes: &[u8]) -> Result<String> {
    let content = String::from_utf8_lossy(strip_bom(bytes));

    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if local_name(e.name().as_ref()) == b"rootfile" =>
            {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"full-path" {
                        let path = attr_value(&attr);
                        if !path.is_empty() {
                            return Ok(path);
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
    }

    Err(Error::invalid("No rootfile found in container.xml"))
}

/// Parse OPF package document.
pub fn parse_opf(content: &str) -> Result<OpfData> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    let mut metadata = BookMetadata::default();
    let mut authors: Vec<String> = Vec::new();
    let mut identifiers: Vec<(Option<String>, String)> = Vec::new();
    let mut manifest: HashMap<String, ManifestItem> = HashMap::new();
    let mut spine_ids: Vec<String> = Vec::new();
    let mut toc_id: Option<String> = None;

    let mut in_metadata = false;
    let mut current_element: Option<Vec<u8>> = None;
    let mut identifier_scheme: Option<String> = None;
    let mut buf_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                match local {
                    b"metadata" => in_metadata = true,
                    b"title" | b"creator" | b"language" | b"identifier" | b"publisher"
                    | b"description" | b"subject" | b"date"
                        if in_metadata =>
                    {
                        if local == b"identifier" {
                            identifier_scheme = e
                                .attributes()
                                .flatten()
                                .find(|a| local_name(a.key.as_ref()) == b"scheme")
                                .map(|a| attr_value(&a));
                        }
                        current_element = Some(local.to_vec());
                        buf_text.clear();
                    }
                    b"spine" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"toc" {
                                toc_id = Some(attr_value(&attr));
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"item" => {
                        let mut id = String::new();
                        let mut item = ManifestItem {
                            href: String::new(),
                            media_type: String::new(),
                            properties: None,
                        };

                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"id" => id = attr_value(&attr),
                                b"href" => item.href = attr_value(&attr),
                                b"media-type" => item.media_type = attr_value(&attr),
                                b"properties" => item.properties = Some(attr_value(&attr)),
                                _ => {}
                            }
                        }

                        if !id.is_empty() && !item.href.is_empty() {
                            manifest.insert(id, item);
                        }
                    }
                    b"itemref" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"idref" {
                                spine_ids.push(attr_value(&attr));
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                if current_element.is_some() {
                    buf_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::CData(e)) => {
                if current_element.is_some() {
                    buf_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if current_element.is_some() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        buf_text.push_str(&resolved);
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                if local == b"metadata" {
                    in_metadata = false;
                }

                if current_element.as_deref() == Some(local) {
                    let text = buf_text.trim().to_string();
                    if !text.is_empty() {
                        match local {
                            b"title" if metadata.title.is_empty() => metadata.title = text,
                            b"creator" => authors.push(text),
                            b"language" if metadata.language.is_none() => {
                                metadata.language = Some(text)
                            }
                            b"identifier" => identifiers.push((identifier_scheme.take(), text)),
                            b"publisher" => metadata.publisher = Some(text),
                            b"description" => metadata.description = Some(text),
                            b"subject" => metadata.subjects.push(text),
                            b"date" if metadata.publish_date.is_none() => {
                                metadata.publish_date = Some(text)
                            }
                            _ => {}
                        }
                    }
                    current_element = None;
                    buf_text.clear();
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
    }

    if !authors.is_empty() {
        metadata.author = Some(authors.join(", "));
    }
    metadata.isbn = identifiers
        .iter()
        .find_map(|(scheme, value)| isbn_from_identifier(scheme.as_deref(), value));

    let ncx_href = toc_id
        .and_then(|id| manifest.get(&id).map(|item| item.href.clone()))
        .or_else(|| {
            manifest
                .values()
                .find(|item| item.media_type == "application/x-dtbncx+xml")
                .map(|item| item.href.clone())
        });
    let nav_href = manifest
        .values()
        .find(|item| item.has_property("nav"))
        .map(|item| item.href.clone());

    Ok(OpfData {
        metadata,
        manifest,
        spine_ids,
        ncx_href,
        nav_href,
    })
}

/// Parse NCX table of contents.
///
/// Hrefs are returned as written (relative to the NCX file).
pub fn parse_ncx(content: &str) -> Result<Vec<TocItem>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    struct NavPointState {
        id: String,
        children: Vec<TocItem>,
        text: String,
        src: Option<String>,
    }

    let mut stack: Vec<NavPointState> = vec![NavPointState {
        id: String::new(),
        children: Vec::new(),
        text: String::new(),
        src: None,
    }];
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"navPoint" => {
                        let id = e
                            .attributes()
                            .flatten()
                            .find(|a| a.key.as_ref() == b"id")
                            .map(|a| attr_value(&a))
                            .unwrap_or_default();
                        stack.push(NavPointState {
                            id,
                            children: Vec::new(),
                            text: String::new(),
                            src: None,
                        });
                    }
                    b"text" => in_text = true,
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.name();
                if local_name(name.as_ref()) == b"content" {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"src"
                            && let Some(state) = stack.last_mut()
                        {
                            state.src = Some(attr_value(&attr));
                        }
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if in_text && let Some(state) = stack.last_mut() {
                    state.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_text && let Some(state) = stack.last_mut() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        state.text.push_str(&resolved);
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"text" => in_text = false,
                    b"navPoint" if stack.len() > 1 => {
                        if let Some(state) = stack.pop()
                            && let Some(parent) = stack.last_mut()
                        {
                            attach(&mut parent.children, state.id, &state.text, state.src, state.children);
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

    Ok(stack.swap_remove(0).children)
}

/// Parse an EPUB 3 navigation document, reading only the `toc` nav.
///
/// Hrefs are returned as written (relative to the nav document).
pub fn parse_nav(content: &str) -> Result<Vec<TocItem>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    struct ListItemState {
        id: String,
        children: Vec<TocItem>,
        text: String,
        href: Option<String>,
    }

    let mut in_toc_nav = false;
    let mut nav_depth = 0usize;
    let mut stack: Vec<ListItemState> = vec![ListItemState {
        id: String::new(),
        children: Vec::new(),
        text: String::new(),
        href: None,
    }];
    // Nesting depth inside the current label element (`a` or `span`)
    let mut label_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                if !in_toc_nav {
                    if local == b"nav" && is_toc_nav(&e) {
                        in_toc_nav = true;
                        nav_depth = 0;
                    }
                    continue;
                }

                if local == b"nav" {
                    nav_depth += 1;
                }
                if label_depth > 0 {
                    label_depth += 1;
                    continue;
                }

                match local {
                    b"li" => {
                        let id = e
                            .attributes()
                            .flatten()
                            .find(|a| a.key.as_ref() == b"id")
                            .map(|a| attr_value(&a))
                            .unwrap_or_default();
                        stack.push(ListItemState {
                            id,
                            children: Vec::new(),
                            text: String::new(),
                            href: None,
                        });
                    }
                    b"a" if stack.len() > 1 => {
                        label_depth = 1;
                        if let Some(state) = stack.last_mut() {
                            for attr in e.attributes().flatten() {
                                match attr.key.as_ref() {
                                    b"href" => state.href = Some(attr_value(&attr)),
                                    b"id" if state.id.is_empty() => state.id = attr_value(&attr),
                                    _ => {}
                                }
                            }
                        }
                    }
                    b"span" if stack.len() > 1 => {
                        if stack.last().is_some_and(|s| s.text.is_empty()) {
                            label_depth = 1;
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                if label_depth > 0 && let Some(state) = stack.last_mut() {
                    state.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if label_depth > 0 && let Some(state) = stack.last_mut() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        state.text.push_str(&resolved);
                    }
                }
            }
            Ok(Event::End(e)) => {
                if !in_toc_nav {
                    continue;
                }
                if label_depth > 0 {
                    label_depth -= 1;
                    continue;
                }

                let name = e.name();
                match local_name(name.as_ref()) {
                    b"li" if stack.len() > 1 => {
                        if let Some(state) = stack.pop()
                            && let Some(parent) = stack.last_mut()
                        {
                            attach(
                                &mut parent.children,
                                state.id,
                                &state.text,
                                Some(state.href.unwrap_or_default()),
                                state.children,
                            );
                        }
                    }
                    b"nav" => {
                        if nav_depth == 0 {
                            break;
                        }
                        nav_depth -= 1;
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
    }

    Ok(stack.swap_remove(0).children)
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

/// Attach a finished entry to its parent.
///
/// Entries without a label or a target are dropped, but their children are
/// hoisted so nothing below them is lost.
fn attach(
    parent: &mut Vec<TocItem>,
    id: String,
    text: &str,
    href: Option<String>,
    children: Vec<TocItem>,
) {
    let title = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match href {
        Some(href) if !title.is_empty() => {
            let mut item = TocItem::new(title, href).with_id(id);
            item.children = children;
            parent.push(item);
        }
        _ => parent.extend(children),
    }
}

fn is_toc_nav(e: &BytesStart<'_>) -> bool {
    e.attributes().flatten().any(|a| {
        local_name(a.key.as_ref()) == b"type"
            && a.value
                .split(|b| b.is_ascii_whitespace())
                .any(|v| v == b"toc")
    })
}

/// Attribute value with character references decoded.
fn attr_value(attr: &Attribute<'_>) -> String {
    let raw = String::from_utf8_lossy(&attr.value);
    decode_entities(&raw).trim().to_string()
}

/// Extract an ISBN from a `dc:identifier`, if it is one.
fn isbn_from_identifier(scheme: Option<&str>, value: &str) -> Option<String> {
    if scheme.is_some_and(|s| s.eq_ignore_ascii_case("isbn")) {
        return Some(value.to_string());
    }
    let lower = value.to_ascii_lowercase();
    ["urn:isbn:", "isbn:"]
        .iter()
        .find(|prefix| lower.starts_with(*prefix))
        .map(|prefix| value[prefix.len()..].trim().to_string())
}
