//! Markup to plain text conversion.
//!
//! A small regex pipeline, not an HTML renderer: it is used to turn XHTML
//! chapter documents (and MOBI parts) into readable text, and to clean
//! chapter content right before word substitution.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::util::resolve_entity;

lazy_static! {
    /// Elements whose contents are never readable text.
    static ref DROPPED_BLOCKS: Regex =
        Regex::new(r"(?is)<(script|style|head|noscript)\b[^>]*>.*?</(script|style|head|noscript)\s*>")
            .unwrap();
    static ref COMMENTS: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
    static ref CDATA: Regex = Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").unwrap();
    static ref BLOCK_TAGS: Regex = Regex::new(
        r"(?i)</?(p|div|br|hr|h[1-6]|li|ul|ol|dl|dt|dd|tr|table|blockquote|section|article|aside|header|footer|nav|pre|figure|figcaption|title|body|html|mbp:pagebreak)\b[^>]*>"
    )
    .unwrap();
    static ref TAGS: Regex = Regex::new(r"<[a-zA-Z/!?][^>]*>").unwrap();
    static ref ENTITIES: Regex = Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,31});").unwrap();
    static ref HORIZONTAL_WS: Regex = Regex::new(r"[ \t\x0B\x0C]+").unwrap();
    static ref WS_AROUND_NEWLINE: Regex = Regex::new(r" ?\n ?").unwrap();
    static ref EXCESS_NEWLINES: Regex = Regex::new(r"\n{3,}").unwrap();
    static ref LOOKS_LIKE_MARKUP: Regex =
        Regex::new(r"(?i)<(!doctype|\?xml|html|body|p|div|span|br|h[1-6]|a|em|i|b|strong)\b[^>]*>").unwrap();
}

/// Convert markup to plain text.
///
/// Total over any input (including the empty string) and deterministic.
/// The result is a fixpoint: escaped markup such as `&lt;p&gt;` decodes to
/// a tag, so passes repeat until the text stops changing. No pass grows the
/// text, which bounds the loop.
pub fn strip_markup(input: &str) -> String {
    let mut text = strip_pass(input);
    loop {
        let next = strip_pass(&text);
        if next == text {
            return text;
        }
        text = next;
    }
}

fn strip_pass(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let text = DROPPED_BLOCKS.replace_all(input, "");
    let text = COMMENTS.replace_all(&text, "");
    let text = CDATA.replace_all(&text, "$1");
    let text = BLOCK_TAGS.replace_all(&text, "\n");
    let text = TAGS.replace_all(&text, "");
    let text = decode_entities(&text);

    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = HORIZONTAL_WS.replace_all(&text, " ");
    let text = WS_AROUND_NEWLINE.replace_all(&text, "\n");
    let text = EXCESS_NEWLINES.replace_all(&text, "\n\n");

    text.trim().to_string()
}

/// Decode named and numeric character references.
///
/// Unknown entities are left untouched.
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }
    ENTITIES.replace_all(input, |caps: &Captures| {
        resolve_entity(&caps[1])
            .map(Cow::into_owned)
            .unwrap_or_else(|| caps[0].to_string())
    })
}

/// Heuristic used before substitution: does this content still carry markup?
pub fn looks_like_markup(text: &str) -> bool {
    text.contains('<') && LOOKS_LIKE_MARKUP.is_match(text)
}
