//! Shared text, encoding and path helpers.

use std::borrow::Cow;
use std::path::Path;

/// Decode bytes to a string, handling various encodings.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. If malformed, tries the hint encoding (from `<?xml encoding="..."?>`)
/// 3. Falls back to Windows-1252 (common in old ebooks)
///
/// Uses `Cow<str>` to avoid allocation when the input is valid UTF-8.
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Decode an XML document, honoring its declared encoding as a fallback.
pub fn decode_xml(bytes: &[u8]) -> Cow<'_, str> {
    decode_text(bytes, extract_xml_encoding(bytes))
}

/// Extract encoding from XML declaration.
///
/// Parses `<?xml ... encoding="..." ?>` within the first ~100 bytes.
pub fn extract_xml_encoding(bytes: &[u8]) -> Option<&str> {
    let check_len = bytes.len().min(100);
    let prefix = &bytes[..check_len];

    let xml_start = prefix.windows(5).position(|w| w == b"<?xml")?;
    let after_xml = &prefix[xml_start..];

    let enc_pos = after_xml
        .windows(9)
        .position(|w| w.eq_ignore_ascii_case(b"encoding="))?;
    let after_enc = &after_xml[enc_pos + 9..];

    let quote = *after_enc.first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let value_end = after_enc[1..].iter().position(|&b| b == quote)? + 1;
    std::str::from_utf8(&after_enc[1..value_end]).ok()
}

/// Strip UTF-8 BOM if present.
pub fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data)
}

/// Extract local name from namespaced XML name (e.g., "dc:title" -> "title").
pub fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

/// Resolve an entity name (without `&` and `;`) to its text.
///
/// Covers the XML five, the typographic entities common in ebooks, and
/// numeric `#NNNN` / `#xHHHH` references.
pub fn resolve_entity(entity: &str) -> Option<Cow<'static, str>> {
    let named = match entity {
        "apos" => "'",
        "quot" => "\"",
        "lt" => "<",
        "gt" => ">",
        "amp" => "&",
        "nbsp" => "\u{00A0}",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "hellip" => "\u{2026}",
        "copy" => "\u{00A9}",
        "reg" => "\u{00AE}",
        "trade" => "\u{2122}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201C}",
        "rdquo" => "\u{201D}",
        "laquo" => "\u{00AB}",
        "raquo" => "\u{00BB}",
        "shy" => "\u{00AD}",
        "bull" => "\u{2022}",
        "middot" => "\u{00B7}",
        "deg" => "\u{00B0}",
        "times" => "\u{00D7}",
        "euro" => "\u{20AC}",
        "pound" => "\u{00A3}",
        "sect" => "\u{00A7}",
        "para" => "\u{00B6}",
        _ => "",
    };
    if !named.is_empty() {
        return Some(Cow::Borrowed(named));
    }

    let code = if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        entity.strip_prefix('#')?.parse::<u32>().ok()?
    };

    char::from_u32(code).map(|c| Cow::Owned(c.to_string()))
}

/// Count whitespace-delimited tokens.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Filename without directories or extension, used as a fallback title.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Normalize an archive path for comparison.
///
/// Backslashes become forward slashes, a leading slash and any `#fragment`
/// are removed, and the result is lowercased.
pub fn normalize_href(href: &str) -> String {
    let path = href.split('#').next().unwrap_or(href);
    path.replace('\\', "/")
        .trim_start_matches('/')
        .to_lowercase()
}

/// Resolve `relative` against the directory of `base`.
///
/// For example, if base is "OEBPS/text/nav.xhtml" and relative is
/// "../ch01.xhtml#p1", the result is "OEBPS/ch01.xhtml#p1". Fragment-only
/// references resolve to the base file itself.
pub fn resolve_relative_path(base: &str, relative: &str) -> String {
    let relative = relative.trim();
    if relative.contains("://") {
        return relative.to_string();
    }
    if relative.starts_with('#') {
        return format!("{base}{relative}");
    }

    let (path, fragment) = match relative.find('#') {
        Some(pos) => (&relative[..pos], &relative[pos..]),
        None => (relative, ""),
    };

    let mut parts: Vec<&str> = if path.starts_with('/') {
        Vec::new()
    } else {
        let mut dir: Vec<&str> = base.split('/').collect();
        dir.pop();
        dir
    };

    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }

    let mut resolved = parts.join("/");
    resolved.push_str(fragment);
    resolved
}
