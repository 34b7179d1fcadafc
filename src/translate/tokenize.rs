use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"[\p{Alphabetic}\p{M}\p{N}]+").unwrap();
}

/// A word in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// The word with its original casing.
    pub text: &'a str,
    pub lower: String,
    /// Byte range `[start, end)` in the source text.
    pub start: usize,
    pub end: usize,
}

/// Split `text` into runs of letters, combining marks and digits. Never
/// fails; punctuation and whitespace are not part of any token.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    WORD.find_iter(text)
        .map(|m| Token {
            text: m.as_str(),
            lower: m.as_str().to_lowercase(),
            start: m.start(),
            end: m.end(),
        })
        .collect()
}
