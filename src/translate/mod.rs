//! Foreign-word substitution.
//!
//! [`TranslationEngine`] replaces a density-controlled sample of a chapter's
//! words with translations from a [`Translator`] and reports where each
//! replacement landed in the processed text.

mod dictionary;
mod engine;
mod tokenize;

pub use dictionary::DictionaryTranslator;
pub use engine::{EngineConfig, TranslationEngine};
pub use tokenize::{Token, tokenize};

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::book::Chapter;

/// Supported languages, by ISO 639-1 code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Language {
    En,
    El,
    Es,
    Fr,
    De,
    It,
    Pt,
    Ru,
    Ja,
    Zh,
    Ko,
    Ar,
    Nl,
    Pl,
    Tr,
    Sv,
    Da,
    Fi,
    No,
    Cs,
    Hu,
    Ro,
    Uk,
    He,
    Hi,
    Th,
    Vi,
    Id,
}

impl Language {
    pub const ALL: [Language; 28] = [
        Language::En,
        Language::El,
        Language::Es,
        Language::Fr,
        Language::De,
        Language::It,
        Language::Pt,
        Language::Ru,
        Language::Ja,
        Language::Zh,
        Language::Ko,
        Language::Ar,
        Language::Nl,
        Language::Pl,
        Language::Tr,
        Language::Sv,
        Language::Da,
        Language::Fi,
        Language::No,
        Language::Cs,
        Language::Hu,
        Language::Ro,
        Language::Uk,
        Language::He,
        Language::Hi,
        Language::Th,
        Language::Vi,
        Language::Id,
    ];

    /// ISO 639-1 code.
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::El => "el",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::De => "de",
            Language::It => "it",
            Language::Pt => "pt",
            Language::Ru => "ru",
            Language::Ja => "ja",
            Language::Zh => "zh",
            Language::Ko => "ko",
            Language::Ar => "ar",
            Language::Nl => "nl",
            Language::Pl => "pl",
            Language::Tr => "tr",
            Language::Sv => "sv",
            Language::Da => "da",
            Language::Fi => "fi",
            Language::No => "no",
            Language::Cs => "cs",
            Language::Hu => "hu",
            Language::Ro => "ro",
            Language::Uk => "uk",
            Language::He => "he",
            Language::Hi => "hi",
            Language::Th => "th",
            Language::Vi => "vi",
            Language::Id => "id",
        }
    }

    /// English display name.
    pub fn name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::El => "Greek",
            Language::Es => "Spanish",
            Language::Fr => "French",
            Language::De => "German",
            Language::It => "Italian",
            Language::Pt => "Portuguese",
            Language::Ru => "Russian",
            Language::Ja => "Japanese",
            Language::Zh => "Chinese",
            Language::Ko => "Korean",
            Language::Ar => "Arabic",
            Language::Nl => "Dutch",
            Language::Pl => "Polish",
            Language::Tr => "Turkish",
            Language::Sv => "Swedish",
            Language::Da => "Danish",
            Language::Fi => "Finnish",
            Language::No => "Norwegian",
            Language::Cs => "Czech",
            Language::Hu => "Hungarian",
            Language::Ro => "Romanian",
            Language::Uk => "Ukrainian",
            Language::He => "Hebrew",
            Language::Hi => "Hindi",
            Language::Th => "Thai",
            Language::Vi => "Vietnamese",
            Language::Id => "Indonesian",
        }
    }

    /// Written right to left.
    pub fn is_rtl(self) -> bool {
        matches!(self, Language::Ar | Language::He)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = TranslateError;

    /// Accepts a code (`"es"`, `"ES"`), a region-tagged code (`"pt-BR"`)
    /// or an English name (`"Spanish"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let primary = s.split(['-', '_']).next().unwrap_or(s);
        Language::ALL
            .into_iter()
            .find(|lang| {
                lang.code().eq_ignore_ascii_case(primary) || lang.name().eq_ignore_ascii_case(s)
            })
            .ok_or_else(|| TranslateError::UnknownLanguage(s.to_string()))
    }
}

/// Source and target language of a substitution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LanguagePair {
    pub source: Language,
    pub target: Language,
}

impl LanguagePair {
    pub fn new(source: Language, target: Language) -> Self {
        Self { source, target }
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.source, self.target)
    }
}

/// Learner proficiency tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum ProficiencyLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl FromStr for ProficiencyLevel {
    type Err = TranslateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(ProficiencyLevel::Beginner),
            "intermediate" => Ok(ProficiencyLevel::Intermediate),
            "advanced" => Ok(ProficiencyLevel::Advanced),
            other => Err(TranslateError::Invalid(format!(
                "unknown proficiency level: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Pronoun,
    Preposition,
    Conjunction,
    Interjection,
    Article,
    #[default]
    Other,
}

impl FromStr for PartOfSpeech {
    type Err = TranslateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "noun" | "n" => PartOfSpeech::Noun,
            "verb" | "v" => PartOfSpeech::Verb,
            "adjective" | "adj" => PartOfSpeech::Adjective,
            "adverb" | "adv" => PartOfSpeech::Adverb,
            "pronoun" | "pron" => PartOfSpeech::Pronoun,
            "preposition" | "prep" => PartOfSpeech::Preposition,
            "conjunction" | "conj" => PartOfSpeech::Conjunction,
            "interjection" | "interj" => PartOfSpeech::Interjection,
            "article" | "art" => PartOfSpeech::Article,
            "other" | "" => PartOfSpeech::Other,
            other => {
                return Err(TranslateError::Invalid(format!(
                    "unknown part of speech: {other}"
                )));
            }
        })
    }
}

/// A resolved translation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WordEntry {
    pub source_word: String,
    pub target_word: String,
    pub source_language: Language,
    pub target_language: Language,
    pub proficiency: ProficiencyLevel,
    /// Position in a frequency list, when the translator knows it.
    pub frequency_rank: Option<u32>,
    pub part_of_speech: PartOfSpeech,
}

impl WordEntry {
    pub fn new(
        source_word: impl Into<String>,
        target_word: impl Into<String>,
        pair: LanguagePair,
    ) -> Self {
        Self {
            source_word: source_word.into(),
            target_word: target_word.into(),
            source_language: pair.source,
            target_language: pair.target,
            proficiency: ProficiencyLevel::default(),
            frequency_rank: None,
            part_of_speech: PartOfSpeech::default(),
        }
    }
}

/// One substitution in a processed chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForeignWordData {
    /// The replaced word as it appeared in the text.
    pub original_word: String,
    /// The text written in its place.
    pub foreign_word: String,
    /// Byte offset into [`ProcessedChapter::processed_content`].
    pub start: usize,
    /// Exclusive end byte offset.
    pub end: usize,
    pub word_entry: WordEntry,
}

/// A chapter with some of its words replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessedChapter {
    pub chapter: Chapter,
    /// Sorted by position, never overlapping.
    pub foreign_words: Vec<ForeignWordData>,
    pub processed_content: String,
}

/// A piece of a processed chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Foreign(&'a ForeignWordData),
}

impl ProcessedChapter {
    /// The processed text split into plain runs and substitutions, in order.
    pub fn segments(&self) -> Vec<Segment<'_>> {
        let mut segments = Vec::with_capacity(self.foreign_words.len() * 2 + 1);
        let mut cursor = 0;
        for word in &self.foreign_words {
            if word.start > cursor {
                segments.push(Segment::Text(&self.processed_content[cursor..word.start]));
            }
            segments.push(Segment::Foreign(word));
            cursor = word.end;
        }
        if cursor < self.processed_content.len() {
            segments.push(Segment::Text(&self.processed_content[cursor..]));
        }
        segments
    }

    /// Substitution ranges in characters instead of bytes.
    pub fn char_spans(&self) -> Vec<(usize, usize)> {
        let mut spans = Vec::with_capacity(self.foreign_words.len());
        let mut chars = 0;
        let mut byte = 0;
        for word in &self.foreign_words {
            chars += self.processed_content[byte..word.start].chars().count();
            let start = chars;
            chars += self.processed_content[word.start..word.end].chars().count();
            spans.push((start, chars));
            byte = word.end;
        }
        spans
    }

    /// Every span is in bounds, non-empty, ordered, and covers its foreign
    /// word exactly.
    pub fn spans_are_valid(&self) -> bool {
        let mut previous_end = 0;
        self.foreign_words.iter().all(|word| {
            let ok = word.start >= previous_end
                && word.start < word.end
                && self.processed_content.get(word.start..word.end) == Some(word.foreign_word.as_str());
            previous_end = word.end;
            ok
        })
    }
}

/// Why a single word could not be translated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    #[error("no translation for {word:?} ({pair})")]
    NotFound { word: String, pair: LanguagePair },

    #[error("unknown language: {0}")]
    UnknownLanguage(String),

    #[error("translation service error: {0}")]
    Service(String),

    #[error("{0}")]
    Invalid(String),
}

/// The word-to-word translation service.
///
/// Implementations must be thread-safe; the engine calls them from whatever
/// thread processes a chapter.
pub trait Translator: Send + Sync {
    fn translate(&self, word: &str, source: Language, target: Language)
    -> Result<String, TranslateError>;

    /// Translate several words. Words that fail are left out of the map.
    fn translate_batch(
        &self,
        words: &[&str],
        source: Language,
        target: Language,
    ) -> HashMap<String, String> {
        words
            .iter()
            .filter_map(|&word| {
                self.translate(word, source, target)
                    .ok()
                    .map(|translated| (word.to_string(), translated))
            })
            .collect()
    }

    /// Resolve a word into a full entry. Translators that know parts of
    /// speech or frequency ranks override this.
    fn lookup(&self, word: &str, pair: LanguagePair) -> Result<WordEntry, TranslateError> {
        let translated = self.translate(word, pair.source, pair.target)?;
        Ok(WordEntry::new(word, translated, pair))
    }
}

impl<T: Translator + ?Sized> Translator for std::sync::Arc<T> {
    fn translate(
        &self,
        word: &str,
        source: Language,
        target: Language,
    ) -> Result<String, TranslateError> {
        (**self).translate(word, source, target)
    }

    fn translate_batch(
        &self,
        words: &[&str],
        source: Language,
        target: Language,
    ) -> HashMap<String, String> {
        (**self).translate_batch(words, source, target)
    }

    fn lookup(&self, word: &str, pair: LanguagePair) -> Result<WordEntry, TranslateError> {
        (**self).lookup(word, pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processed(content: &str, words: &[(&str, usize)]) -> ProcessedChapter {
        let pair = LanguagePair::new(Language::En, Language::Es);
        ProcessedChapter {
            chapter: Chapter {
                id: Chapter::id_for(0),
                title: "T".into(),
                index: 0,
                content: String::new(),
                word_count: 0,
                href: None,
            },
            foreign_words: words
                .iter()
                .map(|&(word, start)| ForeignWordData {
                    original_word: word.into(),
                    foreign_word: word.into(),
                    start,
                    end: start + word.len(),
                    word_entry: WordEntry::new(word, word, pair),
                })
                .collect(),
            processed_content: content.into(),
        }
    }

    #[test]
    fn test_language_codes() {
        assert_eq!(Language::ALL.len(), 28);
        for lang in Language::ALL {
            assert_eq!(lang.code().parse::<Language>().unwrap(), lang);
        }
        assert_eq!("ES".parse::<Language>().unwrap(), Language::Es);
        assert_eq!("pt-BR".parse::<Language>().unwrap(), Language::Pt);
        assert_eq!("german".parse::<Language>().unwrap(), Language::De);
        assert!("xx".parse::<Language>().is_err());
        assert!(Language::He.is_rtl());
        assert_eq!(LanguagePair::new(Language::En, Language::Fr).to_string(), "en-fr");
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("Advanced".parse::<ProficiencyLevel>().unwrap(), ProficiencyLevel::Advanced);
        assert!("expert".parse::<ProficiencyLevel>().is_err());
        assert_eq!("adj".parse::<PartOfSpeech>().unwrap(), PartOfSpeech::Adjective);
        assert_eq!("".parse::<PartOfSpeech>().unwrap(), PartOfSpeech::Other);
    }

    #[test]
    fn test_segments() {
        let chapter = processed("el gato y el perro", &[("gato", 3), ("perro", 13)]);
        let segments = chapter.segments();
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0], Segment::Text("el "));
        assert!(matches!(segments[1], Segment::Foreign(w) if w.foreign_word == "gato"));
        assert_eq!(segments[2], Segment::Text(" y el "));
        assert!(matches!(segments[3], Segment::Foreign(w) if w.foreign_word == "perro"));
        assert!(chapter.spans_are_valid());
    }

    #[test]
    fn test_char_spans_count_characters() {
        // "¡" and "ñ" are two bytes each
        let chapter = processed("¡año niño!", &[("año", 2), ("niño", 7)]);
        assert!(chapter.spans_are_valid());
        assert_eq!(chapter.char_spans(), vec![(1, 4), (5, 9)]);
    }

    #[test]
    fn test_spans_are_valid_rejects_overlap() {
        let chapter = processed("abcdef", &[("abc", 0), ("cde", 2)]);
        assert!(!chapter.spans_are_valid());
    }

    struct Upper;

    impl Translator for Upper {
        fn translate(
            &self,
            word: &str,
            _source: Language,
            _target: Language,
        ) -> Result<String, TranslateError> {
            if word == "fail" {
                return Err(TranslateError::Service("down".into()));
            }
            Ok(word.to_uppercase())
        }
    }

    #[test]
    fn test_default_batch_and_lookup() {
        let batch = Upper.translate_batch(&["one", "fail", "two"], Language::En, Language::De);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch["two"], "TWO");

        let pair = LanguagePair::new(Language::En, Language::De);
        let entry = Upper.lookup("word", pair).unwrap();
        assert_eq!(entry.target_word, "WORD");
        assert_eq!(entry.target_language, Language::De);
        assert_eq!(entry.part_of_speech, PartOfSpeech::Other);
    }

    /// Answers batches in one call and refuses single-word requests.
    struct BatchOnly;

    impl Translator for BatchOnly {
        fn translate(
            &self,
            _word: &str,
            _source: Language,
            _target: Language,
        ) -> Result<String, TranslateError> {
            Err(TranslateError::Service("single lookups disabled".into()))
        }

        fn translate_batch(
            &self,
            words: &[&str],
            _source: Language,
            _target: Language,
        ) -> HashMap<String, String> {
            words
                .iter()
                .map(|&word| (word.to_string(), format!("batch:{word}")))
                .collect()
        }
    }

    #[test]
    fn test_arc_forwards_batch_override() {
        let shared: std::sync::Arc<dyn Translator> = std::sync::Arc::new(BatchOnly);
        let batch = shared.translate_batch(&["sun", "moon"], Language::En, Language::Fr);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch["moon"], "batch:moon");

        let nested = std::sync::Arc::new(std::sync::Arc::new(BatchOnly));
        let batch = Translator::translate_batch(&nested, &["sun"], Language::En, Language::Fr);
        assert_eq!(batch["sun"], "batch:sun");
    }
}
