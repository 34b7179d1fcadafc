mod common;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use xenolexia::{
    BookParser, Chapter, DictionaryTranslator, EngineConfig, Language, LanguagePair,
    ProcessedChapter, ProficiencyLevel, Segment, TranslateError, TranslationEngine, Translator,
};

const EN_ES: LanguagePair = LanguagePair {
    source: Language::En,
    target: Language::Es,
};

/// Translates every word by wrapping it, so every selected word succeeds.
struct Wrapping;

impl Translator for Wrapping {
    fn translate(
        &self,
        word: &str,
        _source: Language,
        _target: Language,
    ) -> Result<String, TranslateError> {
        Ok(format!("«{word}»"))
    }
}

fn chapter(content: &str) -> Chapter {
    Chapter {
        id: "chapter-0".into(),
        title: "Test".into(),
        index: 0,
        content: content.to_string(),
        word_count: content.split_whitespace().count(),
        href: None,
    }
}

fn word_count(text: &str) -> usize {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .count()
}

/// Put the original words back in place of every substitution.
fn restore(processed: &ProcessedChapter) -> String {
    processed
        .segments()
        .into_iter()
        .map(|segment| match segment {
            Segment::Text(text) => text,
            Segment::Foreign(word) => word.original_word.as_str(),
        })
        .collect()
}

fn text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            "[a-zA-Z]{1,10}",
            "[àéîõüßçñ]{1,4}",
            "[0-9]{1,3}",
            Just(" ".to_string()),
            Just(", ".to_string()),
            Just(".\n\n".to_string()),
            Just("—".to_string()),
        ],
        0..60,
    )
    .prop_map(|parts| parts.join(" "))
}

proptest! {
    #[test]
    fn substitution_spans_are_exact(text in text_strategy(), density in 0.0f64..1.0, seed in any::<u64>()) {
        let engine = TranslationEngine::new(Arc::new(Wrapping));
        let mut rng = StdRng::seed_from_u64(seed);
        let processed = engine.process_chapter_with_rng(
            &chapter(&text),
            EN_ES,
            ProficiencyLevel::Beginner,
            density,
            &mut rng,
        );

        prop_assert!(processed.spans_are_valid());
        for word in &processed.foreign_words {
            prop_assert_eq!(
                &processed.processed_content[word.start..word.end],
                word.foreign_word.as_str()
            );
            prop_assert_eq!(&word.foreign_word, &format!("«{}»", word.original_word.to_lowercase()));
        }
        prop_assert_eq!(restore(&processed), text);
    }

    #[test]
    fn substitution_count_follows_density(text in text_strategy(), density in -1.0f64..2.0, seed in any::<u64>()) {
        let engine = TranslationEngine::new(Arc::new(Wrapping));
        let mut rng = StdRng::seed_from_u64(seed);
        let processed = engine.process_chapter_with_rng(
            &chapter(&text),
            EN_ES,
            ProficiencyLevel::Advanced,
            density,
            &mut rng,
        );

        let words = word_count(&text);
        let expected = EngineConfig::default().take_count(words, density);
        if text.trim().is_empty() {
            prop_assert!(processed.foreign_words.is_empty());
        } else {
            prop_assert_eq!(processed.foreign_words.len(), expected);
        }
        if words > 0 {
            prop_assert!(expected >= 1);
            prop_assert!(expected <= words);
        }
    }

    #[test]
    fn char_spans_match_byte_spans(text in text_strategy(), seed in any::<u64>()) {
        let engine = TranslationEngine::new(Arc::new(Wrapping));
        let mut rng = StdRng::seed_from_u64(seed);
        let processed = engine.process_chapter_with_rng(
            &chapter(&text),
            EN_ES,
            ProficiencyLevel::Beginner,
            0.5,
            &mut rng,
        );

        let chars: Vec<char> = processed.processed_content.chars().collect();
        for (word, (start, end)) in processed.foreign_words.iter().zip(processed.char_spans()) {
            let span: String = chars[start..end].iter().collect();
            prop_assert_eq!(span, word.foreign_word.clone());
        }
    }
}

#[test]
fn test_same_seed_same_result() {
    let text = "The quick brown fox jumps over the lazy dog near the river bank.";
    let config = EngineConfig::default().with_seed(42);
    let engine = TranslationEngine::with_config(Arc::new(Wrapping), config);

    let a = engine.process_chapter(&chapter(text), EN_ES, ProficiencyLevel::Beginner, 0.3);
    let b = engine.process_chapter(&chapter(text), EN_ES, ProficiencyLevel::Beginner, 0.3);
    assert_eq!(a, b);
    assert_eq!(a.foreign_words.len(), 3);
}

#[test]
fn test_cancelled_before_start_changes_nothing() {
    let text = "One two three four five six seven eight nine ten.";
    let engine = TranslationEngine::new(Arc::new(Wrapping))
        .with_cancel_flag(Arc::new(AtomicBool::new(true)));

    let processed = engine.process_chapter(&chapter(text), EN_ES, ProficiencyLevel::Beginner, 0.5);
    assert!(processed.foreign_words.is_empty());
    assert_eq!(processed.processed_content, text);
}

#[test]
fn test_epub_chapter_end_to_end() {
    let book = BookParser::new()
        .parse_bytes("book.epub", &common::sample_epub())
        .expect("Failed to parse EPUB");

    let dictionary = DictionaryTranslator::new()
        .with_entry(EN_ES, "cat", "gato")
        .with_entry(EN_ES, "dog", "perro")
        .with_entry(EN_ES, "door", "puerta")
        .with_entry(EN_ES, "mat", "alfombra");
    let engine = TranslationEngine::with_config(
        Arc::new(dictionary),
        EngineConfig::default().with_density_band(1.0, 1.0),
    );

    let processed = engine.process_chapter(
        &book.chapters[1],
        EN_ES,
        ProficiencyLevel::Intermediate,
        1.0,
    );

    assert_eq!(
        processed.processed_content,
        "The gato sat on the alfombra.\n\nThe perro slept by the puerta."
    );
    let originals: Vec<&str> = processed
        .foreign_words
        .iter()
        .map(|w| w.original_word.as_str())
        .collect();
    assert_eq!(originals, vec!["cat", "mat", "dog", "door"]);
    assert!(processed.spans_are_valid());
    assert!(
        processed
            .foreign_words
            .iter()
            .all(|w| w.word_entry.proficiency == ProficiencyLevel::Intermediate)
    );
    assert_eq!(processed.chapter, book.chapters[1]);
}

#[test]
fn test_markup_chapter_is_stripped_first() {
    let dictionary = DictionaryTranslator::new().with_entry(EN_ES, "house", "casa");
    let engine = TranslationEngine::with_config(
        Arc::new(dictionary),
        EngineConfig::default().with_density_band(1.0, 1.0),
    );

    let processed = engine.process_chapter(
        &chapter("<p>The <em>house</em> &amp; garden</p>"),
        EN_ES,
        ProficiencyLevel::Beginner,
        1.0,
    );
    assert_eq!(processed.processed_content, "The casa & garden");
    assert_eq!(processed.foreign_words.len(), 1);
    assert_eq!(processed.foreign_words[0].start, 4);
    assert_eq!(processed.foreign_words[0].end, 8);
}

#[test]
fn test_devanagari_words_replaced_whole() {
    let hi_en = LanguagePair::new(Language::Hi, Language::En);
    let dictionary = DictionaryTranslator::new()
        .with_entry(hi_en, "नमस्ते", "hello")
        .with_entry(hi_en, "दुनिया", "world");
    let engine = TranslationEngine::with_config(
        Arc::new(dictionary),
        EngineConfig::default().with_density_band(1.0, 1.0),
    );

    let processed = engine.process_chapter(
        &chapter("नमस्ते दुनिया!"),
        hi_en,
        ProficiencyLevel::Beginner,
        1.0,
    );
    assert_eq!(processed.processed_content, "hello world!");
    let originals: Vec<&str> = processed
        .foreign_words
        .iter()
        .map(|w| w.original_word.as_str())
        .collect();
    assert_eq!(originals, vec!["नमस्ते", "दुनिया"]);
}
