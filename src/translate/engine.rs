//! Density-controlled word substitution.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

use super::tokenize::tokenize;
use super::{
    ForeignWordData, Language, LanguagePair, ProcessedChapter, ProficiencyLevel, TranslateError,
    Translator, WordEntry,
};
use crate::book::Chapter;
use crate::markup::{looks_like_markup, strip_markup};

/// Substitution options.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Requested densities below this are raised to it.
    pub min_density: f64,
    /// Requested densities above this are lowered to it.
    pub max_density: f64,
    /// Fixed seed for reproducible selections. `None` draws from entropy.
    pub seed: Option<u64>,
    /// Wall-clock limit on translation lookups for one chapter.
    pub time_budget: Option<Duration>,
    /// Re-apply the original word's capitalization to the translation.
    pub match_case: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_density: 0.05,
            max_density: 0.5,
            seed: None,
            time_budget: None,
            match_case: false,
        }
    }
}

impl EngineConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the density band. Bounds are clamped into `[0, 1]` and ordered.
    pub fn with_density_band(mut self, min: f64, max: f64) -> Self {
        let min = if min.is_nan() { 0.0 } else { min.clamp(0.0, 1.0) };
        let max = if max.is_nan() { 1.0 } else { max.clamp(0.0, 1.0) };
        self.min_density = min.min(max);
        self.max_density = min.max(max);
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    pub fn with_match_case(mut self, match_case: bool) -> Self {
        self.match_case = match_case;
        self
    }

    /// Clamp a requested density into the band. NaN counts as the minimum.
    pub fn clamp_density(&self, density: f64) -> f64 {
        if density.is_nan() {
            return self.min_density;
        }
        density.max(self.min_density).min(self.max_density)
    }

    /// Number of words to replace among `tokens`: at least one, at most
    /// all of them.
    pub fn take_count(&self, tokens: usize, density: f64) -> usize {
        if tokens == 0 {
            return 0;
        }
        let take = (tokens as f64 * self.clamp_density(density)).floor() as usize;
        take.clamp(1, tokens)
    }
}

/// Replaces a random sample of a chapter's words with translations.
///
/// The engine holds no per-call state: the translation cache lives for one
/// [`process_chapter`](Self::process_chapter) call, so one engine can serve
/// many threads.
pub struct TranslationEngine {
    translator: Arc<dyn Translator>,
    config: EngineConfig,
    cancel: Option<Arc<AtomicBool>>,
}

type CacheKey = (String, Language, Language);

impl TranslationEngine {
    pub fn new(translator: Arc<dyn Translator>) -> Self {
        Self::with_config(translator, EngineConfig::default())
    }

    pub fn with_config(translator: Arc<dyn Translator>, config: EngineConfig) -> Self {
        Self {
            translator,
            config,
            cancel: None,
        }
    }

    /// Once `flag` is set, remaining lookups are skipped and their words
    /// are copied through unchanged.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Process a chapter using the configured seed, or entropy when none
    /// is set.
    pub fn process_chapter(
        &self,
        chapter: &Chapter,
        pair: LanguagePair,
        proficiency: ProficiencyLevel,
        density: f64,
    ) -> ProcessedChapter {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.process_chapter_with_rng(chapter, pair, proficiency, density, &mut rng)
    }

    /// Process a chapter drawing the word sample from `rng`.
    ///
    /// `proficiency` is recorded on the result's word entries only; the
    /// sample is uniform over all words.
    pub fn process_chapter_with_rng<R: Rng + ?Sized>(
        &self,
        chapter: &Chapter,
        pair: LanguagePair,
        proficiency: ProficiencyLevel,
        density: f64,
        rng: &mut R,
    ) -> ProcessedChapter {
        let text: Cow<'_, str> = if looks_like_markup(&chapter.content) {
            Cow::Owned(strip_markup(&chapter.content))
        } else {
            Cow::Borrowed(&chapter.content)
        };

        if text.trim().is_empty() {
            return ProcessedChapter {
                chapter: chapter.clone(),
                foreign_words: Vec::new(),
                processed_content: chapter.content.clone(),
            };
        }

        let tokens = tokenize(&text);
        let take = self.config.take_count(tokens.len(), density);
        let mut selected = index::sample(rng, tokens.len(), take).into_vec();
        selected.sort_unstable();

        let deadline = self.config.time_budget.map(|budget| Instant::now() + budget);
        let mut cache: HashMap<CacheKey, Option<WordEntry>> = HashMap::new();
        let mut stopped = false;

        let mut output = String::with_capacity(text.len() + text.len() / 4);
        let mut foreign_words = Vec::with_capacity(take);
        let mut cursor = 0;

        for &i in &selected {
            let token = &tokens[i];
            output.push_str(&text[cursor..token.start]);
            cursor = token.end;

            if !stopped && self.should_stop(deadline) {
                log::debug!(
                    "substitution stopped after {} of {} words",
                    foreign_words.len(),
                    selected.len()
                );
                stopped = true;
            }
            if stopped {
                output.push_str(token.text);
                continue;
            }

            let key = (token.lower.clone(), pair.source, pair.target);
            let entry = cache
                .entry(key)
                .or_insert_with(|| self.lookup(&token.lower, pair, proficiency))
                .clone();

            match entry {
                Some(entry) => {
                    let foreign = if self.config.match_case {
                        match_case(token.text, &entry.target_word)
                    } else {
                        entry.target_word.clone()
                    };
                    let start = output.len();
                    output.push_str(&foreign);
                    foreign_words.push(ForeignWordData {
                        original_word: token.text.to_string(),
                        foreign_word: foreign,
                        start,
                        end: output.len(),
                        word_entry: entry,
                    });
                }
                None => output.push_str(token.text),
            }
        }
        output.push_str(&text[cursor..]);

        log::debug!(
            "chapter {:?}: {} tokens, {} selected, {} substituted, {} lookups",
            chapter.id,
            tokens.len(),
            selected.len(),
            foreign_words.len(),
            cache.len()
        );

        ProcessedChapter {
            chapter: chapter.clone(),
            foreign_words,
            processed_content: output,
        }
    }

    fn should_stop(&self, deadline: Option<Instant>) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
            || deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Resolve one word; `None` means "leave it untranslated".
    fn lookup(
        &self,
        word: &str,
        pair: LanguagePair,
        proficiency: ProficiencyLevel,
    ) -> Option<WordEntry> {
        match self.translator.lookup(word, pair) {
            Ok(mut entry) => {
                let target = entry.target_word.trim();
                if target.is_empty() {
                    log::debug!("empty translation for {word:?} ({pair})");
                    return None;
                }
                entry.target_word = target.to_string();
                entry.proficiency = proficiency;
                Some(entry)
            }
            Err(TranslateError::NotFound { .. }) => {
                log::debug!("no translation for {word:?} ({pair})");
                None
            }
            Err(e) => {
                log::warn!("translating {word:?} failed: {e}");
                None
            }
        }
    }
}

impl std::fmt::Debug for TranslationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationEngine")
            .field("config", &self.config)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

/// Give `translated` the capitalization pattern of `original`.
fn match_case(original: &str, translated: &str) -> String {
    let mut letters = original.chars().filter(|c| c.is_alphabetic());
    let Some(first) = letters.next() else {
        return translated.to_string();
    };
    let rest: Vec<char> = letters.collect();

    if first.is_uppercase() && !rest.is_empty() && rest.iter().all(|c| c.is_uppercase()) {
        return translated.to_uppercase();
    }
    if first.is_uppercase() {
        let mut chars = translated.chars();
        if let Some(head) = chars.next() {
            return head.to_uppercase().chain(chars).collect();
        }
    }
    translated.to_string()
}
