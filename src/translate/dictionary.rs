//! In-memory word list translator.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{Language, LanguagePair, PartOfSpeech, TranslateError, Translator, WordEntry};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
struct Definition {
    target: String,
    part_of_speech: PartOfSpeech,
    frequency_rank: Option<u32>,
}

/// A [`Translator`] backed by word lists, one per language pair.
///
/// Lookups are case-insensitive on the source word.
#[derive(Debug, Clone, Default)]
pub struct DictionaryTranslator {
    entries: HashMap<LanguagePair, HashMap<String, Definition>>,
}

impl DictionaryTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace one translation.
    pub fn insert(&mut self, pair: LanguagePair, source: &str, target: impl Into<String>) {
        self.insert_definition(
            pair,
            source,
            Definition {
                target: target.into(),
                part_of_speech: PartOfSpeech::Other,
                frequency_rank: None,
            },
        );
    }

    pub fn with_entry(mut self, pair: LanguagePair, source: &str, target: impl Into<String>) -> Self {
        self.insert(pair, source, target);
        self
    }

    /// Load tab-separated lines for `pair`:
    ///
    /// ```text
    /// # source <TAB> target [<TAB> part of speech [<TAB> frequency rank]]
    /// cat	gato	noun	1200
    /// run	correr
    /// ```
    ///
    /// Blank lines and `#` comments are skipped, as are lines without a
    /// target (with a warning). Returns the number of entries loaded.
    pub fn load_tsv<R: BufRead>(&mut self, pair: LanguagePair, reader: R) -> Result<usize> {
        let mut loaded = 0;
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }

            let mut fields = line.split('\t').map(str::trim);
            let source = fields.next().unwrap_or_default();
            let target = fields.next().unwrap_or_default();
            if source.is_empty() || target.is_empty() {
                log::warn!("dictionary line {}: missing source or target", number + 1);
                continue;
            }

            let part_of_speech = match fields.next().map(str::parse::<PartOfSpeech>) {
                Some(Ok(pos)) => pos,
                Some(Err(e)) => {
                    log::warn!("dictionary line {}: {e}", number + 1);
                    PartOfSpeech::Other
                }
                None => PartOfSpeech::Other,
            };
            let frequency_rank = fields.next().and_then(|rank| rank.parse().ok());

            self.insert_definition(
                pair,
                source,
                Definition {
                    target: target.to_string(),
                    part_of_speech,
                    frequency_rank,
                },
            );
            loaded += 1;
        }

        log::debug!("dictionary {pair}: loaded {loaded} entries");
        Ok(loaded)
    }

    /// Load a TSV word list from disk.
    pub fn load_tsv_file(&mut self, pair: LanguagePair, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => Error::Io(e),
        })?;
        self.load_tsv(pair, BufReader::new(file))
    }

    /// Number of entries across all pairs.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert_definition(&mut self, pair: LanguagePair, source: &str, definition: Definition) {
        self.entries
            .entry(pair)
            .or_default()
            .insert(source.to_lowercase(), definition);
    }

    fn definition(
        &self,
        word: &str,
        pair: LanguagePair,
    ) -> std::result::Result<&Definition, TranslateError> {
        self.entries
            .get(&pair)
            .and_then(|words| words.get(&word.to_lowercase()))
            .ok_or_else(|| TranslateError::NotFound {
                word: word.to_string(),
                pair,
            })
    }
}

impl Translator for DictionaryTranslator {
    fn translate(
        &self,
        word: &str,
        source: Language,
        target: Language,
    ) -> std::result::Result<String, TranslateError> {
        let definition = self.definition(word, LanguagePair::new(source, target))?;
        Ok(definition.target.clone())
    }

    fn lookup(&self, word: &str, pair: LanguagePair) -> std::result::Result<WordEntry, TranslateError> {
        let definition = self.definition(word, pair)?;
        Ok(WordEntry {
            part_of_speech: definition.part_of_speech,
            frequency_rank: definition.frequency_rank,
            ..WordEntry::new(word, definition.target.clone(), pair)
        })
    }
}
