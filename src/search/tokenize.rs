//! Text tokenization and stemming utilities for search indexing.

use ahash::{AHashMap, AHashSet};
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum term length kept in the index. Shorter words bound the index size and carry little signal.
pub const DEFAULT_MIN_TERM_LENGTH: usize = 3;

/// Terms longer than this are likely hashes, addresses or other non-searchable content.
pub const DEFAULT_MAX_TERM_LENGTH: usize = 64;

/// English stop words dropped from both indexed text and queries.
pub const STOP_WORDS: &[&str] = &[
    "a", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "near", "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there",
    "these", "they", "this", "to", "was", "will", "with",
];

/// Settings controlling how text is split into terms.
///
/// These are stored inside every built index so that queries are tokenized
/// exactly like the pages were.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerSettings {
    /// Words with fewer characters are dropped
    pub min_term_length: usize,
    /// Words with more characters are dropped
    pub max_term_length: usize,
    /// Apply the Snowball English stemmer to every term
    pub stem: bool,
    /// Also emit the sub-words of camelCase identifiers
    pub split_camel_case: bool,
    /// Lowercase words that are never indexed
    pub stop_words: Vec<String>,
}

impl Default for TokenizerSettings {
    fn default() -> Self {
        Self {
            min_term_length: DEFAULT_MIN_TERM_LENGTH,
            max_term_length: DEFAULT_MAX_TERM_LENGTH,
            stem: true,
            split_camel_case: true,
            stop_words: STOP_WORDS.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

/// Splits text into lowercase, stemmed, stop-word-filtered terms.
pub struct Tokenizer {
    settings: TokenizerSettings,
    stop_words: AHashSet<String>,
    stemmer: Option<Stemmer>,
}

impl fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokenizer")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(&TokenizerSettings::default())
    }
}

impl Tokenizer {
    pub fn new(settings: &TokenizerSettings) -> Self {
        Self {
            stop_words: settings
                .stop_words
                .iter()
                .map(|word| word.to_lowercase())
                .collect(),
            stemmer: settings
                .stem
                .then(|| Stemmer::create(Algorithm::English)),
            settings: settings.clone(),
        }
    }

    pub fn settings(&self) -> &TokenizerSettings {
        &self.settings
    }

    /// Tokenizes text into searchable terms, in order of appearance.
    ///
    /// Words are maximal runs of alphanumeric characters. When camelCase
    /// splitting is enabled, a word like "MlocusPop" yields its parts
    /// ("mlocus", "pop") followed by the whole word ("mlocuspop").
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens = vec![];
        let mut word_start = None;

        for (i, c) in text.char_indices() {
            if c.is_alphanumeric() {
                word_start.get_or_insert(i);
            } else if let Some(start) = word_start.take() {
                self.push_word(&text[start..i], &mut tokens);
            }
        }

        if let Some(start) = word_start {
            self.push_word(&text[start..], &mut tokens);
        }

        tokens
    }

    /// Counts term occurrences in text, sorted by term.
    pub fn term_frequencies(&self, text: &str) -> Vec<(String, u32)> {
        let tokens = self.tokenize(text);

        let mut counts: AHashMap<String, u32> = AHashMap::with_capacity(tokens.len());
        for token in tokens {
            *counts.entry(token).or_insert(0) += 1;
        }

        let mut counts: Vec<_> = counts.into_iter().collect();
        counts.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
        counts
    }

    fn push_word(&self, word: &str, tokens: &mut Vec<String>) {
        if self.settings.split_camel_case {
            let parts = camel_case_parts(word);
            if parts.len() > 1 {
                for part in parts {
                    self.push_term(part, tokens);
                }
            }
        }
        self.push_term(word, tokens);
    }

    /// Normalizes a single word and appends it unless it is filtered out.
    fn push_term(&self, word: &str, tokens: &mut Vec<String>) {
        let lowercase = word.to_lowercase();

        let len = lowercase.chars().count();
        if len < self.settings.min_term_length || len > self.settings.max_term_length {
            return;
        }

        if self.stop_words.contains(&lowercase) {
            return;
        }

        match &self.stemmer {
            Some(stemmer) => tokens.push(stemmer.stem(&lowercase).into_owned()),
            None => tokens.push(lowercase),
        }
    }
}

/// Splits a word at lowercase → uppercase transitions.
fn camel_case_parts(word: &str) -> Vec<&str> {
    let mut parts = vec![];
    let mut start = 0;
    let mut last_lower = false;

    for (i, c) in word.char_indices() {
        if last_lower && c.is_uppercase() {
            parts.push(&word[start..i]);
            start = i;
        }
        last_lower = c.is_lowercase();
    }

    parts.push(&word[start..]);
    parts
}
