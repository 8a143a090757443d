// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Dictionary-backed spell correction.
//!
//! Every token of three or more letters that the dictionary doesn't know is
//! compared against every word it does know. The closest word within two
//! edits becomes a *suggestion*. A suggestion is only written into the
//! corrected text when it is one edit away and confident:
//!
//! ```text
//! confidence = 0.7 × distance_score + 0.3 × min(frequency / 100, 1)
//!
//! distance 1 → 0.9     distance 2 → 0.6     otherwise → 0.3
//! ```
//!
//! With a 0.7 threshold, a distance-1 word needs frequency ≥ 24 to be applied.
//! Distance-2 suggestions top out at 0.72 but are never applied; they are
//! surfaced for "did you mean" and nothing else.
//!
//! # Tie-breaking
//!
//! The dictionary is a `BTreeMap`, so iteration is lexical. Among candidates
//! at the same distance, the higher frequency wins, then the lexically
//! smaller word. "biriani" has two neighbours at distance 1, "biryani" (120)
//! and "biriyani" (30); the canonical spelling wins.

use std::collections::BTreeMap;
#[cfg(feature = "parallel")]
use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::vocabulary::{DICTIONARY_SEED, SYNONYM_FORM_FREQUENCY, SYNONYM_GROUPS};
use crate::fuzzy::bounded_distance;

/// Words shorter than this are never stored and never checked.
pub const MIN_WORD_LEN: usize = 3;

/// Largest edit distance that still counts as a suggestion.
pub const MAX_SUGGESTION_DISTANCE: usize = 2;

/// Confidence a distance-1 suggestion must beat to be applied.
pub const AUTO_APPLY_CONFIDENCE: f64 = 0.7;

/// Word → frequency table, shared between the corrector and whoever learns.
///
/// Readers take a shared lock; learning takes the write lock once per call,
/// not once per word.
#[derive(Debug, Default)]
pub struct Dictionary {
    words: RwLock<BTreeMap<String, u64>>,
}

impl Dictionary {
    /// An empty dictionary. Mostly useful in tests.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in vocabulary plus every synonym form.
    ///
    /// Synonym forms get [`SYNONYM_FORM_FREQUENCY`] unless the seed already
    /// lists them, so a form like "murgi" is never "corrected" into something else.
    pub fn seeded() -> Self {
        let mut words = BTreeMap::new();
        for (word, frequency) in DICTIONARY_SEED {
            insert_or_add(&mut words, word, *frequency);
        }
        for (canonical, forms) in SYNONYM_GROUPS {
            for form in std::iter::once(canonical).chain(forms.iter()) {
                if let Some(word) = clean_word(form) {
                    words.entry(word).or_insert(SYNONYM_FORM_FREQUENCY);
                }
            }
        }
        Self {
            words: RwLock::new(words),
        }
    }

    pub fn len(&self) -> usize {
        self.words.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.read().is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.read().contains_key(word)
    }

    pub fn frequency(&self, word: &str) -> Option<u64> {
        self.words.read().get(word).copied()
    }

    /// Insert `word`, or add `frequency` to it if already present.
    ///
    /// Trimmed and lowercased first; words shorter than three characters are
    /// ignored. Returns whether anything was stored.
    pub fn add_word(&self, word: &str, frequency: u64) -> bool {
        match clean_word(word) {
            Some(word) => {
                insert_or_add(&mut self.words.write(), &word, frequency);
                true
            }
            None => false,
        }
    }

    /// Every token of every logged query gains that query's count.
    pub fn learn_from_search_logs(&self, entries: &[(String, u64)]) {
        let mut words = self.words.write();
        for (query, count) in entries {
            for token in query.split_whitespace() {
                if let Some(word) = clean_word(token) {
                    insert_or_add(&mut words, &word, *count);
                }
            }
        }
    }

    /// Every token of every product name gains one.
    ///
    /// Catalog imports can be large, so tokenizing is spread over rayon's
    /// pool and the counts are merged under a single write lock.
    #[cfg(feature = "parallel")]
    pub fn learn_from_product_names(&self, names: &[String]) {
        use rayon::prelude::*;

        let counts = names
            .par_iter()
            .fold(HashMap::new, |mut acc: HashMap<String, u64>, name| {
                for token in name.split_whitespace() {
                    if let Some(word) = clean_word(token) {
                        *acc.entry(word).or_insert(0) += 1;
                    }
                }
                acc
            })
            .reduce(HashMap::new, |mut a, b| {
                for (word, n) in b {
                    *a.entry(word).or_insert(0) += n;
                }
                a
            });

        let mut words = self.words.write();
        for (word, n) in counts {
            insert_or_add(&mut words, &word, n);
        }
    }

    /// Every token of every product name gains one.
    #[cfg(not(feature = "parallel"))]
    pub fn learn_from_product_names(&self, names: &[String]) {
        let mut words = self.words.write();
        for name in names {
            for token in name.split_whitespace() {
                if let Some(word) = clean_word(token) {
                    insert_or_add(&mut words, &word, 1);
                }
            }
        }
    }

    /// All `(word, frequency)` pairs within `max` edits of `token`, as
    /// `(distance, word, frequency)`, in tie-break order.
    fn neighbours(&self, token: &str, max: usize) -> Vec<(usize, String, u64)> {
        let words = self.words.read();
        let mut found: Vec<(usize, String, u64)> = words
            .iter()
            .filter_map(|(word, freq)| {
                bounded_distance(token, word, max).map(|d| (d, word.clone(), *freq))
            })
            .collect();
        found.sort_by(|a, b| a.0.cmp(&b.0).then(b.2.cmp(&a.2)).then(a.1.cmp(&b.1)));
        found
    }
}

fn insert_or_add(words: &mut BTreeMap<String, u64>, word: &str, frequency: u64) {
    let slot = words.entry(word.to_string()).or_insert(0);
    *slot = slot.saturating_add(frequency);
}

fn clean_word(raw: &str) -> Option<String> {
    let word = raw
        .trim()
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    (word.chars().count() >= MIN_WORD_LEN).then_some(word)
}

/// `0.7 × distance_score + 0.3 × frequency_score`.
pub fn correction_confidence(distance: usize, frequency: u64) -> f64 {
    let distance_score = match distance {
        1 => 0.9,
        2 => 0.6,
        _ => 0.3,
    };
    let frequency_score = (frequency as f64 / 100.0).min(1.0);
    0.7 * distance_score + 0.3 * frequency_score
}

/// What the corrector decided about one token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub original: String,
    pub suggestion: String,
    pub distance: usize,
    pub confidence: f64,
    /// Whether the suggestion replaced the original in the corrected text.
    pub applied: bool,
}

/// Corrected text plus the per-token decisions that produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrectedText {
    pub text: String,
    pub corrections: Vec<Correction>,
}

/// Edit-distance spell corrector over a shared [`Dictionary`].
#[derive(Debug)]
pub struct SpellCorrector {
    dictionary: std::sync::Arc<Dictionary>,
}

impl Default for SpellCorrector {
    fn default() -> Self {
        Self::new(std::sync::Arc::new(Dictionary::seeded()))
    }
}

impl SpellCorrector {
    pub fn new(dictionary: std::sync::Arc<Dictionary>) -> Self {
        Self { dictionary }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Best suggestion for a single token, or `None` if the token is known,
    /// too short, not alphabetic, or nothing is within two edits.
    pub fn correct_word(&self, token: &str) -> Option<Correction> {
        let word = token.to_lowercase();
        if word.chars().count() < MIN_WORD_LEN
            || !word.chars().all(char::is_alphabetic)
            || self.dictionary.contains(&word)
        {
            return None;
        }

        let (distance, suggestion, frequency) = self
            .dictionary
            .neighbours(&word, MAX_SUGGESTION_DISTANCE)
            .into_iter()
            .next()?;
        let confidence = correction_confidence(distance, frequency);
        let applied = distance == 1 && confidence > AUTO_APPLY_CONFIDENCE;

        Some(Correction {
            original: word,
            suggestion,
            distance,
            confidence,
            applied,
        })
    }

    /// All suggestions within two edits, best first, at most `limit`.
    pub fn suggestions(&self, token: &str, limit: usize) -> Vec<Correction> {
        let word = token.to_lowercase();
        self.dictionary
            .neighbours(&word, MAX_SUGGESTION_DISTANCE)
            .into_iter()
            .filter(|(distance, _, _)| *distance > 0)
            .take(limit)
            .map(|(distance, suggestion, frequency)| {
                let confidence = correction_confidence(distance, frequency);
                Correction {
                    original: word.clone(),
                    suggestion,
                    distance,
                    confidence,
                    applied: false,
                }
            })
            .collect()
    }

    /// Correct every token, recording each decision.
    ///
    /// Tokens are rejoined with single spaces. Unmatched and low-confidence
    /// tokens pass through untouched.
    pub fn correct(&self, query: &str) -> CorrectedText {
        let mut corrections = Vec::new();
        let tokens: Vec<String> = query
            .split_whitespace()
            .map(|token| match self.correct_word(token) {
                Some(correction) => {
                    let out = if correction.applied {
                        debug!(
                            from = %correction.original,
                            to = %correction.suggestion,
                            confidence = correction.confidence,
                            "applied spelling correction"
                        );
                        correction.suggestion.clone()
                    } else {
                        token.to_string()
                    };
                    corrections.push(correction);
                    out
                }
                None => token.to_string(),
            })
            .collect();

        CorrectedText {
            text: tokens.join(" "),
            corrections,
        }
    }

    /// [`correct`](Self::correct) without the bookkeeping.
    pub fn auto_correct(&self, query: &str) -> String {
        self.correct(query).text
    }
}
