// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The understanding pipeline: raw text in, [`ParsedQuery`] out.
//!
//! ```text
//! raw ──▶ transliterate ──▶ clean ──▶ spell-correct ──▶ synonym-normalize ──▶ synonym-expand
//!                                                                 │
//!                                                                 └──▶ classify ──▶ filters ──▶ suggestions
//! ```
//!
//! Each stage reads the previous stage's output. Expansion starts from the
//! canonical forms, so "kukkad" and "murgi" expand to the same token list.
//!
//! Every intermediate value is kept on the result. When a query ranks
//! badly, the first question is always "what did we think they typed?"

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::entities::{Entities, RecommendedFilters};
use super::intent::{Intent, IntentClassifier};
use super::spell::{Correction, Dictionary, SpellCorrector};
use super::synonyms::SynonymStore;
use super::transliterate::TransliterationEngine;
use crate::util::normalize::normalized_tokens;

/// Default cap on alternative query suggestions.
pub const DEFAULT_MAX_SUGGESTIONS: usize = 3;

/// Everything the pipeline learned about one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub original: String,
    /// Present only when the input contained Devanagari.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transliterated: Option<String>,
    pub corrected: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub corrections: Vec<Correction>,
    pub normalized: String,
    pub expanded: String,
    pub intent: Intent,
    pub confidence: f64,
    pub entities: Entities,
    pub recommended_filters: RecommendedFilters,
    pub suggestions: Vec<String>,
}

impl ParsedQuery {
    fn empty(original: &str) -> Self {
        Self {
            original: original.to_string(),
            transliterated: None,
            corrected: String::new(),
            corrections: Vec::new(),
            normalized: String::new(),
            expanded: String::new(),
            intent: Intent::ItemSearch,
            confidence: 0.0,
            entities: Entities::default(),
            recommended_filters: RecommendedFilters::default(),
            suggestions: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    /// Text to send to lexical retrieval.
    pub fn search_text(&self) -> &str {
        if self.expanded.is_empty() {
            &self.corrected
        } else {
            &self.expanded
        }
    }
}

/// Composes transliteration, spelling, synonyms and intent.
///
/// Cheap to share: the dictionary and synonym store are behind `Arc`s and
/// their own locks, everything else is immutable.
#[derive(Debug)]
pub struct QueryUnderstandingPipeline {
    transliterator: TransliterationEngine,
    speller: SpellCorrector,
    synonyms: Arc<SynonymStore>,
    classifier: IntentClassifier,
    max_suggestions: usize,
}

impl Default for QueryUnderstandingPipeline {
    fn default() -> Self {
        Self::new(
            Arc::new(Dictionary::seeded()),
            Arc::new(SynonymStore::seeded()),
        )
    }
}

impl QueryUnderstandingPipeline {
    pub fn new(dictionary: Arc<Dictionary>, synonyms: Arc<SynonymStore>) -> Self {
        Self {
            transliterator: TransliterationEngine::new(),
            speller: SpellCorrector::new(dictionary),
            synonyms,
            classifier: IntentClassifier::default(),
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
        }
    }

    pub fn with_max_suggestions(mut self, max: usize) -> Self {
        self.max_suggestions = max;
        self
    }

    pub fn with_classifier(mut self, classifier: IntentClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_transliterator(mut self, transliterator: TransliterationEngine) -> Self {
        self.transliterator = transliterator;
        self
    }

    pub fn dictionary(&self) -> &Dictionary {
        self.speller.dictionary()
    }

    pub fn synonyms(&self) -> &SynonymStore {
        &self.synonyms
    }

    pub fn speller(&self) -> &SpellCorrector {
        &self.speller
    }

    pub fn process(&self, raw: &str) -> ParsedQuery {
        if raw.trim().is_empty() {
            return ParsedQuery::empty(raw);
        }

        let transliterated = self.transliterator.transliterate(raw);
        let had_devanagari = TransliterationEngine::contains_devanagari(raw);

        let cleaned = normalized_tokens(&transliterated).join(" ");
        if cleaned.is_empty() {
            return ParsedQuery::empty(raw);
        }

        let corrected = self.speller.correct(&cleaned);
        let normalized = self.synonyms.normalize_query(&corrected.text);
        let expanded = self.synonyms.expand_query(&normalized);
        let classification = self.classifier.classify(&normalized);

        let tokens: Vec<String> = normalized.split_whitespace().map(str::to_string).collect();
        let recommended_filters = RecommendedFilters::derive(&classification.entities, &tokens);
        let suggestions = self.suggest(
            classification.intent,
            &normalized,
            &corrected.corrections,
            &corrected.text,
        );

        debug!(
            raw,
            corrected = %corrected.text,
            normalized = %normalized,
            intent = ?classification.intent,
            confidence = classification.confidence,
            "query understood"
        );

        ParsedQuery {
            original: raw.to_string(),
            transliterated: had_devanagari.then_some(transliterated),
            corrected: corrected.text,
            corrections: corrected.corrections,
            normalized,
            expanded,
            intent: classification.intent,
            confidence: classification.confidence,
            entities: classification.entities,
            recommended_filters,
            suggestions,
        }
    }

    /// Up to `max_suggestions` alternative queries.
    ///
    /// A "did you mean" built from unapplied spelling suggestions comes
    /// first, then templates keyed off the intent.
    fn suggest(
        &self,
        intent: Intent,
        normalized: &str,
        corrections: &[Correction],
        corrected: &str,
    ) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let mut push = |s: String| {
            let s = s.trim().to_string();
            if !s.is_empty() && s != normalized && !out.contains(&s) {
                out.push(s);
            }
        };

        if corrections.iter().any(|c| !c.applied) {
            let did_you_mean = corrected
                .split_whitespace()
                .map(|token| {
                    corrections
                        .iter()
                        .find(|c| !c.applied && c.original == token)
                        .map_or(token, |c| c.suggestion.as_str())
                })
                .collect::<Vec<_>>()
                .join(" ");
            push(self.synonyms.normalize_query(&did_you_mean));
        }

        let q = normalized;
        let templates: Vec<String> = match intent {
            Intent::CategoryBrowse => vec![format!("best {q}"), format!("popular {q}"), format!("{q} near me")],
            Intent::ItemSearch => vec![format!("best {q}"), format!("{q} near me"), format!("{q} combo")],
            Intent::StoreSearch => vec![format!("{q} menu"), format!("{q} offers"), format!("best {q}")],
            Intent::DietaryFilter => vec![format!("{q} thali"), format!("{q} restaurants"), format!("{q} snacks")],
            Intent::LocationSearch => vec![format!("restaurants {q}"), format!("popular {q}")],
            Intent::PriceSearch => vec![format!("{q} combo"), format!("{q} offers")],
            Intent::BrandSearch => vec![format!("{q} products"), format!("{q} offers")],
            Intent::GeneralBrowse => vec![
                "trending near me".to_string(),
                "popular dishes".to_string(),
                "best restaurants".to_string(),
            ],
        };
        for t in templates {
            push(t);
        }

        out.truncate(self.max_suggestions);
        out
    }
}
