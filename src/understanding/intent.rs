// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Rule-table intent classification.
//!
//! Eight intents, each scored by summing the rules that belong to it. Every
//! rule is a pure function of the normalized query, so rules can be tested
//! one at a time and reordered without surprises:
//!
//! | Intent           | Rules (contribution)                                          |
//! |------------------|---------------------------------------------------------------|
//! | `StoreSearch`    | store keyword (0.3 each), proximity phrase (0.3), chain (0.4 each) |
//! | `CategoryBrowse` | category keyword (0.4 each), browse word (0.3), lone category (0.2) |
//! | `DietaryFilter`  | dietary keyword (0.4 each), "only"/"pure" (0.2)               |
//! | `LocationSearch` | near/around + place (0.5), near me (0.3), in/at + place (0.2) |
//! | `PriceSearch`    | price pattern (0.7), price word (0.3 each)                    |
//! | `BrandSearch`    | product brand (0.5 each), lone brand (0.2)                    |
//! | `GeneralBrowse`  | general word (0.3 each), generic opener (0.4)                 |
//! | `ItemSearch`     | floor (0.3), dish word (0.2), 2-4 tokens (0.1)                |
//!
//! Scores are not probabilities. They are independent sums, clamped to
//! `[0, 1]` only when reported as confidence. A 0.9 store score and a 0.9
//! item score mean both rule sets fired hard, not that the query is 180% sure.
//!
//! The winner is the highest score. Earlier intents in the table win ties
//! with each other, but `ItemSearch` is evaluated last with `>=`, so it takes
//! every exact tie it is part of.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::entities::{contains_phrase, extract_entities, Entities};
use super::vocabulary::{
    CATEGORY_KEYWORDS, CHAIN_BRANDS, DISH_WORDS, GENERAL_WORDS, PRICE_WORDS, PRODUCT_BRANDS,
    STORE_KEYWORDS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    StoreSearch,
    CategoryBrowse,
    DietaryFilter,
    LocationSearch,
    PriceSearch,
    BrandSearch,
    GeneralBrowse,
    ItemSearch,
}

impl Intent {
    /// Tie-resolution order. `ItemSearch` must stay last.
    pub const ALL: [Intent; 8] = [
        Intent::StoreSearch,
        Intent::CategoryBrowse,
        Intent::DietaryFilter,
        Intent::LocationSearch,
        Intent::PriceSearch,
        Intent::BrandSearch,
        Intent::GeneralBrowse,
        Intent::ItemSearch,
    ];
}

/// What every rule sees: the normalized text and its tokens.
#[derive(Debug, Clone)]
pub struct QueryFeatures {
    pub text: String,
    pub tokens: Vec<String>,
}

impl QueryFeatures {
    pub fn new(normalized: &str) -> Self {
        let text = normalized.trim().to_lowercase();
        let tokens = text.split_whitespace().map(str::to_string).collect();
        Self { text, tokens }
    }

    fn count_tokens_in(&self, words: &[&str]) -> usize {
        self.tokens
            .iter()
            .filter(|t| words.contains(&t.as_str()))
            .count()
    }

    fn count_phrases_in(&self, phrases: &[&str]) -> usize {
        phrases
            .iter()
            .filter(|p| contains_phrase(&self.text, p))
            .count()
    }

    fn has_token(&self, words: &[&str]) -> bool {
        self.count_tokens_in(words) > 0
    }

    /// Token following the first occurrence of any trigger word.
    fn word_after(&self, triggers: &[&str]) -> Option<&str> {
        self.tokens
            .windows(2)
            .find(|w| triggers.contains(&w[0].as_str()))
            .map(|w| w[1].as_str())
    }
}

/// One scoring rule: an intent, a name for debugging, a pure function.
#[derive(Clone, Copy)]
pub struct Rule {
    pub intent: Intent,
    pub name: &'static str,
    pub score: fn(&QueryFeatures) -> f64,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("intent", &self.intent)
            .field("name", &self.name)
            .finish()
    }
}

static PROXIMITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(near me|nearby|near by|around me|close to me|mere paas|paas mein|nazdeek)\b")
        .expect("static regex")
});
static PRICE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:\b(?:under|below|above|over|within|upto|up to|less than|more than|between)\s*(?:rs\.?|₹|inr)?\s*\d+)|(?:\d+\s*(?:rs\b|rupees|₹))|(?:₹\s*\d+)|(?:\b\d+\s*(?:se|ke)\s*(?:kam|andar|neeche)\b)",
    )
    .expect("static regex")
});
static GENERIC_OPENER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:i want|i am hungry|im hungry|show me|what should i|what to|suggest|recommend|kuch|something|anything)\b")
        .expect("static regex")
});

const BROWSE_WORDS: &[&str] = &["browse", "show", "list", "all", "menu", "types", "varieties"];
const DIETARY_WORDS: &[&str] = &[
    "veg", "nonveg", "non-veg", "vegan", "jain", "eggless", "gluten-free", "glutenfree", "pureveg",
];

fn store_keywords(q: &QueryFeatures) -> f64 {
    0.3 * q.count_tokens_in(STORE_KEYWORDS) as f64
}
fn store_proximity(q: &QueryFeatures) -> f64 {
    if PROXIMITY.is_match(&q.text) { 0.3 } else { 0.0 }
}
fn store_chain(q: &QueryFeatures) -> f64 {
    0.4 * q.count_phrases_in(CHAIN_BRANDS) as f64
}
fn category_keywords(q: &QueryFeatures) -> f64 {
    0.4 * q.count_phrases_in(CATEGORY_KEYWORDS) as f64
}
fn category_browse_words(q: &QueryFeatures) -> f64 {
    if q.has_token(BROWSE_WORDS) { 0.3 } else { 0.0 }
}
fn category_lone(q: &QueryFeatures) -> f64 {
    if q.tokens.len() == 1 && q.has_token(CATEGORY_KEYWORDS) { 0.2 } else { 0.0 }
}
fn dietary_keywords(q: &QueryFeatures) -> f64 {
    let two_word = ["non veg", "gluten free"]
        .iter()
        .filter(|p| contains_phrase(&q.text, p))
        .count();
    0.4 * (q.count_tokens_in(DIETARY_WORDS) + two_word) as f64
}
fn dietary_only(q: &QueryFeatures) -> f64 {
    if q.has_token(&["only", "pure", "sirf"]) && dietary_keywords(q) > 0.0 { 0.2 } else { 0.0 }
}
fn location_named_place(q: &QueryFeatures) -> f64 {
    match q.word_after(&["near", "around"]) {
        Some(place) if place != "me" && place != "by" => 0.5,
        _ => 0.0,
    }
}
fn location_near_me(q: &QueryFeatures) -> f64 {
    if contains_phrase(&q.text, "near me") || q.has_token(&["nearby"]) { 0.3 } else { 0.0 }
}
fn location_in_at(q: &QueryFeatures) -> f64 {
    match q.word_after(&["in", "at"]) {
        Some(place) if !place.chars().all(|c| c.is_ascii_digit()) => 0.2,
        _ => 0.0,
    }
}
fn price_pattern(q: &QueryFeatures) -> f64 {
    if PRICE_PATTERN.is_match(&q.text) { 0.7 } else { 0.0 }
}
fn price_words(q: &QueryFeatures) -> f64 {
    0.3 * q.count_tokens_in(PRICE_WORDS) as f64
}
fn brand_product(q: &QueryFeatures) -> f64 {
    0.5 * q.count_phrases_in(PRODUCT_BRANDS) as f64
}
fn brand_lone(q: &QueryFeatures) -> f64 {
    if q.tokens.len() == 1 && q.has_token(PRODUCT_BRANDS) { 0.2 } else { 0.0 }
}
fn general_words(q: &QueryFeatures) -> f64 {
    0.3 * q.count_tokens_in(GENERAL_WORDS) as f64
}
fn general_opener(q: &QueryFeatures) -> f64 {
    if GENERIC_OPENER.is_match(&q.text) { 0.4 } else { 0.0 }
}
fn item_floor(_: &QueryFeatures) -> f64 {
    0.3
}
fn item_dish(q: &QueryFeatures) -> f64 {
    if q.has_token(DISH_WORDS) { 0.2 } else { 0.0 }
}
fn item_length(q: &QueryFeatures) -> f64 {
    if (2..=4).contains(&q.tokens.len()) { 0.1 } else { 0.0 }
}

/// The built-in rule table.
pub const DEFAULT_RULES: &[Rule] = &[
    Rule { intent: Intent::StoreSearch, name: "store_keywords", score: store_keywords },
    Rule { intent: Intent::StoreSearch, name: "store_proximity", score: store_proximity },
    Rule { intent: Intent::StoreSearch, name: "store_chain", score: store_chain },
    Rule { intent: Intent::CategoryBrowse, name: "category_keywords", score: category_keywords },
    Rule { intent: Intent::CategoryBrowse, name: "category_browse_words", score: category_browse_words },
    Rule { intent: Intent::CategoryBrowse, name: "category_lone", score: category_lone },
    Rule { intent: Intent::DietaryFilter, name: "dietary_keywords", score: dietary_keywords },
    Rule { intent: Intent::DietaryFilter, name: "dietary_only", score: dietary_only },
    Rule { intent: Intent::LocationSearch, name: "location_named_place", score: location_named_place },
    Rule { intent: Intent::LocationSearch, name: "location_near_me", score: location_near_me },
    Rule { intent: Intent::LocationSearch, name: "location_in_at", score: location_in_at },
    Rule { intent: Intent::PriceSearch, name: "price_pattern", score: price_pattern },
    Rule { intent: Intent::PriceSearch, name: "price_words", score: price_words },
    Rule { intent: Intent::BrandSearch, name: "brand_product", score: brand_product },
    Rule { intent: Intent::BrandSearch, name: "brand_lone", score: brand_lone },
    Rule { intent: Intent::GeneralBrowse, name: "general_words", score: general_words },
    Rule { intent: Intent::GeneralBrowse, name: "general_opener", score: general_opener },
    Rule { intent: Intent::ItemSearch, name: "item_floor", score: item_floor },
    Rule { intent: Intent::ItemSearch, name: "item_dish", score: item_dish },
    Rule { intent: Intent::ItemSearch, name: "item_length", score: item_length },
];

/// Classifier output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub intent: Intent,
    /// Winning score clamped to `[0, 1]`.
    pub confidence: f64,
    pub entities: Entities,
    /// Raw (unclamped) score per intent, in tie-resolution order.
    pub scores: Vec<(Intent, f64)>,
}

#[derive(Debug, Clone)]
pub struct IntentClassifier {
    rules: Vec<Rule>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::with_rules(DEFAULT_RULES.to_vec())
    }
}

impl IntentClassifier {
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Every intent's summed score. All rules run, always.
    pub fn scores(&self, normalized: &str) -> Vec<(Intent, f64)> {
        let features = QueryFeatures::new(normalized);
        Intent::ALL
            .iter()
            .map(|intent| {
                let total = self
                    .rules
                    .iter()
                    .filter(|r| r.intent == *intent)
                    .map(|r| (r.score)(&features))
                    .sum();
                (*intent, total)
            })
            .collect()
    }

    pub fn classify(&self, normalized: &str) -> Classification {
        let scores = self.scores(normalized);

        let mut best = (Intent::ItemSearch, f64::NEG_INFINITY);
        for (intent, score) in &scores {
            let wins = if *intent == Intent::ItemSearch {
                *score >= best.1
            } else {
                *score > best.1
            };
            if wins {
                best = (*intent, *score);
            }
        }

        Classification {
            intent: best.0,
            confidence: best.1.clamp(0.0, 1.0),
            entities: extract_entities(normalized),
            scores,
        }
    }
}
