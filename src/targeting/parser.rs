// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Store/item disambiguation.
//!
//! Three outcomes, checked in order:
//!
//! 1. **Item from store**: a connector phrase with both sides filled
//!    ("butter chicken from Inayat Cafe", "Paradise se biryani mangao").
//! 2. **Store first**: any one of the store signals fires.
//! 3. **Generic**: nothing fired; search items normally.
//!
//! This is a cascade of cheap heuristics, and it leans toward `StoreFirst`.
//! A wrong store guess costs one store lookup that comes back empty before
//! the caller falls back to items. A missed store costs the user their store.
//!
//! Keyword checks are case-insensitive. Returned fragments keep the user's
//! casing, because "Inayat Cafe" is what the store index has.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::gazetteer::Gazetteer;
use crate::understanding::vocabulary::STORE_KEYWORDS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    SpecificItemSpecificStore,
    StoreFirst,
    Generic,
}

/// Why a query was treated as naming a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreSignal {
    KnownBrand,
    StoreKeyword,
    PartialStoreKeyword,
    BrandAtEdge,
    AllCapsToken,
    ShortCapitalized,
    ProperNameWithPartialStoreWord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreItemIntent {
    pub kind: TargetKind,
    pub raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_brand: Option<String>,
    pub is_brand_search: bool,
    /// Which connector matched, for `SpecificItemSpecificStore`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signals: Vec<StoreSignal>,
}

struct Connector {
    name: &'static str,
    regex: Regex,
}

const STORE_SUFFIXES: &str =
    "restaurant|restro|cafe|café|hotel|dhaba|bakery|bakers|kitchen|shop|store|mart|sweets|canteen|bhojnalaya";

static CONNECTORS: LazyLock<Vec<Connector>> = LazyLock::new(|| {
    let specs: [(&'static str, String); 5] = [
        (
            "store_suffixed",
            format!(r"(?i)^(?P<item>.+?)\s+(?:from|at|in)\s+(?P<store>.+?\s+(?:{STORE_SUFFIXES}))$"),
        ),
        ("from", r"(?i)^(?P<item>.+?)\s+from\s+(?P<store>.+)$".to_string()),
        ("at", r"(?i)^(?P<item>.+?)\s+at\s+(?P<store>.+)$".to_string()),
        (
            "hinglish_se",
            r"(?i)^(?P<store>.+?)\s+se\s+(?P<item>.+?)\s+(?:mangao|mangwao|mangvao|order karo|chahiye|bhejo)$"
                .to_string(),
        ),
        ("in", r"(?i)^(?P<item>.+?)\s+in\s+(?P<store>.+)$".to_string()),
    ];
    specs
        .into_iter()
        .filter_map(|(name, pattern)| Regex::new(&pattern).ok().map(|regex| Connector { name, regex }))
        .collect()
});

/// Words that can follow a connector without naming a store.
const NOT_A_STORE: &[&str] = &[
    "me", "home", "night", "morning", "lunch", "dinner", "once", "discount", "offer", "veg",
    "nonveg", "budget", "low", "cheap", "less", "half", "full", "large", "small", "medium",
];

#[derive(Debug, Default)]
pub struct QueryIntentParser {
    gazetteer: Gazetteer,
}

impl QueryIntentParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn learn_store_names<S: AsRef<str>>(&self, names: &[S]) -> usize {
        self.gazetteer.learn_store_names(names)
    }

    pub fn is_brand(&self, token: &str) -> bool {
        self.gazetteer.is_brand(token)
    }

    pub fn parse(&self, raw: &str) -> StoreItemIntent {
        let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        let lower = text.to_lowercase();

        if let Some((name, item, store)) = match_connector(&text) {
            let detected_brand = self.gazetteer.find_brand(&store.to_lowercase());
            return StoreItemIntent {
                kind: TargetKind::SpecificItemSpecificStore,
                raw: raw.to_string(),
                item_query: Some(item),
                is_brand_search: detected_brand.is_some(),
                store_query: Some(store),
                detected_brand,
                pattern: Some(name.to_string()),
                signals: Vec::new(),
            };
        }

        let detected_brand = self.gazetteer.find_brand(&lower);
        let signals = self.store_signals(&text, &lower, detected_brand.is_some());

        if signals.is_empty() {
            return StoreItemIntent {
                kind: TargetKind::Generic,
                raw: raw.to_string(),
                item_query: (!text.is_empty()).then(|| text.clone()),
                store_query: None,
                detected_brand: None,
                is_brand_search: false,
                pattern: None,
                signals,
            };
        }

        let is_brand_search =
            detected_brand.is_some() || signals.contains(&StoreSignal::AllCapsToken);
        StoreItemIntent {
            kind: TargetKind::StoreFirst,
            raw: raw.to_string(),
            item_query: None,
            store_query: Some(text),
            detected_brand,
            is_brand_search,
            pattern: None,
            signals,
        }
    }

    /// Every store signal that fires, in check order.
    pub fn store_signals(&self, text: &str, lower: &str, has_brand: bool) -> Vec<StoreSignal> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let lower_tokens: Vec<&str> = lower.split_whitespace().collect();
        let mut signals = Vec::new();

        if has_brand {
            signals.push(StoreSignal::KnownBrand);
        }
        if lower_tokens.iter().any(|t| STORE_KEYWORDS.contains(t)) {
            signals.push(StoreSignal::StoreKeyword);
        }
        if lower_tokens.iter().any(|t| is_partial_store_keyword(t)) {
            signals.push(StoreSignal::PartialStoreKeyword);
        }
        let edges = [lower_tokens.first(), lower_tokens.last()];
        if edges.iter().flatten().any(|t| self.gazetteer.is_brand(t)) {
            signals.push(StoreSignal::BrandAtEdge);
        }
        if tokens.iter().any(|t| is_all_caps_short(t)) {
            signals.push(StoreSignal::AllCapsToken);
        }
        if (1..=3).contains(&tokens.len()) {
            let title_case = tokens.iter().all(|t| starts_uppercase(t));
            let capitals = text.chars().filter(|c| c.is_uppercase()).count();
            if title_case || capitals >= 2 {
                signals.push(StoreSignal::ShortCapitalized);
            }
        }
        if let [first, second, ..] = tokens.as_slice() {
            if starts_uppercase(first) && is_partial_store_keyword(&second.to_lowercase()) {
                signals.push(StoreSignal::ProperNameWithPartialStoreWord);
            }
        }
        signals
    }
}

fn match_connector(text: &str) -> Option<(&'static str, String, String)> {
    CONNECTORS.iter().find_map(|connector| {
        let caps = connector.regex.captures(text)?;
        let item = caps.name("item")?.as_str().trim();
        let store = caps.name("store")?.as_str().trim();
        plausible_store(store)
            .then(|| (connector.name, item.to_string(), store.to_string()))
            .filter(|_| !item.is_empty())
    })
}

fn plausible_store(store: &str) -> bool {
    let lower = store.to_lowercase();
    !store.is_empty()
        && !store.chars().all(|c| c.is_ascii_digit() || c.is_whitespace())
        && !NOT_A_STORE.contains(&lower.as_str())
}

/// A 3+ character prefix of a store keyword that isn't the whole keyword.
fn is_partial_store_keyword(token: &str) -> bool {
    token.chars().count() >= 3
        && !STORE_KEYWORDS.contains(&token)
        && STORE_KEYWORDS.iter().any(|k| k.starts_with(token))
}

fn is_all_caps_short(token: &str) -> bool {
    let len = token.chars().count();
    (2..=4).contains(&len) && token.chars().all(|c| c.is_ascii_uppercase())
}

fn starts_uppercase(token: &str) -> bool {
    token.chars().next().is_some_and(char::is_uppercase)
}
