// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Typed entities pulled out of a normalized query.
//!
//! Extraction is intent-agnostic: "veg biryani under 200 near baner" yields
//! a dietary entity, a budget and a location whether the classifier calls it
//! an item search or a price search. Consumers match on [`Entity`]
//! exhaustively; anything with a `key:value` shape we don't understand lands
//! in [`Entity::Unrecognized`] instead of disappearing.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::vocabulary::{
    CATEGORY_KEYWORDS, CHAIN_BRANDS, CUISINE_KEYWORDS, OCCASION_WORDS, PRODUCT_BRANDS,
};
use crate::types::SortOrder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dietary {
    Veg,
    NonVeg,
    Vegan,
    Jain,
    Eggless,
    GlutenFree,
}

impl Dietary {
    /// Whether items matching this preference must be vegetarian.
    pub fn requires_veg(self) -> Option<bool> {
        match self {
            Dietary::Veg | Dietary::Vegan | Dietary::Jain => Some(true),
            Dietary::NonVeg => Some(false),
            Dietary::Eggless | Dietary::GlutenFree => None,
        }
    }
}

/// A price constraint in rupees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceBound {
    Under(f64),
    Over(f64),
    Between(f64, f64),
}

impl PriceBound {
    pub fn min(&self) -> Option<f64> {
        match *self {
            PriceBound::Over(v) => Some(v),
            PriceBound::Between(lo, _) => Some(lo),
            PriceBound::Under(_) => None,
        }
    }

    pub fn max(&self) -> Option<f64> {
        match *self {
            PriceBound::Under(v) => Some(v),
            PriceBound::Between(_, hi) => Some(hi),
            PriceBound::Over(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeHint {
    Now,
    Tonight,
    Morning,
    Lunch,
    Dinner,
    Late,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Entity {
    Cuisine(String),
    Dietary(Dietary),
    Budget(PriceBound),
    /// Head count or plate count.
    Quantity(u32),
    Time(TimeHint),
    /// A restaurant chain from the brand gazetteer.
    Restaurant(String),
    /// A packaged-goods brand.
    Brand(String),
    Occasion(String),
    Location(String),
    Category(String),
    Unrecognized { key: String, value: String },
}

/// All entities found in one query, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entities(pub Vec<Entity>);

impl Entities {
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn dietary(&self) -> Option<Dietary> {
        self.iter().find_map(|e| match e {
            Entity::Dietary(d) => Some(*d),
            _ => None,
        })
    }

    pub fn budget(&self) -> Option<PriceBound> {
        self.iter().find_map(|e| match e {
            Entity::Budget(b) => Some(*b),
            _ => None,
        })
    }

    pub fn location(&self) -> Option<&str> {
        self.iter().find_map(|e| match e {
            Entity::Location(l) => Some(l.as_str()),
            _ => None,
        })
    }

    pub fn category(&self) -> Option<&str> {
        self.iter().find_map(|e| match e {
            Entity::Category(c) => Some(c.as_str()),
            _ => None,
        })
    }

    pub fn cuisine(&self) -> Option<&str> {
        self.iter().find_map(|e| match e {
            Entity::Cuisine(c) => Some(c.as_str()),
            _ => None,
        })
    }

    pub fn restaurant(&self) -> Option<&str> {
        self.iter().find_map(|e| match e {
            Entity::Restaurant(r) => Some(r.as_str()),
            _ => None,
        })
    }

    pub fn brand(&self) -> Option<&str> {
        self.iter().find_map(|e| match e {
            Entity::Brand(b) => Some(b.as_str()),
            _ => None,
        })
    }

    pub fn quantity(&self) -> Option<u32> {
        self.iter().find_map(|e| match e {
            Entity::Quantity(q) => Some(*q),
            _ => None,
        })
    }

    pub fn time(&self) -> Option<TimeHint> {
        self.iter().find_map(|e| match e {
            Entity::Time(t) => Some(*t),
            _ => None,
        })
    }

    pub fn occasion(&self) -> Option<&str> {
        self.iter().find_map(|e| match e {
            Entity::Occasion(o) => Some(o.as_str()),
            _ => None,
        })
    }

    fn push_unique(&mut self, entity: Entity) {
        if !self.0.contains(&entity) {
            self.0.push(entity);
        }
    }
}

/// Filters the caller may want to apply, derived from entities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendedFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub veg: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortOrder>,
}

impl RecommendedFilters {
    /// Turn entities (plus a few sort cue words) into filters.
    pub fn derive(entities: &Entities, tokens: &[String]) -> Self {
        let budget = entities.budget();
        let has = |words: &[&str]| tokens.iter().any(|t| words.contains(&t.as_str()));

        let sort = if has(&["cheap", "cheapest", "sasta"]) {
            Some(SortOrder::PriceAsc)
        } else if has(&["best", "top", "rated"]) {
            Some(SortOrder::Rating)
        } else if has(&["popular", "trending"]) {
            Some(SortOrder::Popularity)
        } else {
            None
        };

        Self {
            veg: entities.dietary().and_then(Dietary::requires_veg),
            price_min: budget.and_then(|b| b.min()),
            price_max: budget.and_then(|b| b.max()),
            category: entities.category().map(str::to_string),
            brand: entities
                .restaurant()
                .or_else(|| entities.brand())
                .map(str::to_string),
            location: entities.location().map(str::to_string),
            sort,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ============================================================================
// EXTRACTION
// ============================================================================

static PRICE_UNDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:under|below|less than|within|upto|up to|max)\s*(?:rs\.?|₹|inr)?\s*(\d+(?:\.\d+)?)")
        .expect("static regex")
});
static PRICE_OVER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:above|over|more than|min)\s*(?:rs\.?|₹|inr)?\s*(\d+(?:\.\d+)?)")
        .expect("static regex")
});
static PRICE_BETWEEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:between\s*)?(?:rs\.?|₹)?\s*(\d+)\s*(?:-|to|and)\s*(?:rs\.?|₹)?\s*(\d+)\b")
        .expect("static regex")
});
/// Hinglish: "200 se kam", "300 ke andar"
static PRICE_UNDER_HINGLISH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d+)\s*(?:rs|rupees|rupaye)?\s*(?:se|ke)\s*(?:kam|neeche|andar)\b")
        .expect("static regex")
});
static QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:for\s+(\d+)\s*(?:people|persons|person|log|jan|pax)|(\d+)\s*(?:plates?|people|persons|log))\b")
        .expect("static regex")
});

const LOCATION_TRIGGERS: &[&str] = &["near", "around", "in", "at"];
const LOCATION_STOPS: &[&str] = &[
    "under", "below", "above", "for", "with", "from", "and", "veg", "nonveg", "only", "me",
    "cheap", "tonight", "now",
];

/// Run every extractor over a normalized (lowercase, canonical) query.
pub fn extract_entities(normalized: &str) -> Entities {
    let text = normalized.trim();
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut entities = Entities::default();

    extract_dietary(&tokens, &mut entities);
    extract_budget(text, &mut entities);
    extract_quantity(text, &mut entities);
    extract_time(text, &tokens, &mut entities);
    extract_location(&tokens, &mut entities);

    for brand in CHAIN_BRANDS {
        if contains_phrase(text, brand) {
            entities.push_unique(Entity::Restaurant((*brand).to_string()));
        }
    }
    for brand in PRODUCT_BRANDS {
        if contains_phrase(text, brand) {
            entities.push_unique(Entity::Brand((*brand).to_string()));
        }
    }
    for cuisine in CUISINE_KEYWORDS {
        if contains_phrase(text, cuisine) {
            entities.push_unique(Entity::Cuisine((*cuisine).to_string()));
        }
    }
    for category in CATEGORY_KEYWORDS {
        if contains_phrase(text, category) {
            entities.push_unique(Entity::Category((*category).to_string()));
        }
    }
    for occasion in OCCASION_WORDS {
        if contains_phrase(text, occasion) {
            entities.push_unique(Entity::Occasion((*occasion).to_string()));
        }
    }

    for token in &tokens {
        if let Some((key, value)) = token.split_once(':') {
            if !key.is_empty() && !value.is_empty() {
                entities.push_unique(Entity::Unrecognized {
                    key: key.to_string(),
                    value: value.to_string(),
                });
            }
        }
    }

    entities
}

/// Whole-word (or whole-phrase) containment.
pub(crate) fn contains_phrase(text: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return false;
    }
    let mut start = 0;
    while let Some(pos) = text[start..].find(phrase) {
        let begin = start + pos;
        let end = begin + phrase.len();
        let left_ok = text[..begin]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let right_ok = text[end..].chars().next().map_or(true, |c| !c.is_alphanumeric());
        if left_ok && right_ok {
            return true;
        }
        start = begin + phrase.chars().next().map_or(1, char::len_utf8);
    }
    false
}

fn extract_dietary(tokens: &[&str], entities: &mut Entities) {
    let mut i = 0;
    while i < tokens.len() {
        let two = tokens.get(i + 1).map(|next| (tokens[i], *next));
        let (dietary, width) = match (tokens[i], two) {
            (_, Some(("non", "veg"))) => (Some(Dietary::NonVeg), 2),
            (_, Some(("gluten", "free"))) => (Some(Dietary::GlutenFree), 2),
            ("nonveg" | "non-veg", _) => (Some(Dietary::NonVeg), 1),
            ("veg" | "pureveg", _) => (Some(Dietary::Veg), 1),
            ("vegan", _) => (Some(Dietary::Vegan), 1),
            ("jain", _) => (Some(Dietary::Jain), 1),
            ("eggless", _) => (Some(Dietary::Eggless), 1),
            ("gluten-free" | "glutenfree", _) => (Some(Dietary::GlutenFree), 1),
            _ => (None, 1),
        };
        if let Some(d) = dietary {
            entities.push_unique(Entity::Dietary(d));
        }
        i += width;
    }
}

fn capture_f64(caps: &regex::Captures<'_>, group: usize) -> Option<f64> {
    caps.get(group)?.as_str().parse().ok()
}

fn extract_budget(text: &str, entities: &mut Entities) {
    let under = PRICE_UNDER
        .captures(text)
        .or_else(|| PRICE_UNDER_HINGLISH.captures(text))
        .and_then(|c| capture_f64(&c, 1));
    let over = PRICE_OVER.captures(text).and_then(|c| capture_f64(&c, 1));

    let bound = match (over, under) {
        (Some(lo), Some(hi)) if lo <= hi => Some(PriceBound::Between(lo, hi)),
        (_, Some(hi)) => Some(PriceBound::Under(hi)),
        (Some(lo), None) => Some(PriceBound::Over(lo)),
        (None, None) => PRICE_BETWEEN.captures(text).and_then(|c| {
            let (a, b) = (capture_f64(&c, 1)?, capture_f64(&c, 2)?);
            (a < b).then_some(PriceBound::Between(a, b))
        }),
    };
    if let Some(bound) = bound {
        entities.push_unique(Entity::Budget(bound));
    }
}

fn extract_quantity(text: &str, entities: &mut Entities) {
    let quantity = QUANTITY.captures(text).and_then(|c| {
        c.get(1)
            .or_else(|| c.get(2))
            .and_then(|m| m.as_str().parse::<u32>().ok())
    });
    if let Some(q) = quantity.filter(|q| *q > 0) {
        entities.push_unique(Entity::Quantity(q));
    }
}

fn extract_time(text: &str, tokens: &[&str], entities: &mut Entities) {
    let hint = if contains_phrase(text, "late night") || tokens.contains(&"midnight") {
        Some(TimeHint::Late)
    } else {
        tokens.iter().find_map(|t| match *t {
            "now" | "abhi" | "asap" | "jaldi" => Some(TimeHint::Now),
            "tonight" | "raat" => Some(TimeHint::Tonight),
            "morning" | "subah" | "breakfast" | "nashta" => Some(TimeHint::Morning),
            "lunch" => Some(TimeHint::Lunch),
            "dinner" => Some(TimeHint::Dinner),
            _ => None,
        })
    };
    if let Some(hint) = hint {
        entities.push_unique(Entity::Time(hint));
    }
}

fn extract_location(tokens: &[&str], entities: &mut Entities) {
    for (i, token) in tokens.iter().enumerate() {
        if !LOCATION_TRIGGERS.contains(token) {
            continue;
        }
        let phrase: Vec<&str> = tokens[i + 1..]
            .iter()
            .take_while(|t| !LOCATION_STOPS.contains(*t) && !LOCATION_TRIGGERS.contains(*t))
            .take_while(|t| !t.chars().all(|c| c.is_ascii_digit()))
            .take(3)
            .copied()
            .collect();
        if !phrase.is_empty() {
            entities.push_unique(Entity::Location(phrase.join(" ")));
            return;
        }
    }
}
