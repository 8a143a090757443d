// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Store-name gazetteer: built-in chains plus names learned from the catalog.

use std::collections::BTreeSet;

use parking_lot::RwLock;

use crate::understanding::entities::contains_phrase;
use crate::understanding::vocabulary::{
    CATEGORY_KEYWORDS, CHAIN_BRANDS, DISH_WORDS, GENERAL_WORDS, STORE_KEYWORDS,
};

#[derive(Debug, Default)]
pub struct Gazetteer {
    learned: RwLock<BTreeSet<String>>,
}

impl Gazetteer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn distinctive tokens from local store names.
    ///
    /// "Inayat Cafe" teaches "inayat" but not "cafe": generic store, dish and
    /// category words would turn every query into a store lookup.
    /// Returns how many new tokens were added.
    pub fn learn_store_names<S: AsRef<str>>(&self, names: &[S]) -> usize {
        let mut learned = self.learned.write();
        let before = learned.len();
        for name in names {
            for token in name.as_ref().split_whitespace() {
                let token = token
                    .trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase();
                if token.chars().count() >= 3 && !is_generic(&token) {
                    learned.insert(token);
                }
            }
        }
        learned.len() - before
    }

    /// Exact token lookup against chains and learned names.
    pub fn is_brand(&self, token: &str) -> bool {
        let token = token.trim().to_lowercase();
        CHAIN_BRANDS.contains(&token.as_str()) || self.learned.read().contains(&token)
    }

    /// First chain phrase or learned token found in `lowercase_text`.
    pub fn find_brand(&self, lowercase_text: &str) -> Option<String> {
        if let Some(chain) = CHAIN_BRANDS
            .iter()
            .find(|brand| contains_phrase(lowercase_text, brand))
        {
            return Some((*chain).to_string());
        }
        let learned = self.learned.read();
        lowercase_text
            .split_whitespace()
            .find(|token| learned.contains(*token))
            .map(str::to_string)
    }

    pub fn learned_count(&self) -> usize {
        self.learned.read().len()
    }
}

fn is_generic(token: &str) -> bool {
    STORE_KEYWORDS.contains(&token)
        || CATEGORY_KEYWORDS.contains(&token)
        || DISH_WORDS.contains(&token)
        || GENERAL_WORDS.contains(&token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learns_distinctive_tokens_only() {
        let g = Gazetteer::new();
        let added = g.learn_store_names(&["Inayat Cafe", "Shree Krishna Sweets", "Al Bake"]);
        assert!(g.is_brand("inayat"));
        assert!(g.is_brand("Krishna"));
        assert!(!g.is_brand("cafe"));
        assert!(!g.is_brand("sweets"));
        // "al" is too short
        assert!(!g.is_brand("al"));
        assert_eq!(added, 4); // inayat, shree, krishna, bake
    }

    #[test]
    fn chains_are_found_as_phrases() {
        let g = Gazetteer::new();
        assert_eq!(g.find_brand("burger king whopper").as_deref(), Some("burger king"));
        assert_eq!(g.find_brand("king size burger"), None);
    }
}
