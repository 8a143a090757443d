// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Bidirectional synonym groups.
//!
//! A group is a canonical word plus the forms people type for it: "chicken"
//! for "murgi", "murg", "kombdi". Two operations read the groups:
//!
//! - **normalize** rewrites each token to its canonical, so "murgi curry"
//!   and "chicken gravy" reach the ranker as the same query.
//! - **expand** keeps every original token and appends up to three members
//!   of its group, so the lexical index can match whichever spelling the
//!   catalog happens to use.
//!
//! Forms partition the vocabulary: a form belongs to exactly one group. Trying
//! to move a form into a second group is rejected outright (see
//! [`SynonymStore::add_synonym_group`]) rather than letting the last writer win.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

use super::vocabulary::SYNONYM_GROUPS;
use crate::error::{KhojError, Result};

/// Most synonyms appended per recognized token during expansion.
pub const MAX_EXPANSIONS_PER_TOKEN: usize = 3;

#[derive(Debug, Default)]
struct Groups {
    /// form → canonical. Canonicals map to themselves.
    canonical: HashMap<String, String>,
    /// canonical → forms, in insertion order (canonical excluded).
    forms: HashMap<String, Vec<String>>,
    /// Canonicals in insertion order.
    order: Vec<String>,
}

/// Shared synonym table. Cheap to read concurrently.
#[derive(Debug, Default)]
pub struct SynonymStore {
    groups: RwLock<Groups>,
}

impl SynonymStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Store holding the built-in groups.
    pub fn seeded() -> Self {
        let store = Self::empty();
        {
            let mut groups = store.groups.write();
            for (canonical, forms) in SYNONYM_GROUPS {
                let forms: Vec<String> = forms.iter().map(|f| clean(f)).collect();
                groups.insert(&clean(canonical), &forms);
            }
        }
        store
    }

    /// Add a group, or extend an existing one with new forms.
    ///
    /// All-or-nothing: if any form (or the canonical itself) already belongs
    /// to a different canonical, nothing is applied and
    /// [`KhojError::SynonymConflict`] names the first offender. Re-adding a
    /// form to its own group is a no-op.
    pub fn add_synonym_group(&self, canonical: &str, forms: &[&str]) -> Result<()> {
        let canonical = clean(canonical);
        if canonical.is_empty() {
            return Err(KhojError::InvalidSynonymGroup {
                canonical,
                reason: "canonical is empty".to_string(),
            });
        }
        let forms: Vec<String> = forms
            .iter()
            .map(|f| clean(f))
            .filter(|f| !f.is_empty())
            .collect();

        let mut groups = self.groups.write();
        for form in std::iter::once(&canonical).chain(forms.iter()) {
            if let Some(existing) = groups.canonical.get(form) {
                if *existing != canonical {
                    return Err(KhojError::SynonymConflict {
                        form: form.clone(),
                        existing: existing.clone(),
                        requested: canonical.clone(),
                    });
                }
            }
        }
        groups.insert(&canonical, &forms);
        Ok(())
    }

    /// The canonical `token` normalizes to, if it belongs to a group.
    pub fn canonical_of(&self, token: &str) -> Option<String> {
        self.groups.read().canonical.get(&clean(token)).cloned()
    }

    /// Every member of `token`'s group except `token` itself, canonical first.
    pub fn synonyms_of(&self, token: &str) -> Vec<String> {
        let token = clean(token);
        let groups = self.groups.read();
        let Some(canonical) = groups.canonical.get(&token) else {
            return Vec::new();
        };
        std::iter::once(canonical)
            .chain(groups.forms.get(canonical).into_iter().flatten())
            .filter(|member| **member != token)
            .cloned()
            .collect()
    }

    pub fn group_count(&self) -> usize {
        self.groups.read().order.len()
    }

    /// Canonicals in the order their groups were first added.
    pub fn canonicals(&self) -> Vec<String> {
        self.groups.read().order.clone()
    }

    /// Replace each token with its canonical, if it has one.
    pub fn normalize_query(&self, query: &str) -> String {
        let groups = self.groups.read();
        query
            .split_whitespace()
            .map(|token| {
                let key = token.to_lowercase();
                groups.canonical.get(&key).cloned().unwrap_or(key)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Original tokens plus up to three synonyms each, deduplicated, in
    /// insertion order.
    pub fn expand_tokens(&self, query: &str) -> Vec<String> {
        let groups = self.groups.read();
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for token in query.split_whitespace() {
            let token = token.to_lowercase();
            if seen.insert(token.clone()) {
                out.push(token.clone());
            }
            let Some(canonical) = groups.canonical.get(&token) else {
                continue;
            };
            let members = std::iter::once(canonical)
                .chain(groups.forms.get(canonical).into_iter().flatten())
                .filter(|member| **member != token)
                .take(MAX_EXPANSIONS_PER_TOKEN);
            for member in members {
                if seen.insert(member.clone()) {
                    out.push(member.clone());
                }
            }
        }
        out
    }

    /// [`expand_tokens`](Self::expand_tokens) joined with spaces.
    pub fn expand_query(&self, query: &str) -> String {
        self.expand_tokens(query).join(" ")
    }
}

impl Groups {
    fn insert(&mut self, canonical: &str, forms: &[String]) {
        if !self.forms.contains_key(canonical) {
            self.order.push(canonical.to_string());
            self.forms.insert(canonical.to_string(), Vec::new());
        }
        self.canonical
            .insert(canonical.to_string(), canonical.to_string());
        for form in forms {
            if form == canonical || self.canonical.contains_key(form) {
                continue;
            }
            self.canonical.insert(form.clone(), canonical.to_string());
            if let Some(list) = self.forms.get_mut(canonical) {
                list.push(form.clone());
            }
        }
    }
}

fn clean(s: &str) -> String {
    s.trim().to_lowercase()
}
