// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! An in-process [`DocumentIndex`] over a catalog held in memory.
//!
//! Lexical scoring is tiered per query term, best tier per field, times the
//! field boost:
//!
//! | Tier      | Score | When                                        |
//! |-----------|-------|---------------------------------------------|
//! | exact     | 1.0   | a field token equals the term               |
//! | prefix    | 0.5   | a field token starts with the term (≥ 3 chars) |
//! | fuzzy d=1 | 0.3   | one edit away, if fuzziness allows          |
//! | fuzzy d=2 | 0.15  | two edits away, if fuzziness allows         |
//!
//! A document's score is the sum over terms. Predicates are checked first;
//! a document that fails one is never scored.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::embedder::{cosine, HashingEmbedder};
use crate::error::{Backend, KhojError, Result};
use crate::facets::aggregate;
use crate::fuzzy::bounded_distance;
use crate::retrieval::{
    auto_fuzziness, sort_by_score, vector_field, DocumentIndex, EmbeddingProvider, FieldBoost,
    FieldValue, Hit, HitSource, HybridQuery, IndexResponse, LexicalQuery, Predicate, VectorQuery,
};
use crate::types::CatalogItem;
use crate::util::normalize::normalized_tokens;

pub const EXACT_SCORE: f64 = 1.0;
pub const PREFIX_SCORE: f64 = 0.5;
pub const FUZZY_D1_SCORE: f64 = 0.3;
pub const FUZZY_D2_SCORE: f64 = 0.15;

/// Prefix matches only count for terms at least this long.
const MIN_PREFIX_LEN: usize = 3;

#[derive(Debug, Clone)]
struct Document {
    item: CatalogItem,
    /// Field name → normalized tokens.
    fields: HashMap<&'static str, Vec<String>>,
    vector: Option<Vec<f32>>,
}

impl Document {
    fn new(item: CatalogItem, embedder: Option<&HashingEmbedder>) -> Self {
        let mut fields = HashMap::with_capacity(4);
        fields.insert("name", normalized_tokens(&item.name));
        fields.insert("category", normalized_tokens(&item.category));
        fields.insert("store_name", normalized_tokens(&item.store_name));
        fields.insert("description", normalized_tokens(&item.description));
        let vector = embedder.map(|e| e.embed_text(&embedding_text(&item)));
        Self {
            item,
            fields,
            vector,
        }
    }
}

/// What gets embedded for an item.
pub fn embedding_text(item: &CatalogItem) -> String {
    format!(
        "{} {} {} {}",
        item.name, item.category, item.store_name, item.description
    )
}

pub struct MemoryIndex {
    name: String,
    docs: RwLock<Vec<Document>>,
    embedder: Option<Arc<HashingEmbedder>>,
    native_hybrid: bool,
}

impl MemoryIndex {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            docs: RwLock::new(Vec::new()),
            embedder: None,
            native_hybrid: false,
        }
    }

    /// Store an embedding per item so vector search works. Set before adding items.
    pub fn with_embedder(mut self, embedder: Arc<HashingEmbedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Answer [`hybrid_search`](DocumentIndex::hybrid_search) in one call.
    pub fn with_native_hybrid(mut self, enabled: bool) -> Self {
        self.native_hybrid = enabled;
        self
    }

    pub fn from_items(name: &str, items: Vec<CatalogItem>) -> Self {
        let index = Self::new(name);
        index.add_items(items);
        index
    }

    /// Add or replace (by id).
    pub fn add_items(&self, items: Vec<CatalogItem>) {
        let embedder = self.embedder.as_deref();
        let mut docs = self.docs.write();
        for item in items {
            let doc = Document::new(item, embedder);
            match docs.iter_mut().find(|d| d.item.id == doc.item.id) {
                Some(existing) => *existing = doc,
                None => docs.push(doc),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    pub fn items(&self) -> Vec<CatalogItem> {
        self.docs.read().iter().map(|d| d.item.clone()).collect()
    }

    fn vector_dimension(&self) -> Option<usize> {
        self.embedder.as_ref().map(|e| e.dimension())
    }

    /// Lexical scores for every matching doc, unsorted.
    fn lexical_scores(&self, query: &LexicalQuery) -> Vec<(f64, Vec<String>, CatalogItem)> {
        let terms = normalized_tokens(&query.text);
        let docs = self.docs.read();
        let score_one = |doc: &Document| -> Option<(f64, Vec<String>, CatalogItem)> {
            if !query.predicates.iter().all(|p| matches_predicate(&doc.item, p)) {
                return None;
            }
            let (score, highlights) = score_document(doc, &terms, &query.fields, query.fuzzy);
            (score > 0.0).then(|| (score, highlights, doc.item.clone()))
        };

        #[cfg(feature = "parallel")]
        let scored: Vec<_> = docs.par_iter().filter_map(score_one).collect();
        #[cfg(not(feature = "parallel"))]
        let scored: Vec<_> = docs.iter().filter_map(score_one).collect();
        scored
    }

    fn vector_scores(&self, query: &VectorQuery) -> Result<Vec<(f64, CatalogItem)>> {
        match self.vector_dimension() {
            Some(dim) if vector_field(dim) == query.field => {}
            _ => {
                return Err(KhojError::upstream(
                    Backend::VectorIndex,
                    format!("{} has no field '{}'", self.name, query.field),
                ))
            }
        }
        let docs = self.docs.read();
        Ok(docs
            .iter()
            .filter(|d| query.predicates.iter().all(|p| matches_predicate(&d.item, p)))
            .filter_map(|d| {
                let v = d.vector.as_ref()?;
                let sim = cosine(&query.vector, v);
                (sim > 0.0).then(|| (sim, d.item.clone()))
            })
            .collect())
    }

    fn hit(
        &self,
        item: CatalogItem,
        score: f64,
        source: HitSource,
        highlights: Vec<String>,
    ) -> Hit {
        Hit {
            id: item.id.clone(),
            index: self.name.clone(),
            score,
            source,
            highlights,
            item,
        }
    }
}

fn score_document(
    doc: &Document,
    terms: &[String],
    fields: &[FieldBoost],
    fuzzy: bool,
) -> (f64, Vec<String>) {
    let mut total = 0.0;
    let mut highlights = Vec::new();
    for term in terms {
        let mut best = 0.0f64;
        let mut best_token: Option<&str> = None;
        for field in fields {
            let Some(tokens) = doc.fields.get(field.field.as_str()) else {
                continue;
            };
            for token in tokens {
                let tier = term_score(term, token, fuzzy);
                if tier * field.boost > best {
                    best = tier * field.boost;
                    best_token = Some(token);
                }
            }
        }
        if let Some(token) = best_token {
            total += best;
            if !highlights.iter().any(|h: &String| h == token) {
                highlights.push(token.to_string());
            }
        }
    }
    (total, highlights)
}

fn term_score(term: &str, token: &str, fuzzy: bool) -> f64 {
    if term == token {
        return EXACT_SCORE;
    }
    if term.chars().count() >= MIN_PREFIX_LEN && token.starts_with(term) {
        return PREFIX_SCORE;
    }
    if fuzzy {
        let max = auto_fuzziness(term);
        if max > 0 {
            match bounded_distance(term, token, max) {
                Some(1) => return FUZZY_D1_SCORE,
                Some(2) => return FUZZY_D2_SCORE,
                _ => {}
            }
        }
    }
    0.0
}

/// Evaluate one predicate. Unknown fields never match.
pub fn matches_predicate(item: &CatalogItem, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Equals { field, value } => match (field.as_str(), value) {
            ("module_id", FieldValue::Int(v)) => item.module_id == *v,
            ("zone_id", FieldValue::Int(v)) => item.zone_id == *v,
            ("category_id", FieldValue::Int(v)) => item.category_id == *v,
            ("store_id", FieldValue::Int(v)) => item.store_id == *v,
            ("veg", FieldValue::Bool(v)) => item.veg == *v,
            ("in_stock", FieldValue::Bool(v)) => item.in_stock == *v,
            ("category", FieldValue::Text(v)) => {
                item.category.trim().to_lowercase() == v.to_lowercase()
            }
            ("store_name", FieldValue::Text(v)) => item.store_name.eq_ignore_ascii_case(v),
            _ => false,
        },
        Predicate::Contains { field, value } => {
            let haystack = match field.as_str() {
                "category" => &item.category,
                "name" => &item.name,
                "store_name" => &item.store_name,
                "description" => &item.description,
                _ => return false,
            };
            haystack.to_lowercase().contains(&value.to_lowercase())
        }
        Predicate::Range {
            field,
            min,
            max,
            max_exclusive,
        } => {
            let v = match field.as_str() {
                "price" => item.price,
                "rating" => item.rating,
                _ => return false,
            };
            min.is_none_or(|m| v >= m)
                && max.is_none_or(|m| if *max_exclusive { v < m } else { v <= m })
        }
        Predicate::GeoDistance {
            field,
            center,
            radius_km,
        } => {
            field == "location"
                && item
                    .location
                    .is_some_and(|loc| loc.distance_km(center) <= *radius_km)
        }
    }
}

#[async_trait]
impl DocumentIndex for MemoryIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lexical_search(&self, query: &LexicalQuery) -> Result<IndexResponse> {
        let scored = self.lexical_scores(query);
        let aggregations = query
            .aggregations
            .as_ref()
            .map(|req| aggregate(scored.iter().map(|(_, _, item)| item), req));
        let total = scored.len();
        let mut hits: Vec<Hit> = scored
            .into_iter()
            .map(|(score, highlights, item)| self.hit(item, score, HitSource::Lexical, highlights))
            .collect();
        sort_by_score(&mut hits);
        hits.truncate(query.size);
        Ok(IndexResponse {
            hits,
            total,
            aggregations,
        })
    }

    async fn vector_search(&self, query: &VectorQuery) -> Result<IndexResponse> {
        let scored = self.vector_scores(query)?;
        let total = scored.len();
        let mut hits: Vec<Hit> = scored
            .into_iter()
            .map(|(score, item)| self.hit(item, score, HitSource::Vector, Vec::new()))
            .collect();
        sort_by_score(&mut hits);
        hits.truncate(query.k);
        Ok(IndexResponse {
            hits,
            total,
            aggregations: None,
        })
    }

    fn supports_native_hybrid(&self) -> bool {
        self.native_hybrid && self.embedder.is_some()
    }

    /// `lexical / max_lexical + vector_boost × cosine`, over the union.
    async fn hybrid_search(&self, query: &HybridQuery) -> Result<IndexResponse> {
        if !self.supports_native_hybrid() {
            return Err(KhojError::upstream(
                Backend::HybridIndex,
                "native hybrid search not enabled",
            ));
        }
        let lexical = self.lexical_scores(&query.lexical);
        let vector = self.vector_scores(&query.vector)?;
        let aggregations = query
            .lexical
            .aggregations
            .as_ref()
            .map(|req| aggregate(lexical.iter().map(|(_, _, item)| item), req));

        let max_lexical = lexical.iter().map(|(s, _, _)| *s).fold(0.0f64, f64::max);
        let mut merged: HashMap<String, Hit> = HashMap::new();
        for (score, highlights, item) in lexical {
            let normalized = if max_lexical > 0.0 { score / max_lexical } else { 0.0 };
            merged.insert(
                item.id.clone(),
                self.hit(item, normalized, HitSource::Hybrid, highlights),
            );
        }
        for (sim, item) in vector {
            let boosted = query.vector_boost * sim;
            merged
                .entry(item.id.clone())
                .and_modify(|h| h.score += boosted)
                .or_insert_with(|| self.hit(item, boosted, HitSource::Hybrid, Vec::new()));
        }

        let total = merged.len();
        let mut hits: Vec<Hit> = merged.into_values().collect();
        sort_by_score(&mut hits);
        hits.truncate(query.lexical.size.max(query.vector.k));
        Ok(IndexResponse {
            hits,
            total,
            aggregations,
        })
    }
}
