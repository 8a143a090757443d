// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::error::Backend;
use crate::facets::Facet;
use crate::retrieval::{Hit, SearchFilters, SearchType};
use crate::targeting::StoreItemIntent;
use crate::understanding::{Intent, ParsedQuery};

/// Which system answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Index,
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMeta {
    pub total: usize,
    pub page: usize,
    pub size: usize,
    pub search_type: SearchType,
    pub source: ResultSource,
    /// `search_algorithm` variant, when the strategy came from an experiment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    /// Some backend failed and the page was built without it.
    pub degraded: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<Backend>,
    pub took_ms: u64,
}

/// A store that has at least one item on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSummary {
    pub store_id: u64,
    pub store_name: String,
    /// Items from this store on the page.
    pub items: usize,
}

/// Store summaries in first-seen order.
pub(crate) fn summarize_stores(hits: &[Hit]) -> Vec<StoreSummary> {
    let mut out: Vec<StoreSummary> = Vec::new();
    for hit in hits {
        match out.iter_mut().find(|s| s.store_id == hit.item.store_id) {
            Some(summary) => summary.items += 1,
            None => out.push(StoreSummary {
                store_id: hit.item.store_id,
                store_name: hit.item.store_name.clone(),
                items: 1,
            }),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub items: Vec<Hit>,
    pub stores: Vec<StoreSummary>,
    pub facets: Vec<Facet>,
    pub meta: SearchMeta,
    /// Alternative queries. Most useful when `items` is empty.
    pub suggestions: Vec<String>,
    /// The spelling actually searched, when it differs from what was typed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_query: Option<String>,
}

impl SearchResponse {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// What the conversational endpoint understood and did, for the client to echo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub intent: Intent,
    pub confidence: f64,
    /// Filters actually applied, after recommendations.
    pub filters: SearchFilters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationalResponse {
    pub parsed: ParsedQuery,
    pub target: StoreItemIntent,
    pub results: SearchResponse,
    pub context: ConversationContext,
}

/// One line describing a result set: `3 results for "veg biryani" (veg, under ₹300)`.
pub(crate) fn describe(query: &str, total: usize, filters: &SearchFilters) -> String {
    let mut notes = Vec::new();
    match filters.veg {
        Some(true) => notes.push("veg".to_string()),
        Some(false) => notes.push("non-veg".to_string()),
        None => {}
    }
    match (filters.price_min, filters.price_max) {
        (Some(lo), Some(hi)) => notes.push(format!("₹{lo}-₹{hi}")),
        (None, Some(hi)) => notes.push(format!("under ₹{hi}")),
        (Some(lo), None) => notes.push(format!("above ₹{lo}")),
        (None, None) => {}
    }
    if let Some(store) = &filters.store_name {
        notes.push(format!("from {store}"));
    }
    let noun = if total == 1 { "result" } else { "results" };
    if notes.is_empty() {
        format!("{total} {noun} for \"{query}\"")
    } else {
        format!("{total} {noun} for \"{query}\" ({})", notes.join(", "))
    }
}
