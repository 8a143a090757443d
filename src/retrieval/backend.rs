// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Collaborator contracts: everything retrieval talks to but doesn't own.
//!
//! All traits are object-safe (`async_trait`) and shared as `Arc<dyn _>`, so
//! a deployment wires in HTTP clients while tests wire in
//! [`crate::memory::MemoryIndex`] and the scripted backends in
//! [`crate::testing`].

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Backend, KhojError, Result};
use crate::facets::{AggregationRequest, Aggregations};
use crate::types::{CatalogItem, GeoPoint};

// ============================================================================
// QUERIES
// ============================================================================

/// A scalar a predicate can compare against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(u64),
    Text(String),
}

/// Filter predicate, applied by the index before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    Equals {
        field: String,
        value: FieldValue,
    },
    Contains {
        field: String,
        value: String,
    },
    /// `min` is inclusive; `max` is inclusive unless `max_exclusive`.
    Range {
        field: String,
        min: Option<f64>,
        max: Option<f64>,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        max_exclusive: bool,
    },
    GeoDistance {
        field: String,
        center: GeoPoint,
        radius_km: f64,
    },
}

/// A field and its relevance multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldBoost {
    pub field: String,
    pub boost: f64,
}

impl FieldBoost {
    pub fn new(field: &str, boost: f64) -> Self {
        Self {
            field: field.to_string(),
            boost,
        }
    }
}

/// Edit budget for fuzzy term matching, by term length ("AUTO" style):
/// 0 edits up to 2 characters, 1 up to 5, 2 beyond.
pub fn auto_fuzziness(term: &str) -> usize {
    match term.chars().count() {
        0..=2 => 0,
        3..=5 => 1,
        _ => 2,
    }
}

/// Multi-field keyword search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalQuery {
    pub text: String,
    pub fields: Vec<FieldBoost>,
    /// Allow fuzzy term matches using [`auto_fuzziness`].
    pub fuzzy: bool,
    pub predicates: Vec<Predicate>,
    pub size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregations: Option<AggregationRequest>,
}

/// k-nearest-neighbour search over one embedding field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorQuery {
    /// `embedding_384`, `embedding_768`, ...; dimensions are distinct fields.
    pub field: String,
    pub vector: Vec<f32>,
    pub k: usize,
    pub predicates: Vec<Predicate>,
}

/// One call that fuses inside the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridQuery {
    pub lexical: LexicalQuery,
    pub vector: VectorQuery,
    /// Multiplier on the vector component. Above 1.0 favours paraphrase
    /// matches over literal keyword hits.
    pub vector_boost: f64,
}

/// Name of the index field holding vectors of `dimension`.
pub fn vector_field(dimension: usize) -> String {
    format!("embedding_{dimension}")
}

// ============================================================================
// RESPONSES
// ============================================================================

/// Which retrieval path produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitSource {
    Lexical,
    Vector,
    Hybrid,
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub id: String,
    pub index: String,
    pub score: f64,
    pub source: HitSource,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub highlights: Vec<String>,
    pub item: CatalogItem,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexResponse {
    pub hits: Vec<Hit>,
    /// Matches before `size` truncation.
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregations: Option<Aggregations>,
}

// ============================================================================
// TRAITS
// ============================================================================

/// The catalog search index.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    fn name(&self) -> &str;

    async fn lexical_search(&self, query: &LexicalQuery) -> Result<IndexResponse>;

    async fn vector_search(&self, query: &VectorQuery) -> Result<IndexResponse>;

    /// Whether [`hybrid_search`](Self::hybrid_search) is implemented.
    fn supports_native_hybrid(&self) -> bool {
        false
    }

    async fn hybrid_search(&self, _query: &HybridQuery) -> Result<IndexResponse> {
        Err(KhojError::upstream(
            Backend::HybridIndex,
            "native hybrid search not supported",
        ))
    }
}

/// Text → vector. One provider serves one model and one dimension.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn model(&self) -> &str;

    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Per-user boosts for candidate items. Missing ids mean "no opinion".
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn boosts(&self, user_id: &str, item_ids: &[String]) -> Result<HashMap<String, f64>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyRequest {
    pub query: String,
    pub predicates: Vec<Predicate>,
    pub page: usize,
    pub size: usize,
}

/// The previous search system, called only when the index is unreachable.
#[async_trait]
pub trait LegacySearch: Send + Sync {
    async fn search(&self, request: &LegacyRequest) -> Result<IndexResponse>;
}

/// Coordinates → delivery zone.
#[async_trait]
pub trait ZoneResolver: Send + Sync {
    async fn zone_for(&self, point: GeoPoint) -> Result<Option<u64>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Search,
    Click,
    View,
    AddToCart,
    Order,
    ExperimentAssignment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_type: Option<String>,
}

impl AnalyticsEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            user_id: None,
            query: None,
            item_id: None,
            experiment: None,
            variant: None,
            result_count: None,
            search_type: None,
        }
    }

    pub fn user(mut self, user_id: Option<&str>) -> Self {
        self.user_id = user_id.map(str::to_string);
        self
    }

    pub fn query(mut self, query: &str) -> Self {
        self.query = Some(query.to_string());
        self
    }

    pub fn item(mut self, item_id: &str) -> Self {
        self.item_id = Some(item_id.to_string());
        self
    }
}

/// Fire-and-forget event log. Failures are logged by the caller, never surfaced.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn record(&self, event: AnalyticsEvent) -> Result<()>;
}
