// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The retrieval orchestrator: candidates in, one ranked page out.
//!
//! ```text
//!            ┌─ lexical ───────── guarded ─┐          ┌─ Hybrid:     sort
//! request ───┤                             ├─ fuse ─┤
//!            └─ embed ─ k-NN ──── guarded ─┘          └─ MultiStage: rerank ─ boost ─ diversify
//! ```
//!
//! Both branches always run together (`tokio::join!`), each under its own
//! budget. The vector branch's budget covers embedding *and* k-NN, so a slow
//! embedder can't hold the page past the time lexical alone would take.
//!
//! What comes back when things break:
//!
//! | lexical | vector | result                                  |
//! |---------|--------|-----------------------------------------|
//! | ok      | ok     | fused, `Hybrid`                         |
//! | ok      | failed | lexical only, `LexicalOnly`, degraded   |
//! | failed  | ok     | vector only, `VectorOnly`, degraded     |
//! | failed  | failed | `Err`, the caller picks a fallback      |
//!
//! Personalization failing in multi-stage marks the page degraded and skips
//! boosting. Nothing is retried.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::backend::{
    vector_field, DocumentIndex, EmbeddingProvider, FieldBoost, Hit, HybridQuery, IndexResponse,
    LexicalQuery, PreferenceStore, VectorQuery,
};
use super::cancel::{guarded, BranchOutcome, CancellationToken};
use super::diversify::{diversify, DiversityCaps};
use super::filters::SearchFilters;
use super::fusion::{fuse, sort_by_score, FusionWeights};
use super::personalize::apply_boosts;
use super::rerank::{PopularityRatingReranker, Reranker};
use crate::error::{Backend, KhojError, Result};
use crate::facets::{AggregationRequest, Aggregations};
use crate::types::SortOrder;

// ============================================================================
// STRATEGY AND RESULT TAGS
// ============================================================================

/// Which pipeline runs after candidate generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStrategy {
    #[default]
    Hybrid,
    MultiStage,
}

impl RetrievalStrategy {
    /// Map an experiment variant name. Anything unrecognised is `Hybrid`.
    pub fn from_variant(variant: &str) -> Self {
        match variant.trim().to_lowercase().as_str() {
            "multi_stage" | "multi-stage" | "multistage" => RetrievalStrategy::MultiStage,
            _ => RetrievalStrategy::Hybrid,
        }
    }
}

/// Which path produced a page. Clients use it to tell a normal answer from
/// a degraded one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    Hybrid,
    HybridNative,
    LexicalOnly,
    VectorOnly,
    MultiStage,
    Legacy,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Hybrid => "hybrid",
            SearchType::HybridNative => "hybrid_native",
            SearchType::LexicalOnly => "lexical_only",
            SearchType::VectorOnly => "vector_only",
            SearchType::MultiStage => "multi_stage",
            SearchType::Legacy => "legacy",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// REQUEST / RESPONSE
// ============================================================================

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// One retrieval call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalRequest {
    /// Lexical query text (normally the expanded query).
    pub text: String,
    /// Text to embed (normally the corrected query; expansion adds noise to vectors).
    pub embed_text: String,
    pub filters: SearchFilters,
    /// 1-based.
    pub page: usize,
    pub size: usize,
    pub sort: SortOrder,
    pub user_id: Option<String>,
    /// `false` skips the vector branch entirely (not a degradation).
    pub semantic: bool,
}

impl RetrievalRequest {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            embed_text: text.clone(),
            text,
            filters: SearchFilters::default(),
            page: 1,
            size: DEFAULT_PAGE_SIZE,
            sort: SortOrder::Relevance,
            user_id: None,
            semantic: true,
        }
    }

    pub fn embed_text(mut self, text: impl Into<String>) -> Self {
        self.embed_text = text.into();
        self
    }

    pub fn filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn page(mut self, page: usize, size: usize) -> Self {
        self.page = page.max(1);
        self.size = size;
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn user(mut self, user_id: Option<&str>) -> Self {
        self.user_id = user_id.map(str::to_string);
        self
    }

    pub fn semantic(mut self, semantic: bool) -> Self {
        self.semantic = semantic;
        self
    }

    /// Hits needed to fill every page up to and including this one.
    fn depth(&self) -> usize {
        self.page.max(1).saturating_mul(self.size)
    }
}

/// One page of ranked hits plus how it was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPage {
    pub hits: Vec<Hit>,
    /// Matches across all pages, as far as the backends reported.
    pub total: usize,
    pub search_type: SearchType,
    /// True when a branch or stage failed and the page is best-effort.
    pub degraded: bool,
    /// Backends that answered.
    pub sources: Vec<Backend>,
    /// Backends that failed, in the order they were noticed.
    pub failed: Vec<Backend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregations: Option<Aggregations>,
}

// ============================================================================
// SETTINGS
// ============================================================================

/// Everything tunable about retrieval.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalSettings {
    pub index_timeout: Duration,
    pub embedding_timeout: Duration,
    pub personalization_timeout: Duration,
    pub fusion: FusionWeights,
    /// Multiplier on the vector side of a native hybrid call.
    pub native_vector_boost: f64,
    pub fields: Vec<FieldBoost>,
    pub fuzzy: bool,
    /// Multi-stage over-fetch, as a multiple of the hits the page needs.
    pub overfetch: usize,
    /// Same, when narrowing filters are set (more candidates get filtered out
    /// by later stages, so ask for more).
    pub overfetch_filtered: usize,
    pub max_candidates: usize,
    pub personalization_bound: f64,
    pub diversity: DiversityCaps,
    pub aggregations: Option<AggregationRequest>,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            index_timeout: Duration::from_millis(800),
            embedding_timeout: Duration::from_millis(300),
            personalization_timeout: Duration::from_millis(150),
            fusion: FusionWeights::default(),
            native_vector_boost: 2.0,
            fields: default_fields(),
            fuzzy: true,
            overfetch: 5,
            overfetch_filtered: 10,
            max_candidates: 500,
            personalization_bound: 0.3,
            diversity: DiversityCaps::default(),
            aggregations: Some(AggregationRequest::default()),
        }
    }
}

/// Name matters most, then category and store, then description.
pub fn default_fields() -> Vec<FieldBoost> {
    vec![
        FieldBoost::new("name", 3.0),
        FieldBoost::new("category", 2.0),
        FieldBoost::new("store_name", 2.0),
        FieldBoost::new("description", 1.0),
    ]
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

/// First-stage output, before any strategy-specific ranking.
struct Candidates {
    hits: Vec<Hit>,
    total: usize,
    search_type: SearchType,
    degraded: bool,
    sources: Vec<Backend>,
    failed: Vec<Backend>,
    aggregations: Option<Aggregations>,
}

pub struct RetrievalOrchestrator {
    index: Arc<dyn DocumentIndex>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    preferences: Option<Arc<dyn PreferenceStore>>,
    reranker: Arc<dyn Reranker>,
    settings: RetrievalSettings,
}

impl RetrievalOrchestrator {
    /// Lexical-only until an embedder is attached.
    pub fn new(index: Arc<dyn DocumentIndex>, settings: RetrievalSettings) -> Self {
        Self {
            index,
            embedder: None,
            preferences: None,
            reranker: Arc::new(PopularityRatingReranker::default()),
            settings,
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_preferences(mut self, preferences: Arc<dyn PreferenceStore>) -> Self {
        self.preferences = Some(preferences);
        self
    }

    pub fn with_reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = reranker;
        self
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    pub fn reranker(&self) -> &dyn Reranker {
        self.reranker.as_ref()
    }

    /// Run `strategy` for `request`.
    ///
    /// Fails on invalid filters or a page past `max_candidates` (both before
    /// any backend call), on cancellation, and when every candidate source
    /// failed. `total` never exceeds what paging can reach.
    pub async fn retrieve(
        &self,
        request: &RetrievalRequest,
        strategy: RetrievalStrategy,
        cancel: &CancellationToken,
    ) -> Result<RankedPage> {
        request.filters.validate()?;
        let reachable = self.reachable(request);
        if request.depth() > reachable {
            return Err(KhojError::InvalidFilter {
                field: "page".to_string(),
                reason: format!(
                    "page {} of {} is past the first {reachable} results",
                    request.page, request.size
                ),
            });
        }
        let started = Instant::now();

        let mut page = match strategy {
            RetrievalStrategy::Hybrid => self.hybrid(request, cancel).await?,
            RetrievalStrategy::MultiStage => self.multi_stage(request, cancel).await?,
        };
        page.total = page.total.min(reachable);

        info!(
            strategy = ?strategy,
            search_type = %page.search_type,
            degraded = page.degraded,
            hits = page.hits.len(),
            total = page.total,
            duration_ms = started.elapsed().as_millis() as u64,
            "retrieval complete"
        );
        Ok(page)
    }

    /// Deepest hit a request can page to.
    fn reachable(&self, request: &RetrievalRequest) -> usize {
        self.settings.max_candidates.max(request.size)
    }

    async fn hybrid(
        &self,
        request: &RetrievalRequest,
        cancel: &CancellationToken,
    ) -> Result<RankedPage> {
        let mut candidates = self.candidates(request, request.depth(), cancel).await?;
        sort_hits(&mut candidates.hits, request.sort);
        Ok(into_page(candidates, request))
    }

    async fn multi_stage(
        &self,
        request: &RetrievalRequest,
        cancel: &CancellationToken,
    ) -> Result<RankedPage> {
        let factor = if request.filters.is_narrowing() {
            self.settings.overfetch_filtered
        } else {
            self.settings.overfetch
        };
        let depth = request
            .depth()
            .saturating_mul(factor.max(1))
            .min(self.settings.max_candidates)
            .max(request.depth());
        let mut candidates = self.candidates(request, depth, cancel).await?;

        self.reranker.rerank(&mut candidates.hits);
        debug!(reranker = self.reranker.name(), candidates = candidates.hits.len(), "reranked");

        if let (Some(preferences), Some(user)) = (&self.preferences, request.user_id.as_deref()) {
            let ids: Vec<String> = candidates.hits.iter().map(|h| h.id.clone()).collect();
            match guarded(
                Backend::Personalization,
                self.settings.personalization_timeout,
                cancel,
                preferences.boosts(user, &ids),
            )
            .await
            {
                BranchOutcome::Ok(boosts) => {
                    let bound = self.settings.personalization_bound;
                    let boosted = apply_boosts(&mut candidates.hits, &boosts, bound);
                    candidates.sources.push(Backend::Personalization);
                    debug!(boosted, "personalization applied");
                }
                BranchOutcome::Failed { backend, error } => {
                    if matches!(error, KhojError::Cancelled) {
                        return Err(error);
                    }
                    warn!(%backend, %error, "personalization skipped");
                    candidates.degraded = true;
                    candidates.failed.push(backend);
                }
            }
        }

        if request.sort == SortOrder::Relevance {
            candidates.hits = diversify(candidates.hits, request.size, self.settings.diversity);
        } else {
            sort_hits(&mut candidates.hits, request.sort);
        }
        candidates.search_type = match candidates.search_type {
            SearchType::Hybrid | SearchType::HybridNative => SearchType::MultiStage,
            other => other,
        };
        Ok(into_page(candidates, request))
    }

    /// Predicates shared by every branch, so filtering happens before scoring.
    fn lexical_query(&self, request: &RetrievalRequest, depth: usize) -> LexicalQuery {
        LexicalQuery {
            text: request.text.clone(),
            fields: self.settings.fields.clone(),
            fuzzy: self.settings.fuzzy,
            predicates: request.filters.to_predicates(),
            size: depth,
            aggregations: self.settings.aggregations.clone(),
        }
    }

    /// Embed under the embedding budget.
    async fn embed(
        &self,
        embedder: &dyn EmbeddingProvider,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<f32>> {
        let vector = guarded(
            Backend::Embedding,
            self.settings.embedding_timeout,
            cancel,
            embedder.embed(text),
        )
        .await
        .into_result()?;
        if vector.len() != embedder.dimension() {
            return Err(KhojError::upstream(
                Backend::Embedding,
                format!(
                    "{} returned {} dimensions, expected {}",
                    embedder.model(),
                    vector.len(),
                    embedder.dimension()
                ),
            ));
        }
        Ok(vector)
    }

    /// Fan out, then fuse whatever came back.
    async fn candidates(
        &self,
        request: &RetrievalRequest,
        depth: usize,
        cancel: &CancellationToken,
    ) -> Result<Candidates> {
        let lexical = self.lexical_query(request, depth);
        let embedder = self.embedder.as_deref().filter(|_| request.semantic);

        if let Some(embedder) = embedder.filter(|_| self.index.supports_native_hybrid()) {
            return self.native_hybrid(embedder, request, lexical, cancel).await;
        }

        let budget = self.settings.index_timeout;
        let lexical_branch = guarded(
            Backend::LexicalIndex,
            budget,
            cancel,
            self.index.lexical_search(&lexical),
        );
        let vector_branch = async {
            let embedder = embedder?;
            Some(
                guarded(Backend::VectorIndex, budget, cancel, async {
                    let vector = self.embed(embedder, &request.embed_text, cancel).await?;
                    let query = VectorQuery {
                        field: vector_field(embedder.dimension()),
                        vector,
                        k: depth,
                        predicates: lexical.predicates.clone(),
                    };
                    self.index.vector_search(&query).await
                })
                .await,
            )
        };
        let (lexical_outcome, vector_outcome) = tokio::join!(lexical_branch, vector_branch);

        // Partial fusion work is thrown away on cancel
        if cancel.is_cancelled() {
            return Err(KhojError::Cancelled);
        }

        let mut failed = Vec::new();
        let mut sources = Vec::new();
        let mut lexical_error = None;
        let lexical = match lexical_outcome {
            BranchOutcome::Ok(response) => {
                sources.push(Backend::LexicalIndex);
                Some(response)
            }
            BranchOutcome::Failed { backend, error } => {
                warn!(%backend, %error, "lexical branch failed");
                failed.push(backend);
                lexical_error = Some(error);
                None
            }
        };
        let attempted_vector = vector_outcome.is_some();
        let vector = match vector_outcome {
            Some(BranchOutcome::Ok(response)) => {
                sources.push(Backend::VectorIndex);
                Some(response)
            }
            Some(BranchOutcome::Failed { backend, error }) => {
                warn!(%backend, %error, "vector branch failed");
                failed.push(backend);
                None
            }
            None => None,
        };

        let (hits, total, aggregations, search_type) = match (lexical, vector) {
            (Some(lex), Some(knn)) => {
                let hits = fuse(lex.hits, knn.hits, self.settings.fusion);
                let total = lex.total.max(knn.total).max(hits.len());
                (hits, total, lex.aggregations, SearchType::Hybrid)
            }
            (Some(mut lex), None) => {
                sort_by_score(&mut lex.hits);
                (lex.hits, lex.total, lex.aggregations, SearchType::LexicalOnly)
            }
            (None, Some(mut knn)) => {
                sort_by_score(&mut knn.hits);
                (knn.hits, knn.total, knn.aggregations, SearchType::VectorOnly)
            }
            (None, None) => {
                return Err(lexical_error.unwrap_or_else(|| {
                    KhojError::upstream(Backend::LexicalIndex, "no candidate branch answered")
                }));
            }
        };

        debug!(
            candidates = hits.len(),
            vector_attempted = attempted_vector,
            search_type = %search_type,
            "candidates gathered"
        );
        Ok(Candidates {
            hits,
            total,
            search_type,
            degraded: !failed.is_empty(),
            sources,
            failed,
            aggregations,
        })
    }

    /// One fused call inside the index. The embedder still runs first; if it
    /// fails we fall to a lexical-only call rather than a plain failure.
    async fn native_hybrid(
        &self,
        embedder: &dyn EmbeddingProvider,
        request: &RetrievalRequest,
        lexical: LexicalQuery,
        cancel: &CancellationToken,
    ) -> Result<Candidates> {
        let budget = self.settings.index_timeout;
        let vector = match self.embed(embedder, &request.embed_text, cancel).await {
            Ok(vector) => vector,
            Err(KhojError::Cancelled) => return Err(KhojError::Cancelled),
            Err(error) => {
                warn!(backend = %Backend::Embedding, %error, "embedding failed, lexical only");
                let response = guarded(
                    Backend::LexicalIndex,
                    budget,
                    cancel,
                    self.index.lexical_search(&lexical),
                )
                .await
                .into_result()?;
                return Ok(single_source(
                    response,
                    SearchType::LexicalOnly,
                    Backend::LexicalIndex,
                    vec![Backend::Embedding],
                ));
            }
        };

        let query = HybridQuery {
            vector: VectorQuery {
                field: vector_field(embedder.dimension()),
                vector,
                k: lexical.size,
                predicates: lexical.predicates.clone(),
            },
            lexical,
            vector_boost: self.settings.native_vector_boost,
        };
        let response = guarded(
            Backend::HybridIndex,
            budget,
            cancel,
            self.index.hybrid_search(&query),
        )
        .await
        .into_result()?;
        Ok(single_source(
            response,
            SearchType::HybridNative,
            Backend::HybridIndex,
            Vec::new(),
        ))
    }
}

fn single_source(
    mut response: IndexResponse,
    search_type: SearchType,
    source: Backend,
    failed: Vec<Backend>,
) -> Candidates {
    sort_by_score(&mut response.hits);
    Candidates {
        total: response.total.max(response.hits.len()),
        hits: response.hits,
        search_type,
        degraded: !failed.is_empty(),
        sources: vec![source],
        failed,
        aggregations: response.aggregations,
    }
}

/// Re-order by a field sort. Relevance leaves the order alone. Ties keep
/// their relevance order (stable sort).
pub fn sort_hits(hits: &mut [Hit], sort: SortOrder) {
    let by = |key: fn(&Hit) -> f64, descending: bool| {
        move |a: &Hit, b: &Hit| {
            let ord = key(a)
                .partial_cmp(&key(b))
                .unwrap_or(std::cmp::Ordering::Equal);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        }
    };
    match sort {
        SortOrder::Relevance => {}
        SortOrder::PriceAsc => hits.sort_by(by(|h| h.item.price, false)),
        SortOrder::PriceDesc => hits.sort_by(by(|h| h.item.price, true)),
        SortOrder::Rating => hits.sort_by(by(|h| h.item.rating, true)),
        SortOrder::Popularity => hits.sort_by(by(|h| h.item.popularity as f64, true)),
    }
}

fn into_page(candidates: Candidates, request: &RetrievalRequest) -> RankedPage {
    let skip = (request.page.max(1) - 1).saturating_mul(request.size);
    let hits: Vec<Hit> = candidates
        .hits
        .into_iter()
        .skip(skip)
        .take(request.size)
        .collect();
    RankedPage {
        hits,
        total: candidates.total,
        search_type: candidates.search_type,
        degraded: candidates.degraded,
        sources: candidates.sources,
        failed: candidates.failed,
        aggregations: candidates.aggregations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::hit;

    #[test]
    fn variant_names_map_to_strategies() {
        assert_eq!(RetrievalStrategy::from_variant("multi_stage"), RetrievalStrategy::MultiStage);
        assert_eq!(RetrievalStrategy::from_variant("Multi-Stage"), RetrievalStrategy::MultiStage);
        assert_eq!(RetrievalStrategy::from_variant("hybrid"), RetrievalStrategy::Hybrid);
        assert_eq!(RetrievalStrategy::from_variant("control"), RetrievalStrategy::Hybrid);
    }

    #[test]
    fn price_sort_is_stable_on_ties() {
        let mut hits = vec![hit("a", 3.0), hit("b", 2.0), hit("c", 1.0)];
        hits[0].item.price = 200.0;
        hits[1].item.price = 100.0;
        hits[2].item.price = 100.0;
        sort_hits(&mut hits, SortOrder::PriceAsc);
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn pages_are_one_based() {
        let candidates = Candidates {
            hits: (0..5).map(|i| hit(&i.to_string(), 5.0 - i as f64)).collect(),
            total: 5,
            search_type: SearchType::LexicalOnly,
            degraded: false,
            sources: vec![Backend::LexicalIndex],
            failed: Vec::new(),
            aggregations: None,
        };
        let request = RetrievalRequest::new("dosa").page(2, 2);
        let page = into_page(candidates, &request);
        let ids: Vec<&str> = page.hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);
        assert_eq!(page.total, 5);
    }

    #[test]
    fn request_depth_covers_earlier_pages() {
        assert_eq!(RetrievalRequest::new("x").page(3, 10).depth(), 30);
        assert_eq!(RetrievalRequest::new("x").page(0, 10).page, 1);
    }
}
