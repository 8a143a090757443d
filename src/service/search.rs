// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! `SearchService`: every component wired into request-shaped operations.
//!
//! ```text
//! params ─ validate ─ understand ─ target ─ strategy ─ retrieve ─ facets ─ response
//!            │                                  │          │
//!         4xx, no                         experiment    legacy, if the
//!         backend call                    variant       index is down
//! ```
//!
//! Validation (query length, coordinates, filters, facet selections) runs
//! before the first backend call. Analytics never blocks or fails a request.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::params::{
    point, ConversationalParams, HybridSearchParams, ItemSearchParams, DEFAULT_RADIUS_KM,
};
use super::response::{
    describe, summarize_stores, ConversationContext, ConversationalResponse, ResultSource,
    SearchMeta, SearchResponse,
};
use crate::config::KhojConfig;
use crate::error::{Backend, ErrorKind, KhojError, Result};
use crate::experiment::{ExperimentRegistry, SEARCH_ALGORITHM};
use crate::facets::{apply_facet_filters, parse_facet_filters, FacetsEngine};
use crate::retrieval::{
    guarded, sort_hits, AnalyticsEvent, AnalyticsSink, BranchOutcome, CancellationToken,
    DocumentIndex, EmbeddingProvider, EventKind, GeoFilter, LegacyRequest, LegacySearch,
    PopularityRatingReranker, PreferenceStore, RankedPage, Reranker, RetrievalOrchestrator,
    RetrievalRequest, RetrievalStrategy, SearchFilters, SearchType, ZoneResolver,
};
use crate::targeting::{QueryIntentParser, StoreItemIntent, TargetKind};
use crate::types::{CatalogItem, DomainContext, GeoPoint, SortOrder};
use crate::understanding::{ParsedQuery, QueryUnderstandingPipeline};

// ============================================================================
// BUILDER
// ============================================================================

/// Collects collaborators; [`build`](Self::build) validates the config.
pub struct SearchServiceBuilder {
    config: KhojConfig,
    index: Arc<dyn DocumentIndex>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    preferences: Option<Arc<dyn PreferenceStore>>,
    reranker: Option<Arc<dyn Reranker>>,
    legacy: Option<Arc<dyn LegacySearch>>,
    zones: Option<Arc<dyn ZoneResolver>>,
    analytics: Option<Arc<dyn AnalyticsSink>>,
    experiments: Option<Arc<ExperimentRegistry>>,
    pipeline: Option<QueryUnderstandingPipeline>,
    parser: Option<QueryIntentParser>,
    modules: HashMap<String, DomainContext>,
}

impl SearchServiceBuilder {
    pub fn new(config: KhojConfig, index: Arc<dyn DocumentIndex>) -> Self {
        Self {
            config,
            index,
            embedder: None,
            preferences: None,
            reranker: None,
            legacy: None,
            zones: None,
            analytics: None,
            experiments: None,
            pipeline: None,
            parser: None,
            modules: HashMap::new(),
        }
    }

    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn preferences(mut self, preferences: Arc<dyn PreferenceStore>) -> Self {
        self.preferences = Some(preferences);
        self
    }

    pub fn reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    pub fn legacy(mut self, legacy: Arc<dyn LegacySearch>) -> Self {
        self.legacy = Some(legacy);
        self
    }

    pub fn zones(mut self, zones: Arc<dyn ZoneResolver>) -> Self {
        self.zones = Some(zones);
        self
    }

    pub fn analytics(mut self, analytics: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics = Some(analytics);
        self
    }

    /// Share a registry with an admin surface. Default: built from the config.
    pub fn experiments(mut self, experiments: Arc<ExperimentRegistry>) -> Self {
        self.experiments = Some(experiments);
        self
    }

    pub fn pipeline(mut self, pipeline: QueryUnderstandingPipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    pub fn parser(mut self, parser: QueryIntentParser) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Name a module so `hybrid_search("food", ..)` resolves.
    pub fn module(mut self, slug: &str, domain: DomainContext) -> Self {
        self.modules.insert(slug.to_lowercase(), domain);
        self
    }

    pub fn build(self) -> Result<SearchService> {
        let config = self.config;
        config.validate()?;

        let experiments = match self.experiments {
            Some(registry) => registry,
            None => Arc::new(ExperimentRegistry::from_experiments(&config.experiments)?),
        };
        let reranker = self.reranker.unwrap_or_else(|| {
            Arc::new(PopularityRatingReranker {
                weights: config.rerank_weights(),
            })
        });

        let mut orchestrator = RetrievalOrchestrator::new(self.index, config.retrieval_settings())
            .with_reranker(reranker);
        if let Some(embedder) = self.embedder {
            if embedder.dimension() != config.backends.embedding_dimension {
                return Err(KhojError::config(format!(
                    "embedder '{}' produces {} dimensions, config declares {}",
                    embedder.model(),
                    embedder.dimension(),
                    config.backends.embedding_dimension
                )));
            }
            orchestrator = orchestrator.with_embedder(embedder);
        }
        if let Some(preferences) = self.preferences {
            orchestrator = orchestrator.with_preferences(preferences);
        }

        let pipeline = self.pipeline.unwrap_or_else(|| {
            QueryUnderstandingPipeline::default().with_max_suggestions(config.query.max_suggestions)
        });

        Ok(SearchService {
            facets: FacetsEngine::new(config.aggregation_request()),
            pipeline,
            parser: self.parser.unwrap_or_default(),
            orchestrator,
            experiments,
            legacy: self.legacy,
            zones: self.zones,
            analytics: self.analytics,
            modules: self.modules,
            config,
        })
    }
}

// ============================================================================
// SERVICE
// ============================================================================

/// One request's worth of decisions, before retrieval.
struct Plan<'a> {
    query: &'a str,
    parsed: ParsedQuery,
    target: StoreItemIntent,
    filters: SearchFilters,
    page: usize,
    size: usize,
    sort: SortOrder,
    semantic: bool,
    user_id: Option<&'a str>,
    /// `None`: let the `search_algorithm` experiment decide.
    strategy: Option<RetrievalStrategy>,
    domain: DomainContext,
}

struct Executed {
    response: SearchResponse,
    /// Filters after recommendations and store targeting.
    filters: SearchFilters,
}

pub struct SearchService {
    config: KhojConfig,
    pipeline: QueryUnderstandingPipeline,
    parser: QueryIntentParser,
    orchestrator: RetrievalOrchestrator,
    facets: FacetsEngine,
    experiments: Arc<ExperimentRegistry>,
    legacy: Option<Arc<dyn LegacySearch>>,
    zones: Option<Arc<dyn ZoneResolver>>,
    analytics: Option<Arc<dyn AnalyticsSink>>,
    modules: HashMap<String, DomainContext>,
}

impl SearchService {
    pub fn builder(config: KhojConfig, index: Arc<dyn DocumentIndex>) -> SearchServiceBuilder {
        SearchServiceBuilder::new(config, index)
    }

    pub fn config(&self) -> &KhojConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &QueryUnderstandingPipeline {
        &self.pipeline
    }

    pub fn parser(&self) -> &QueryIntentParser {
        &self.parser
    }

    pub fn experiments(&self) -> &ExperimentRegistry {
        &self.experiments
    }

    /// Teach the speller product words and the parser store names.
    pub fn learn_catalog(&self, items: &[CatalogItem]) {
        let names: Vec<String> = items.iter().map(|i| i.name.clone()).collect();
        self.pipeline.dictionary().learn_from_product_names(&names);
        let stores: Vec<&str> = items
            .iter()
            .map(|i| i.store_name.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let learned = self.parser.learn_store_names(&stores);
        info!(
            items = items.len(),
            stores = stores.len(),
            store_tokens = learned,
            "catalog vocabulary learned"
        );
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    /// Understanding only, no retrieval.
    pub fn understand(&self, q: &str) -> Result<ParsedQuery> {
        let query = self.validate_query(q)?;
        Ok(self.pipeline.process(query))
    }

    /// Module-scoped hybrid search. Always the hybrid strategy, no zone needed.
    pub async fn hybrid_search(
        &self,
        module: &str,
        params: &HybridSearchParams,
    ) -> Result<SearchResponse> {
        self.hybrid_search_cancellable(module, params, &CancellationToken::new())
            .await
    }

    pub async fn hybrid_search_cancellable(
        &self,
        module: &str,
        params: &HybridSearchParams,
        cancel: &CancellationToken,
    ) -> Result<SearchResponse> {
        let query = self.validate_query(&params.q)?;
        let domain = self.domain_for_module(module)?;
        let geo = point(params.lat, params.lon)?.map(|center| GeoFilter {
            center,
            radius_km: params.radius_km.unwrap_or(DEFAULT_RADIUS_KM),
        });
        let base = SearchFilters {
            veg: params.veg,
            category_id: params.category_id,
            price_min: params.price_min,
            price_max: params.price_max,
            store_id: params.store_id,
            module_id: Some(domain.module_id),
            geo,
            ..Default::default()
        };
        let filters = self.with_facets(base, &params.facets)?;

        let plan = Plan {
            query,
            parsed: self.pipeline.process(query),
            target: self.parser.parse(query),
            filters,
            page: 1,
            size: self.page_size(params.size),
            sort: SortOrder::Relevance,
            semantic: true,
            user_id: params.user_id.as_deref(),
            strategy: Some(RetrievalStrategy::Hybrid),
            domain,
        };
        Ok(self.execute(plan, cancel).await?.response)
    }

    /// Zone-scoped item search. The zone comes from `zone_id`, or from
    /// `lat`/`lon` through the zone resolver; neither is [`KhojError::MissingZone`].
    pub async fn search_items(&self, params: &ItemSearchParams) -> Result<SearchResponse> {
        self.search_items_cancellable(params, &CancellationToken::new())
            .await
    }

    pub async fn search_items_cancellable(
        &self,
        params: &ItemSearchParams,
        cancel: &CancellationToken,
    ) -> Result<SearchResponse> {
        let query = self.validate_query(&params.q)?;
        let location = point(params.lat, params.lon)?;
        let base = SearchFilters {
            veg: params.veg,
            category_id: params.category_id,
            price_min: params.price_min,
            price_max: params.price_max,
            min_rating: params.min_rating,
            in_stock: params.in_stock,
            module_id: params.module_id,
            ..Default::default()
        };
        let mut filters = self.with_facets(base, &params.facets)?;
        filters.zone_id = Some(self.resolve_zone(params.zone_id, location, cancel).await?);

        let plan = Plan {
            query,
            parsed: self.pipeline.process(query),
            target: self.parser.parse(query),
            filters,
            page: params.page.unwrap_or(1).max(1),
            size: self.page_size(params.size),
            sort: params.sort,
            semantic: params.semantic,
            user_id: params.user_id.as_deref(),
            strategy: None,
            domain: params
                .module_id
                .map(|id| self.domain_for_id(id))
                .unwrap_or_default(),
        };
        Ok(self.execute(plan, cancel).await?.response)
    }

    /// Understanding plus retrieval, with an echo of what was understood.
    pub async fn conversational(
        &self,
        params: &ConversationalParams,
    ) -> Result<ConversationalResponse> {
        let query = self.validate_query(&params.q)?;
        let geo = point(params.lat, params.lon)?.map(|center| GeoFilter {
            center,
            radius_km: DEFAULT_RADIUS_KM,
        });
        let parsed = self.pipeline.process(query);
        let target = self.parser.parse(query);

        let plan = Plan {
            query,
            parsed: parsed.clone(),
            target: target.clone(),
            filters: SearchFilters {
                module_id: params.module_id,
                geo,
                ..Default::default()
            },
            page: 1,
            size: self.config.query.default_page_size,
            sort: SortOrder::Relevance,
            semantic: true,
            user_id: params.user_id.as_deref(),
            strategy: None,
            domain: params
                .module_id
                .map(|id| self.domain_for_id(id))
                .unwrap_or_default(),
        };
        let executed = self.execute(plan, &CancellationToken::new()).await?;

        let context = ConversationContext {
            intent: parsed.intent,
            confidence: parsed.confidence,
            store: target
                .store_query
                .clone()
                .or_else(|| target.detected_brand.clone()),
            item: target.item_query.clone(),
            message: describe(query, executed.response.meta.total, &executed.filters),
            filters: executed.filters,
        };
        Ok(ConversationalResponse {
            parsed,
            target,
            results: executed.response,
            context,
        })
    }

    /// Log a user interaction. Fire-and-forget.
    ///
    /// `search` and `experiment_assignment` events are the service's own and
    /// are rejected here; the rest need an item.
    pub async fn record_event(&self, event: AnalyticsEvent) -> Result<()> {
        match event.kind {
            EventKind::Search | EventKind::ExperimentAssignment => Err(KhojError::InvalidFilter {
                field: "kind".to_string(),
                reason: format!("{:?} events are recorded by the service", event.kind),
            }),
            _ if event.item_id.is_none() => Err(KhojError::InvalidFilter {
                field: "item_id".to_string(),
                reason: format!("{:?} events need an item", event.kind),
            }),
            _ => {
                self.emit(event);
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------------
    // Request plumbing
    // ------------------------------------------------------------------------

    fn validate_query<'q>(&self, q: &'q str) -> Result<&'q str> {
        let q = q.trim();
        if q.is_empty() {
            return Err(KhojError::EmptyQuery);
        }
        let len = q.chars().count();
        let max = self.config.query.max_len;
        if len > max {
            return Err(KhojError::QueryTooLong { len, max });
        }
        Ok(q)
    }

    fn page_size(&self, requested: Option<usize>) -> usize {
        match requested {
            None | Some(0) => self.config.query.default_page_size,
            Some(n) => n.min(self.config.query.max_page_size),
        }
    }

    /// Decode facet selections onto `base`, then validate the lot.
    fn with_facets(&self, base: SearchFilters, selected: &[String]) -> Result<SearchFilters> {
        let selections = parse_facet_filters(selected)?;
        let filters = apply_facet_filters(&base, &selections);
        filters.validate()?;
        Ok(filters)
    }

    fn domain_for_module(&self, module: &str) -> Result<DomainContext> {
        if let Some(domain) = self.modules.get(&module.trim().to_lowercase()) {
            return Ok(*domain);
        }
        module
            .trim()
            .parse::<u64>()
            .map(|id| self.domain_for_id(id))
            .map_err(|_| KhojError::InvalidFilter {
                field: "module".to_string(),
                reason: format!("unknown module '{module}'"),
            })
    }

    fn domain_for_id(&self, module_id: u64) -> DomainContext {
        self.modules
            .values()
            .find(|d| d.module_id == module_id)
            .copied()
            .unwrap_or(DomainContext {
                module_id,
                ..Default::default()
            })
    }

    async fn resolve_zone(
        &self,
        zone_id: Option<u64>,
        location: Option<GeoPoint>,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        if let Some(zone) = zone_id {
            return Ok(zone);
        }
        let (Some(location), Some(zones)) = (location, &self.zones) else {
            return Err(KhojError::MissingZone);
        };
        let budget = self.config.timeouts.zone();
        guarded(Backend::ZoneResolver, budget, cancel, zones.zone_for(location))
            .await
            .into_result()?
            .ok_or(KhojError::MissingZone)
    }

    /// Fill what the caller left open from what the query said ("veg",
    /// "under 200", "cheapest"). Never overrides an explicit filter, and
    /// never produces a filter set that wouldn't validate.
    fn recommend(&self, plan: &mut Plan<'_>) {
        let rec = &plan.parsed.recommended_filters;
        let mut filters = plan.filters.clone();
        if filters.veg.is_none() && plan.domain.has_dietary_concept() {
            filters.veg = rec.veg;
        }
        if filters.price_min.is_none() && filters.price_max.is_none() {
            filters.price_min = rec.price_min;
            filters.price_max = rec.price_max;
        }
        if filters != plan.filters {
            match filters.validate() {
                Ok(()) => {
                    debug!(?filters, "recommended filters applied");
                    plan.filters = filters;
                }
                Err(error) => debug!(%error, "recommended filters ignored"),
            }
        }
        if plan.sort == SortOrder::Relevance {
            if let Some(sort) = rec.sort {
                plan.sort = sort;
            }
        }
    }

    fn assign_strategy(&self, user_id: Option<&str>) -> (RetrievalStrategy, Option<String>) {
        let Some(user) = user_id else {
            return (RetrievalStrategy::default(), None);
        };
        let variant = self.experiments.get_variant(SEARCH_ALGORITHM, user);
        let mut event = AnalyticsEvent::new(EventKind::ExperimentAssignment).user(Some(user));
        event.experiment = Some(SEARCH_ALGORITHM.to_string());
        event.variant = Some(variant.clone());
        self.emit(event);
        (RetrievalStrategy::from_variant(&variant), Some(variant))
    }

    async fn execute(&self, mut plan: Plan<'_>, cancel: &CancellationToken) -> Result<Executed> {
        let started = Instant::now();
        self.recommend(&mut plan);
        let (strategy, variant) = match plan.strategy {
            Some(strategy) => (strategy, None),
            None => self.assign_strategy(plan.user_id),
        };

        let mut request = RetrievalRequest::new(plan.parsed.search_text())
            .embed_text(plan.parsed.corrected.as_str())
            .filters(plan.filters.clone())
            .page(plan.page, plan.size)
            .sort(plan.sort)
            .user(plan.user_id)
            .semantic(plan.semantic);

        // "X from Y": search for X, only at stores named like Y
        let mut narrowed = false;
        if plan.target.kind == TargetKind::SpecificItemSpecificStore {
            if let (Some(item), Some(store)) = (&plan.target.item_query, &plan.target.store_query) {
                let item = self.pipeline.process(item);
                if !item.is_empty() {
                    request.text = item.search_text().to_string();
                    request.embed_text = item.corrected.clone();
                    request.filters.store_name = Some(store.clone());
                    narrowed = true;
                }
            }
        }

        let (mut page, mut source) = self.retrieve_or_fallback(&request, strategy, cancel).await?;
        if narrowed && page.total == 0 {
            debug!(store = ?request.filters.store_name, "no match at the named store, widening");
            request.text = plan.parsed.search_text().to_string();
            request.embed_text = plan.parsed.corrected.clone();
            request.filters.store_name = None;
            (page, source) = self.retrieve_or_fallback(&request, strategy, cancel).await?;
        }

        let items: Vec<CatalogItem> = page.hits.iter().map(|h| h.item.clone()).collect();
        let facets = self.facets.generate_facets(
            &items,
            page.aggregations.as_ref(),
            &request.filters,
            &plan.domain,
        );
        let suggestions = suggestions_for(&plan.parsed, page.hits.is_empty());
        let corrected_query = plan
            .parsed
            .corrections
            .iter()
            .any(|c| c.applied)
            .then(|| plan.parsed.corrected.clone());

        let took_ms = started.elapsed().as_millis() as u64;
        let mut event = AnalyticsEvent::new(EventKind::Search)
            .user(plan.user_id)
            .query(plan.query);
        event.result_count = Some(page.total);
        event.search_type = Some(page.search_type.to_string());
        if let Some(variant) = &variant {
            event.experiment = Some(SEARCH_ALGORITHM.to_string());
            event.variant = Some(variant.clone());
        }
        self.emit(event);

        info!(
            query = plan.query,
            intent = ?plan.parsed.intent,
            target = ?plan.target.kind,
            search_type = %page.search_type,
            source = ?source,
            variant = variant.as_deref().unwrap_or("-"),
            total = page.total,
            degraded = page.degraded,
            duration_ms = took_ms,
            "search served"
        );

        let response = SearchResponse {
            stores: summarize_stores(&page.hits),
            meta: SearchMeta {
                total: page.total,
                page: plan.page,
                size: plan.size,
                search_type: page.search_type,
                source,
                variant,
                degraded: page.degraded,
                failed: page.failed,
                took_ms,
            },
            items: page.hits,
            facets,
            suggestions,
            corrected_query,
        };
        Ok(Executed {
            response,
            filters: request.filters,
        })
    }

    /// The index, and the legacy search if every index branch failed.
    async fn retrieve_or_fallback(
        &self,
        request: &RetrievalRequest,
        strategy: RetrievalStrategy,
        cancel: &CancellationToken,
    ) -> Result<(RankedPage, ResultSource)> {
        match self.orchestrator.retrieve(request, strategy, cancel).await {
            Ok(page) => Ok((page, ResultSource::Index)),
            Err(KhojError::Cancelled) => Err(KhojError::Cancelled),
            Err(error) if error.kind() == ErrorKind::Upstream => {
                let page = self.legacy_search(request, error, cancel).await?;
                Ok((page, ResultSource::Legacy))
            }
            Err(error) => Err(error),
        }
    }

    /// One attempt. If it fails too, the index's error is what the caller sees.
    async fn legacy_search(
        &self,
        request: &RetrievalRequest,
        cause: KhojError,
        cancel: &CancellationToken,
    ) -> Result<RankedPage> {
        let Some(legacy) = &self.legacy else {
            warn!(error = %cause, "index failed, no legacy search configured");
            return Err(cause);
        };
        warn!(error = %cause, "index failed, using legacy search");

        let legacy_request = LegacyRequest {
            query: request.embed_text.clone(),
            predicates: request.filters.to_predicates(),
            page: request.page,
            size: request.size,
        };
        let budget = self.config.timeouts.legacy();
        match guarded(Backend::Legacy, budget, cancel, legacy.search(&legacy_request)).await {
            BranchOutcome::Ok(response) => {
                let mut hits = response.hits;
                if request.sort != SortOrder::Relevance {
                    sort_hits(&mut hits, request.sort);
                }
                Ok(RankedPage {
                    hits,
                    total: response.total,
                    search_type: SearchType::Legacy,
                    degraded: true,
                    sources: vec![Backend::Legacy],
                    failed: vec![cause.backend().unwrap_or(Backend::LexicalIndex)],
                    aggregations: response.aggregations,
                })
            }
            BranchOutcome::Failed { error: KhojError::Cancelled, .. } => Err(KhojError::Cancelled),
            BranchOutcome::Failed { backend, error } => {
                warn!(%backend, %error, "legacy search failed");
                Err(cause)
            }
        }
    }

    /// Spawn the write; failures are logged and dropped.
    fn emit(&self, event: AnalyticsEvent) {
        let Some(sink) = self.analytics.clone() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(kind = ?event.kind, "no async runtime, analytics event dropped");
            return;
        };
        runtime.spawn(async move {
            let kind = event.kind;
            if let Err(error) = sink.record(event).await {
                warn!(?kind, %error, "analytics event dropped");
            }
        });
    }
}

/// The pipeline's suggestions, plus "did you mean" spellings when nothing
/// matched: each unapplied correction swapped into the corrected text.
fn suggestions_for(parsed: &ParsedQuery, no_results: bool) -> Vec<String> {
    let mut out = parsed.suggestions.clone();
    if no_results {
        for correction in parsed.corrections.iter().filter(|c| !c.applied) {
            let respelled: Vec<&str> = parsed
                .corrected
                .split_whitespace()
                .map(|t| {
                    if t == correction.original {
                        correction.suggestion.as_str()
                    } else {
                        t
                    }
                })
                .collect();
            let respelled = respelled.join(" ");
            if respelled != parsed.corrected && !out.contains(&respelled) {
                out.push(respelled);
            }
        }
    }
    out
}
