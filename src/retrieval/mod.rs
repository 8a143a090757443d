// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Retrieval: from an understood query and filters to a ranked page.
//!
//! # Architecture
//!
//! ```text
//! RetrievalOrchestrator
//!   ├── backend      collaborator traits (index, embedder, preferences, ...)
//!   ├── cancel       per-branch timeout + cancellation guard
//!   ├── filters      SearchFilters → index predicates
//!   ├── fusion       weighted lexical/vector score sum
//!   ├── rerank       swappable second stage
//!   ├── personalize  bounded per-user boosts
//!   └── diversify    per-store / per-category caps
//! ```
//!
//! The orchestrator owns no data. Everything it searches sits behind the
//! traits in [`backend`]; [`crate::memory`] has in-process implementations.

pub mod backend;
pub mod cancel;
pub mod diversify;
pub mod filters;
pub mod fusion;
pub mod orchestrator;
pub mod personalize;
pub mod rerank;

pub use backend::{
    auto_fuzziness, vector_field, AnalyticsEvent, AnalyticsSink, DocumentIndex, EmbeddingProvider,
    EventKind, FieldBoost, FieldValue, Hit, HitSource, HybridQuery, IndexResponse, LegacyRequest,
    LegacySearch, LexicalQuery, Predicate, PreferenceStore, VectorQuery, ZoneResolver,
};
pub use cancel::{guarded, BranchOutcome, CancellationToken};
pub use diversify::{diversify, DiversityCaps};
pub use filters::{GeoFilter, SearchFilters};
pub use fusion::{fuse, sort_by_score, FusionWeights};
pub use orchestrator::{
    default_fields, sort_hits, RankedPage, RetrievalOrchestrator, RetrievalRequest,
    RetrievalSettings, RetrievalStrategy, SearchType, DEFAULT_PAGE_SIZE,
};
pub use personalize::apply_boosts;
pub use rerank::{IdentityReranker, PopularityRatingReranker, RerankWeights, Reranker};
