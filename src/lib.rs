// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Query understanding and retrieval orchestration for multilingual commerce search.
//!
//! Users type "chiken biriani", "चिकन बिरयानी", "sww" or "butter chicken from
//! Inayat Cafe". This crate turns that into a precise, ranked, faceted result
//! page, and keeps answering when a backend doesn't.
//!
//! # Architecture
//!
//! ```text
//! raw query
//!    │
//!    ▼
//! ┌──────────────────────── understanding ─────────────────────────┐
//! │ transliterate ─▶ spell ─▶ synonyms ─▶ intent + entities         │
//! └──────────────────────────────┬─────────────────────────────────┘
//!                                ▼
//!                   targeting (item / store / both)
//!                                │        experiment ─▶ strategy
//!                                ▼                          │
//! ┌──────────────────────── retrieval ◀──────────────────────┘─────┐
//! │ lexical ║ vector  ─▶ fuse ─▶ (rerank ─▶ personalize ─▶ diversify)│
//! └──────────────────────────────┬─────────────────────────────────┘
//!                                ▼
//!                             facets ─▶ SearchResponse
//! ```
//!
//! # Modules
//!
//! | Module          | What it owns                                          |
//! |-----------------|-------------------------------------------------------|
//! | `understanding` | Devanagari→Latin, spelling, synonyms, intent, entities |
//! | `targeting`     | "X from Y" and store-first detection                  |
//! | `retrieval`     | Collaborator traits, fan-out, fusion, multi-stage     |
//! | `facets`        | Aggregations, facet values, facet⇄filter encoding     |
//! | `experiment`    | Consistent-hash variant assignment                    |
//! | `service`       | Request-shaped operations over all of the above       |
//! | `memory`        | In-process index and embedder (CLI, tests, benches)   |
//! | `config`        | JSON config, env overrides, startup validation        |
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use khoj::{KhojConfig, ItemSearchParams, MemoryIndex, SearchService};
//!
//! let index = Arc::new(MemoryIndex::from_items("items", catalog));
//! let service = SearchService::builder(KhojConfig::in_memory(), index).build()?;
//!
//! let page = service.search_items(&ItemSearchParams::new("chiken biriani").zone(3)).await?;
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod experiment;
pub mod facets;
pub mod fuzzy;
pub mod logging;
pub mod memory;
pub mod retrieval;
pub mod service;
pub mod targeting;
pub mod testing;
pub mod types;
pub mod understanding;
pub mod util;

// Re-exports for public API
pub use config::KhojConfig;
pub use error::{Backend, ErrorKind, KhojError, Result};
pub use experiment::{Experiment, ExperimentRegistry, Variant};
pub use facets::{Facet, FacetFilter, FacetsEngine};
pub use memory::{HashingEmbedder, MemoryIndex};
pub use retrieval::{
    CancellationToken, RankedPage, RetrievalOrchestrator, RetrievalRequest, RetrievalStrategy,
    SearchFilters, SearchType,
};
pub use service::{
    ConversationalParams, ConversationalResponse, HybridSearchParams, ItemSearchParams,
    SearchResponse, SearchService,
};
pub use targeting::{QueryIntentParser, StoreItemIntent, TargetKind};
pub use types::{CatalogItem, DomainContext, GeoPoint, ModuleKind, SortOrder};
pub use understanding::{ParsedQuery, QueryUnderstandingPipeline};
