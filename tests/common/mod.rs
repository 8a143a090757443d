//! Shared test utilities and fixtures.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use khoj::retrieval::{
    DocumentIndex, EmbeddingProvider, RetrievalOrchestrator, RetrievalSettings,
};
use khoj::{HashingEmbedder, KhojConfig, MemoryIndex, SearchService};

// Re-export canonical test utilities from khoj::testing
pub use khoj::testing::{
    hit, hit_from_store, sample_catalog, sample_index, sample_item, Behavior, RecordingAnalytics,
    ScriptedEmbedder, ScriptedIndex, StaticLegacy, StaticPreferences, StaticZones,
};

/// Dimension the fixtures embed with.
pub const DIM: usize = 384;

/// The zone every fixture item lives in.
pub const ZONE: u64 = 3;

// ============================================================================
// BUILDERS
// ============================================================================

pub fn embedder() -> Arc<HashingEmbedder> {
    Arc::new(HashingEmbedder::new(DIM))
}

/// [`sample_index`] behind a script that lets every branch through.
pub fn scripted() -> ScriptedIndex {
    ScriptedIndex::new(sample_index())
}

/// Orchestrator over `index` with the stock embedder and default settings.
pub fn orchestrator(index: Arc<dyn DocumentIndex>) -> RetrievalOrchestrator {
    RetrievalOrchestrator::new(index, RetrievalSettings::default()).with_embedder(embedder())
}

pub fn orchestrator_with_embedder(
    index: Arc<dyn DocumentIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
) -> RetrievalOrchestrator {
    RetrievalOrchestrator::new(index, RetrievalSettings::default()).with_embedder(embedder)
}

/// A service over the sample catalog, vocabulary learned, nothing scripted.
pub fn service() -> SearchService {
    service_over(Arc::new(sample_index()))
}

pub fn service_over(index: Arc<dyn DocumentIndex>) -> SearchService {
    let service = SearchService::builder(KhojConfig::in_memory(), index)
        .embedder(embedder())
        .build()
        .expect("in-memory config is valid");
    service.learn_catalog(&sample_catalog());
    service
}

/// Index over an arbitrary item list, with vectors.
pub fn index_of(items: Vec<khoj::CatalogItem>) -> MemoryIndex {
    let index = MemoryIndex::new("items").with_embedder(embedder());
    index.add_items(items);
    index
}

/// Let spawned fire-and-forget tasks (analytics) run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub fn ids(hits: &[khoj::retrieval::Hit]) -> Vec<&str> {
    hits.iter().map(|h| h.id.as_str()).collect()
}
