//! A failed branch degrades the page; only losing every branch is an error.

use std::sync::Arc;

use khoj::retrieval::{
    CancellationToken, RetrievalOrchestrator, RetrievalRequest, RetrievalSettings,
    RetrievalStrategy, SearchType,
};
use khoj::{Backend, ErrorKind};

use super::common::{
    ids, orchestrator, orchestrator_with_embedder, sample_index, scripted, Behavior,
    ScriptedEmbedder, ScriptedIndex, DIM,
};

async fn run(
    orchestrator: &RetrievalOrchestrator,
    request: RetrievalRequest,
) -> khoj::Result<khoj::RankedPage> {
    orchestrator
        .retrieve(&request, RetrievalStrategy::Hybrid, &CancellationToken::new())
        .await
}

#[tokio::test]
async fn failed_vector_branch_returns_the_lexical_page() {
    let degraded = run(
        &orchestrator(Arc::new(scripted().vector(Behavior::Fail))),
        RetrievalRequest::new("biryani"),
    )
    .await
    .expect("lexical answers");
    let lexical = run(
        &orchestrator(Arc::new(scripted())),
        RetrievalRequest::new("biryani").semantic(false),
    )
    .await
    .expect("lexical answers");

    assert_eq!(degraded.search_type, SearchType::LexicalOnly);
    assert!(degraded.degraded);
    assert_eq!(degraded.failed, vec![Backend::VectorIndex]);
    assert_eq!(ids(&degraded.hits), ids(&lexical.hits));
}

#[tokio::test]
async fn failed_lexical_branch_returns_the_vector_page() {
    let page = run(
        &orchestrator(Arc::new(scripted().lexical(Behavior::Fail))),
        RetrievalRequest::new("paneer butter masala"),
    )
    .await
    .expect("vector answers");

    assert_eq!(page.search_type, SearchType::VectorOnly);
    assert!(page.degraded);
    assert_eq!(page.failed, vec![Backend::LexicalIndex]);
    assert_eq!(page.sources, vec![Backend::VectorIndex]);
    assert!(!page.hits.is_empty());
}

#[tokio::test]
async fn losing_both_branches_is_an_upstream_error() {
    let err = run(
        &orchestrator(Arc::new(scripted().down())),
        RetrievalRequest::new("biryani"),
    )
    .await
    .expect_err("nothing answered");

    assert_eq!(err.kind(), ErrorKind::Upstream);
    assert_eq!(err.backend(), Some(Backend::LexicalIndex));
}

#[tokio::test]
async fn embedding_failure_is_reported_as_embedding() {
    let index = Arc::new(scripted());
    let embedder = Arc::new(ScriptedEmbedder::new(DIM, Behavior::Fail));
    let page = run(
        &orchestrator_with_embedder(index.clone(), embedder),
        RetrievalRequest::new("biryani"),
    )
    .await
    .expect("lexical answers");

    assert_eq!(page.search_type, SearchType::LexicalOnly);
    assert_eq!(page.failed, vec![Backend::Embedding]);
    assert_eq!(index.vector_calls.started(), 0);
}

#[tokio::test]
async fn switching_semantic_off_is_not_a_degradation() {
    let index = Arc::new(scripted());
    let page = run(
        &orchestrator(index.clone()),
        RetrievalRequest::new("biryani").semantic(false),
    )
    .await
    .expect("lexical answers");

    assert_eq!(page.search_type, SearchType::LexicalOnly);
    assert!(!page.degraded);
    assert!(page.failed.is_empty());
    assert_eq!(index.vector_calls.started(), 0);
}

#[tokio::test]
async fn no_embedder_means_lexical_only() {
    let orchestrator =
        RetrievalOrchestrator::new(Arc::new(scripted()), RetrievalSettings::default());
    let page = run(&orchestrator, RetrievalRequest::new("dosa"))
        .await
        .expect("lexical answers");
    assert_eq!(page.search_type, SearchType::LexicalOnly);
    assert!(!page.degraded);
}

#[tokio::test]
async fn native_hybrid_falls_back_to_lexical_when_embedding_fails() {
    let index = Arc::new(ScriptedIndex::new(sample_index().with_native_hybrid(true)));
    let embedder = Arc::new(ScriptedEmbedder::new(DIM, Behavior::Fail));
    let page = run(
        &orchestrator_with_embedder(index.clone(), embedder),
        RetrievalRequest::new("biryani"),
    )
    .await
    .expect("lexical answers");

    assert_eq!(page.search_type, SearchType::LexicalOnly);
    assert_eq!(page.failed, vec![Backend::Embedding]);
    assert_eq!(index.hybrid_calls.started(), 0);
    assert_eq!(index.lexical_calls.finished(), 1);
}

#[tokio::test]
async fn native_hybrid_is_one_call() {
    let index = Arc::new(ScriptedIndex::new(sample_index().with_native_hybrid(true)));
    let page = run(&orchestrator(index.clone()), RetrievalRequest::new("biryani"))
        .await
        .expect("answers");

    assert_eq!(page.search_type, SearchType::HybridNative);
    assert_eq!(page.sources, vec![Backend::HybridIndex]);
    assert_eq!(index.hybrid_calls.finished(), 1);
    assert_eq!(index.lexical_calls.started() + index.vector_calls.started(), 0);
}
