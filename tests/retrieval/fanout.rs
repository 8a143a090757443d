//! Lexical and vector run side by side, each under its own budget.
//!
//! Time is paused in these tests, so elapsed times are exact.

use std::sync::Arc;
use std::time::Duration;

use khoj::retrieval::{
    CancellationToken, RetrievalRequest, RetrievalSettings, RetrievalStrategy, SearchType,
};
use khoj::Backend;
use tokio::time::Instant;

use super::common::{
    orchestrator, orchestrator_with_embedder, scripted, Behavior, ScriptedEmbedder, DIM,
};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Paused-time timers can land a millisecond late, never early.
fn assert_about(elapsed: Duration, expected: Duration) {
    assert!(
        elapsed >= expected && elapsed <= expected + ms(5),
        "took {elapsed:?}, expected {expected:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn latency_is_the_slower_branch_not_the_sum() {
    let index = Arc::new(
        scripted()
            .lexical(Behavior::Delay(ms(120)))
            .vector(Behavior::Delay(ms(100))),
    );
    let orchestrator = orchestrator(index.clone());

    let started = Instant::now();
    let page = orchestrator
        .retrieve(
            &RetrievalRequest::new("biryani"),
            RetrievalStrategy::Hybrid,
            &CancellationToken::new(),
        )
        .await
        .expect("both branches answer");

    // 120ms, not 220ms
    assert_about(started.elapsed(), ms(120));
    assert_eq!(page.search_type, SearchType::Hybrid);
    assert!(!page.degraded);
    assert_eq!(page.sources, vec![Backend::LexicalIndex, Backend::VectorIndex]);
    assert_eq!(index.lexical_calls.finished(), 1);
    assert_eq!(index.vector_calls.finished(), 1);
}

#[tokio::test(start_paused = true)]
async fn hung_vector_branch_costs_one_index_budget() {
    let index = Arc::new(scripted().vector(Behavior::Hang));
    let orchestrator = orchestrator(index.clone());
    let budget = RetrievalSettings::default().index_timeout;

    let started = Instant::now();
    let page = orchestrator
        .retrieve(
            &RetrievalRequest::new("biryani"),
            RetrievalStrategy::Hybrid,
            &CancellationToken::new(),
        )
        .await
        .expect("lexical still answers");

    assert_about(started.elapsed(), budget);
    assert_eq!(page.search_type, SearchType::LexicalOnly);
    assert!(page.degraded);
    assert_eq!(page.failed, vec![Backend::VectorIndex]);
    assert!(!page.hits.is_empty());
    // The hung call was dropped, not awaited
    assert_eq!(index.vector_calls.started(), 1);
    assert_eq!(index.vector_calls.finished(), 0);
}

#[tokio::test(start_paused = true)]
async fn slow_embedder_hits_its_own_budget_first() {
    let index = Arc::new(scripted());
    let embedder = Arc::new(ScriptedEmbedder::new(DIM, Behavior::Hang));
    let orchestrator = orchestrator_with_embedder(index.clone(), embedder.clone());
    let budget = RetrievalSettings::default().embedding_timeout;

    let started = Instant::now();
    let page = orchestrator
        .retrieve(
            &RetrievalRequest::new("masala dosa"),
            RetrievalStrategy::Hybrid,
            &CancellationToken::new(),
        )
        .await
        .expect("lexical still answers");

    assert_about(started.elapsed(), budget);
    assert_eq!(page.search_type, SearchType::LexicalOnly);
    assert_eq!(page.failed, vec![Backend::Embedding]);
    assert_eq!(index.vector_calls.started(), 0, "no vector to search with");
    assert_eq!(embedder.calls.finished(), 0);
}

#[tokio::test]
async fn fused_page_is_sorted_by_score() {
    let orchestrator = orchestrator(Arc::new(scripted()));
    let page = orchestrator
        .retrieve(
            &RetrievalRequest::new("chicken biryani"),
            RetrievalStrategy::Hybrid,
            &CancellationToken::new(),
        )
        .await
        .expect("answers");

    assert!(page.hits.windows(2).all(|w| w[0].score >= w[1].score));
    assert_eq!(page.hits.first().map(|h| h.id.as_str()), Some("101"));
}
