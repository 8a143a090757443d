//! Multi-stage ranking: over-fetch, rerank, personalize, diversify.

use std::sync::Arc;

use khoj::retrieval::{
    CancellationToken, IdentityReranker, RetrievalOrchestrator, RetrievalRequest,
    RetrievalStrategy, SearchFilters, SearchType,
};
use khoj::{Backend, KhojError, SortOrder};

use super::common::{orchestrator, scripted, Behavior, StaticPreferences};

async fn multi_stage(
    orchestrator: &RetrievalOrchestrator,
    request: RetrievalRequest,
) -> khoj::Result<khoj::RankedPage> {
    orchestrator
        .retrieve(&request, RetrievalStrategy::MultiStage, &CancellationToken::new())
        .await
}

#[tokio::test]
async fn multi_stage_is_tagged_and_diversified() {
    let page = multi_stage(
        &orchestrator(Arc::new(scripted())),
        RetrievalRequest::new("biryani").page(1, 10),
    )
    .await
    .expect("answers");

    assert_eq!(page.search_type, SearchType::MultiStage);
    assert!(!page.hits.is_empty());
    // Never three in a row from one store
    assert!(page
        .hits
        .windows(3)
        .all(|w| !(w[0].item.store_id == w[1].item.store_id
            && w[1].item.store_id == w[2].item.store_id)));
}

#[tokio::test]
async fn explicit_sort_skips_diversification() {
    let page = multi_stage(
        &orchestrator(Arc::new(scripted())),
        RetrievalRequest::new("biryani").sort(SortOrder::PriceAsc),
    )
    .await
    .expect("answers");

    assert!(page
        .hits
        .windows(2)
        .all(|w| w[0].item.price <= w[1].item.price));
}

#[tokio::test]
async fn personalization_needs_a_user() {
    let preferences = Arc::new(StaticPreferences::new(&[("103", 0.3)]));
    let orchestrator = orchestrator(Arc::new(scripted())).with_preferences(preferences.clone());

    let anonymous = multi_stage(&orchestrator, RetrievalRequest::new("biryani"))
        .await
        .expect("answers");
    assert_eq!(preferences.calls.started(), 0);
    assert!(!anonymous.sources.contains(&Backend::Personalization));

    let known = multi_stage(
        &orchestrator,
        RetrievalRequest::new("biryani").user(Some("user_42")),
    )
    .await
    .expect("answers");
    assert_eq!(preferences.calls.finished(), 1);
    assert!(known.sources.contains(&Backend::Personalization));
    assert!(!known.degraded);
}

#[tokio::test]
async fn personalization_failure_keeps_base_ranking() {
    let orchestrator = orchestrator(Arc::new(scripted()))
        .with_preferences(Arc::new(StaticPreferences::failing()));

    let page = multi_stage(
        &orchestrator,
        RetrievalRequest::new("biryani").user(Some("user_42")),
    )
    .await
    .expect("base ranking still served");

    assert_eq!(page.search_type, SearchType::MultiStage);
    assert!(page.degraded);
    assert_eq!(page.failed, vec![Backend::Personalization]);
    assert!(!page.hits.is_empty());
}

#[tokio::test(start_paused = true)]
async fn slow_personalization_times_out() {
    let preferences = StaticPreferences {
        behavior: Behavior::Hang,
        ..StaticPreferences::new(&[("103", 0.3)])
    };
    let orchestrator =
        orchestrator(Arc::new(scripted())).with_preferences(Arc::new(preferences));

    let page = multi_stage(
        &orchestrator,
        RetrievalRequest::new("biryani").user(Some("user_42")),
    )
    .await
    .expect("base ranking still served");
    assert_eq!(page.failed, vec![Backend::Personalization]);
}

#[tokio::test]
async fn reranker_is_swappable() {
    let orchestrator =
        orchestrator(Arc::new(scripted())).with_reranker(Arc::new(IdentityReranker));
    assert_eq!(orchestrator.reranker().name(), "identity");
    let page = multi_stage(&orchestrator, RetrievalRequest::new("dosa"))
        .await
        .expect("answers");
    assert_eq!(page.hits.first().map(|h| h.id.as_str()), Some("601"));
}

#[tokio::test]
async fn filters_apply_before_scoring() {
    let filters = SearchFilters {
        veg: Some(true),
        price_max: Some(250.0),
        ..Default::default()
    };
    let index = Arc::new(scripted());
    let page = multi_stage(
        &orchestrator(index.clone()),
        RetrievalRequest::new("biryani").filters(filters),
    )
    .await
    .expect("answers");

    assert!(!page.hits.is_empty());
    assert!(page.hits.iter().all(|h| h.item.veg && h.item.price <= 250.0));
    assert_eq!(page.hits[0].id, "103");
}

#[tokio::test]
async fn invalid_filters_fail_before_any_call() {
    let index = Arc::new(scripted());
    let filters = SearchFilters {
        price_min: Some(500.0),
        price_max: Some(100.0),
        ..Default::default()
    };
    let err = multi_stage(
        &orchestrator(index.clone()),
        RetrievalRequest::new("biryani").filters(filters),
    )
    .await
    .expect_err("inverted range");

    assert!(matches!(err, KhojError::InvalidFilter { .. }));
    assert_eq!(index.lexical_calls.started(), 0);
}
