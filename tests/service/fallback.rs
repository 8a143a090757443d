//! Legacy search takes over when every index branch is down.

use std::sync::Arc;

use khoj::retrieval::CancellationToken;
use khoj::service::ResultSource;
use khoj::{Backend, ErrorKind, ItemSearchParams, KhojConfig, KhojError, SearchService, SearchType};

use super::common::{sample_catalog, scripted, Behavior, ScriptedIndex, StaticLegacy, ZONE};

fn with_legacy(index: Arc<ScriptedIndex>, legacy: Arc<StaticLegacy>) -> SearchService {
    SearchService::builder(KhojConfig::in_memory(), index)
        .legacy(legacy)
        .build()
        .expect("valid config")
}

#[tokio::test]
async fn index_down_is_served_by_legacy() {
    let legacy = Arc::new(StaticLegacy::new(sample_catalog()));
    let svc = with_legacy(Arc::new(scripted().down()), legacy.clone());

    let response = svc
        .search_items(&ItemSearchParams::new("biryani").zone(ZONE))
        .await
        .expect("legacy answers");

    assert_eq!(response.meta.source, ResultSource::Legacy);
    assert_eq!(response.meta.search_type, SearchType::Legacy);
    assert!(response.meta.degraded);
    assert_eq!(response.meta.failed, vec![Backend::LexicalIndex]);
    assert!(!response.is_empty());
    assert!(response.items.iter().all(|h| h.item.zone_id == ZONE));
    assert_eq!(legacy.calls.finished(), 1);
}

#[tokio::test]
async fn legacy_gets_the_corrected_query() {
    let legacy = Arc::new(StaticLegacy::new(sample_catalog()));
    let svc = with_legacy(Arc::new(scripted().down()), legacy.clone());

    svc.search_items(&ItemSearchParams::new("chiken biriani").zone(ZONE))
        .await
        .expect("legacy answers");

    let request = legacy.last_request.lock().clone().expect("legacy was called");
    assert_eq!(request.query, "chicken biryani");
}

#[tokio::test]
async fn legacy_failure_surfaces_the_index_error() {
    let legacy = Arc::new(StaticLegacy {
        behavior: Behavior::Fail,
        ..StaticLegacy::new(sample_catalog())
    });
    let svc = with_legacy(Arc::new(scripted().down()), legacy.clone());

    let err = svc
        .search_items(&ItemSearchParams::new("biryani").zone(ZONE))
        .await
        .expect_err("nothing answered");

    assert_eq!(err.kind(), ErrorKind::Upstream);
    assert_eq!(err.backend(), Some(Backend::LexicalIndex));
    assert_eq!(legacy.calls.started(), 1);
}

#[tokio::test]
async fn no_legacy_configured_is_an_upstream_error() {
    let svc = SearchService::builder(KhojConfig::in_memory(), Arc::new(scripted().down()))
        .build()
        .expect("valid config");

    let err = svc
        .search_items(&ItemSearchParams::new("biryani").zone(ZONE))
        .await
        .expect_err("nothing answered");
    assert!(matches!(err, KhojError::Upstream { .. }));
    assert!(!err.is_client_error());
}

#[tokio::test]
async fn one_live_branch_keeps_legacy_out() {
    let legacy = Arc::new(StaticLegacy::new(sample_catalog()));
    let index = Arc::new(scripted().vector(Behavior::Fail));
    let svc = SearchService::builder(KhojConfig::in_memory(), index)
        .embedder(super::common::embedder())
        .legacy(legacy.clone())
        .build()
        .expect("valid config");

    let response = svc
        .search_items(&ItemSearchParams::new("biryani").zone(ZONE))
        .await
        .expect("lexical answers");

    assert_eq!(response.meta.source, ResultSource::Index);
    assert_eq!(response.meta.search_type, SearchType::LexicalOnly);
    assert!(response.meta.degraded);
    assert_eq!(legacy.calls.started(), 0);
}

#[tokio::test]
async fn cancellation_never_falls_back() {
    let legacy = Arc::new(StaticLegacy::new(sample_catalog()));
    let svc = with_legacy(Arc::new(scripted()), legacy.clone());
    let token = CancellationToken::new();
    token.cancel();

    let err = svc
        .search_items_cancellable(&ItemSearchParams::new("biryani").zone(ZONE), &token)
        .await
        .expect_err("cancelled");

    assert!(matches!(err, KhojError::Cancelled));
    assert_eq!(legacy.calls.started(), 0);
}
