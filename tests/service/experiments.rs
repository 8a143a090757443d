//! Experiment assignment picks the strategy; analytics never blocks a request.

use std::sync::Arc;

use khoj::experiment::SEARCH_ALGORITHM;
use khoj::retrieval::{AnalyticsEvent, EventKind};
use khoj::{
    ErrorKind, Experiment, ExperimentRegistry, ItemSearchParams, KhojConfig, KhojError,
    SearchService, SearchType, Variant,
};

use super::common::{embedder, sample_catalog, sample_index, settle, RecordingAnalytics, ZONE};

fn recorded(analytics: Arc<RecordingAnalytics>) -> SearchService {
    let svc = SearchService::builder(KhojConfig::in_memory(), Arc::new(sample_index()))
        .embedder(embedder())
        .analytics(analytics)
        .build()
        .expect("valid config");
    svc.learn_catalog(&sample_catalog());
    svc
}

#[test]
fn assignment_is_stable_across_registries() {
    let a = ExperimentRegistry::seeded();
    let b = ExperimentRegistry::seeded();
    for user in ["user_1", "user_42", "user_7", "अमित"] {
        assert_eq!(
            a.get_variant(SEARCH_ALGORITHM, user),
            b.get_variant(SEARCH_ALGORITHM, user)
        );
    }
    assert_eq!(a.get_variant(SEARCH_ALGORITHM, "user_42"), "multi_stage");
    assert_eq!(a.get_variant(SEARCH_ALGORITHM, "user_1"), "hybrid");
}

#[test]
fn weights_must_sum_to_one_hundred() {
    let registry = ExperimentRegistry::seeded();
    let lopsided = Experiment::new(
        "ranking_v2",
        vec![Variant::new("control", 50), Variant::new("treatment", 40)],
    );
    let err = registry.add_experiment(lopsided).expect_err("90 != 100");
    assert!(matches!(err, KhojError::InvalidExperiment { .. }));
    assert_eq!(err.kind(), ErrorKind::Registry);
    assert!(registry.experiment("ranking_v2").is_none());
}

#[tokio::test]
async fn variant_drives_the_strategy_and_is_recorded() {
    let analytics = Arc::new(RecordingAnalytics::default());
    let svc = recorded(analytics.clone());

    let response = svc
        .search_items(&ItemSearchParams::new("biryani").zone(ZONE).user("user_42"))
        .await
        .expect("served");
    assert_eq!(response.meta.variant.as_deref(), Some("multi_stage"));
    assert_eq!(response.meta.search_type, SearchType::MultiStage);

    settle().await;
    let events = analytics.events();
    let assignment = events
        .iter()
        .find(|e| e.kind == EventKind::ExperimentAssignment)
        .expect("assignment recorded");
    assert_eq!(assignment.user_id.as_deref(), Some("user_42"));
    assert_eq!(assignment.variant.as_deref(), Some("multi_stage"));

    let search = events
        .iter()
        .find(|e| e.kind == EventKind::Search)
        .expect("search recorded");
    assert_eq!(search.query.as_deref(), Some("biryani"));
    assert_eq!(search.result_count, Some(response.meta.total));
    assert_eq!(search.search_type.as_deref(), Some("multi_stage"));
}

#[tokio::test]
async fn control_bucket_user_gets_hybrid() {
    let svc = recorded(Arc::new(RecordingAnalytics::default()));
    let response = svc
        .search_items(&ItemSearchParams::new("biryani").zone(ZONE).user("user_1"))
        .await
        .expect("served");
    assert_eq!(response.meta.variant.as_deref(), Some("hybrid"));
    assert_eq!(response.meta.search_type, SearchType::Hybrid);
}

#[tokio::test]
async fn deactivated_experiment_falls_back_to_hybrid() {
    let svc = recorded(Arc::new(RecordingAnalytics::default()));
    assert!(svc.experiments().set_experiment_active(SEARCH_ALGORITHM, false));

    let response = svc
        .search_items(&ItemSearchParams::new("biryani").zone(ZONE).user("user_42"))
        .await
        .expect("served");
    assert_eq!(response.meta.variant.as_deref(), Some("control"));
    assert_eq!(response.meta.search_type, SearchType::Hybrid);
}

#[tokio::test]
async fn failing_analytics_does_not_fail_the_search() {
    let svc = recorded(Arc::new(RecordingAnalytics::failing()));
    let response = svc
        .search_items(&ItemSearchParams::new("dosa").zone(ZONE).user("user_42"))
        .await
        .expect("served despite the sink");
    settle().await;
    assert!(!response.is_empty());
}

#[tokio::test]
async fn interactions_are_recorded() {
    let analytics = Arc::new(RecordingAnalytics::default());
    let svc = recorded(analytics.clone());

    let click = AnalyticsEvent::new(EventKind::Click)
        .user(Some("user_42"))
        .item("101");
    svc.record_event(click).await.expect("accepted");
    settle().await;

    let events = analytics.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].item_id.as_deref(), Some("101"));
}

#[tokio::test]
async fn service_owned_and_itemless_events_are_rejected() {
    let analytics = Arc::new(RecordingAnalytics::default());
    let svc = recorded(analytics.clone());

    let search = AnalyticsEvent::new(EventKind::Search).query("biryani");
    let err = svc.record_event(search).await.expect_err("service-owned");
    assert!(matches!(err, KhojError::InvalidFilter { ref field, .. } if field == "kind"));

    let click = AnalyticsEvent::new(EventKind::Click).user(Some("user_42"));
    let err = svc.record_event(click).await.expect_err("no item");
    assert!(matches!(err, KhojError::InvalidFilter { ref field, .. } if field == "item_id"));

    settle().await;
    assert!(analytics.events().is_empty());
}
