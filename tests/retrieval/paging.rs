//! Paging stops where the candidate budget does.

use std::sync::Arc;

use khoj::retrieval::{
    CancellationToken, RetrievalOrchestrator, RetrievalRequest, RetrievalSettings,
    RetrievalStrategy,
};
use khoj::KhojError;

use super::common::{sample_item, ScriptedIndex};

/// More "dosa" matches than `max_candidates` (500).
fn crowded() -> Arc<ScriptedIndex> {
    let items = (0..600)
        .map(|i| {
            let mut item = sample_item(&format!("d{i:03}"));
            item.name = "Masala Dosa".to_string();
            item
        })
        .collect();
    let index = khoj::MemoryIndex::new("items");
    index.add_items(items);
    Arc::new(ScriptedIndex::new(index))
}

async fn page(
    index: Arc<ScriptedIndex>,
    n: usize,
    strategy: RetrievalStrategy,
) -> khoj::Result<khoj::RankedPage> {
    RetrievalOrchestrator::new(index, RetrievalSettings::default())
        .retrieve(
            &RetrievalRequest::new("dosa").page(n, 20),
            strategy,
            &CancellationToken::new(),
        )
        .await
}

#[tokio::test]
async fn total_counts_only_reachable_hits() {
    for strategy in [RetrievalStrategy::Hybrid, RetrievalStrategy::MultiStage] {
        let first = page(crowded(), 1, strategy).await.expect("answers");
        assert_eq!(first.total, 500, "{strategy:?}");

        let last = page(crowded(), first.total / 20, strategy).await.expect("answers");
        assert_eq!(last.hits.len(), 20, "{strategy:?}");
    }
}

#[tokio::test]
async fn page_past_the_budget_is_rejected_up_front() {
    let index = crowded();
    let err = page(index.clone(), 26, RetrievalStrategy::Hybrid)
        .await
        .expect_err("520 > 500");

    assert!(matches!(err, KhojError::InvalidFilter { ref field, .. } if field == "page"));
    assert!(err.is_client_error());
    assert_eq!(index.lexical_calls.started(), 0);
}
