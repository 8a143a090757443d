//! A cancelled request stops its branch calls and returns nothing partial.

use std::sync::Arc;
use std::time::Duration;

use khoj::retrieval::{CancellationToken, RetrievalRequest, RetrievalStrategy};
use khoj::KhojError;
use tokio::time::Instant;

use super::common::{orchestrator, scripted, Behavior};

#[tokio::test(start_paused = true)]
async fn cancel_drops_in_flight_branches() {
    let index = Arc::new(scripted().lexical(Behavior::Hang).vector(Behavior::Hang));
    let orchestrator = orchestrator(index.clone());
    let token = CancellationToken::new();

    let started = Instant::now();
    let request = RetrievalRequest::new("biryani");
    let (result, ()) = tokio::join!(
        orchestrator.retrieve(&request, RetrievalStrategy::Hybrid, &token),
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        }
    );

    assert!(matches!(result, Err(KhojError::Cancelled)));
    assert!(started.elapsed() < Duration::from_millis(100));
    assert_eq!(index.lexical_calls.started(), 1);
    assert_eq!(index.lexical_calls.finished(), 0);
    assert_eq!(index.vector_calls.finished(), 0);
}

#[tokio::test]
async fn cancelled_before_start_touches_no_backend() {
    let index = Arc::new(scripted());
    let token = CancellationToken::new();
    token.cancel();

    let result = orchestrator(index.clone())
        .retrieve(
            &RetrievalRequest::new("biryani"),
            RetrievalStrategy::MultiStage,
            &token,
        )
        .await;

    assert!(matches!(result, Err(KhojError::Cancelled)));
    assert_eq!(index.lexical_calls.started(), 0);
    assert_eq!(index.vector_calls.started(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancel_after_one_branch_answered_discards_it() {
    // Lexical is done at 10ms, vector would take a second
    let index = Arc::new(
        scripted()
            .lexical(Behavior::Delay(Duration::from_millis(10)))
            .vector(Behavior::Hang),
    );
    let orchestrator = orchestrator(index.clone());
    let token = CancellationToken::new();

    let request = RetrievalRequest::new("biryani");
    let (result, ()) = tokio::join!(
        orchestrator.retrieve(&request, RetrievalStrategy::Hybrid, &token),
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        }
    );

    assert_eq!(index.lexical_calls.finished(), 1);
    assert!(matches!(result, Err(KhojError::Cancelled)));
}

#[tokio::test]
async fn a_token_is_shared_by_its_clones() {
    let token = CancellationToken::new();
    let clone = token.clone();
    assert!(!clone.is_cancelled());
    token.cancel();
    assert!(clone.is_cancelled());
    // Resolves immediately once cancelled
    clone.cancelled().await;
}
