// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Cancellation and per-branch guards.
//!
//! Every backend call goes through [`guarded`]: a timeout plus a race against
//! the request's [`CancellationToken`]. The call's future is dropped the moment
//! either fires, which is what actually cancels in-flight HTTP work.
//! The outcome is a value, not an error to unwind: the orchestrator looks at
//! both branches and decides what to return.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use crate::error::{Backend, KhojError, Result};

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Cooperative cancellation shared by every branch of one request.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag, or a cancel in between is lost
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

/// How one branch ended.
#[derive(Debug)]
pub enum BranchOutcome<T> {
    Ok(T),
    Failed { backend: Backend, error: KhojError },
}

impl<T> BranchOutcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, BranchOutcome::Ok(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            BranchOutcome::Ok(v) => Some(v),
            BranchOutcome::Failed { .. } => None,
        }
    }

    pub fn into_result(self) -> Result<T> {
        match self {
            BranchOutcome::Ok(v) => Ok(v),
            BranchOutcome::Failed { error, .. } => Err(error),
        }
    }
}

/// Run `call` with a time budget, abandoning it if `cancel` fires first.
///
/// No retries. A timeout or error is final for this request.
pub async fn guarded<T, F>(
    backend: Backend,
    budget: Duration,
    cancel: &CancellationToken,
    call: F,
) -> BranchOutcome<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => BranchOutcome::Failed {
            backend,
            error: KhojError::Cancelled,
        },
        outcome = tokio::time::timeout(budget, call) => match outcome {
            Ok(Ok(value)) => BranchOutcome::Ok(value),
            Ok(Err(error)) => BranchOutcome::Failed {
                backend: error.backend().unwrap_or(backend),
                error,
            },
            Err(_) => BranchOutcome::Failed {
                backend,
                error: KhojError::Timeout {
                    backend,
                    after_ms: budget.as_millis() as u64,
                },
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn timeout_becomes_failed_outcome() {
        let token = CancellationToken::new();
        let outcome: BranchOutcome<()> = guarded(
            Backend::Embedding,
            Duration::from_millis(100),
            &token,
            async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            },
        )
        .await;
        match outcome {
            BranchOutcome::Failed { backend, error } => {
                assert_eq!(backend, Backend::Embedding);
                assert!(matches!(error, KhojError::Timeout { after_ms: 100, .. }));
            }
            BranchOutcome::Ok(_) => panic!("should have timed out"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_wins_over_slow_call() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });
        let started = tokio::time::Instant::now();
        let outcome: BranchOutcome<()> = guarded(
            Backend::LexicalIndex,
            Duration::from_secs(5),
            &token,
            std::future::pending(),
        )
        .await;
        assert!(matches!(outcome, BranchOutcome::Failed { error: KhojError::Cancelled, .. }));
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn already_cancelled_token_resolves_immediately() {
        let token = CancellationToken::new();
        token.cancel();
        token.cancelled().await;
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn upstream_error_keeps_its_backend() {
        let token = CancellationToken::new();
        let outcome: BranchOutcome<()> = guarded(
            Backend::VectorIndex,
            Duration::from_secs(1),
            &token,
            async { Err(KhojError::upstream(Backend::Embedding, "503")) },
        )
        .await;
        assert!(matches!(outcome, BranchOutcome::Failed { backend: Backend::Embedding, .. }));
    }
}
