//! Deadline and cancellation shared by every store call of one search.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::traits::StoreError;

/// Bounds a search: one deadline for the whole run, plus a cancellation token.
#[derive(Debug, Clone)]
pub struct SearchContext {
    deadline: Instant,
    cancel: CancellationToken,
}

impl SearchContext {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
            cancel: CancellationToken::new(),
        }
    }

    /// Cancel this search whenever `cancel` is cancelled.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[allow(dead_code)]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Await a store call, failing it once the deadline passes or the token fires.
    pub async fn run<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(StoreError::Cancelled),
            result = tokio::time::timeout_at(self.deadline, call) => {
                result.unwrap_or(Err(StoreError::Timeout))
            }
        }
    }
}
