use kvdns_domain::DomainError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Deadline and cancellation scope of one query.
///
/// Every backend and upstream call made while answering the query runs
/// inside [`QueryContext::run`], so an expired deadline or a cancelled
/// token fails the call instead of letting it finish late.
#[derive(Debug, Clone)]
pub struct QueryContext {
    deadline: Instant,
    cancel: CancellationToken,
}

impl QueryContext {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(Instant::now() + timeout, CancellationToken::new())
    }

    pub fn new(deadline: Instant, cancel: CancellationToken) -> Self {
        Self { deadline, cancel }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_done(&self) -> bool {
        self.cancel.is_cancelled() || Instant::now() >= self.deadline
    }

    pub async fn run<T, F>(&self, fut: F) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        if self.cancel.is_cancelled() {
            return Err(DomainError::QueryCancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(DomainError::QueryCancelled),
            result = tokio::time::timeout_at(self.deadline, fut) => {
                result.map_err(|_| DomainError::QueryTimeout)?
            }
        }
    }
}
