use std::future::Future;
use std::time::Duration;

use internship_core_api::{CoreError, CoreResult};
use tokio::time::Instant;

/// Per-request facts supplied by the HTTP boundary.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Operations still running at this instant are abandoned with `DeadlineExceeded`.
    pub deadline: Option<Instant>,
    pub source_address: Option<String>,
    pub user_agent: Option<String>,
    pub device: Option<String>,
}

impl RequestContext {
    /// Context for work not triggered by a request (sweeps, startup).
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn with_source(mut self, source_address: Option<String>, user_agent: Option<String>) -> Self {
        self.source_address = source_address;
        self.user_agent = user_agent;
        self
    }

    pub fn with_device(mut self, device: Option<String>) -> Self {
        self.device = device;
        self
    }

    /// Drive `operation` until it finishes or the deadline passes.
    ///
    /// On expiry the future is dropped, and with it any open unit of work, so
    /// the transaction rolls back.
    pub async fn bounded<T, F>(&self, operation: F) -> CoreResult<T>
    where
        F: Future<Output = CoreResult<T>>,
    {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, operation)
                .await
                .map_err(|_| CoreError::DeadlineExceeded)?,
            None => operation.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deadline_aborts_slow_operation() {
        let ctx = RequestContext::background().with_timeout(Duration::from_millis(10));
        let result: CoreResult<()> = ctx
            .bounded(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(CoreError::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn test_no_deadline_runs_to_completion() {
        let result = RequestContext::background().bounded(async { Ok(7) }).await;
        assert_eq!(tokio_test::assert_ok!(result), 7);
    }
}
