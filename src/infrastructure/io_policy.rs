//! Timeouts and retries for calls across the persistence boundary

use crate::error::{GraphError, GraphResult};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// How repository and plugin calls are bounded.
///
/// Every call is subject to `timeout`. Reads are attempted again up to
/// `read_retries` times after a persistence failure or a timeout; writes are
/// attempted exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoPolicy {
    pub timeout: Duration,
    pub read_retries: u32,
}

impl Default for IoPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5000),
            read_retries: 2,
        }
    }
}

impl IoPolicy {
    pub fn new(timeout: Duration, read_retries: u32) -> Self {
        Self {
            timeout,
            read_retries,
        }
    }

    /// Run an idempotent read, retrying transient failures
    pub async fn read<T, F, Fut>(&self, operation: &str, mut call: F) -> GraphResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = GraphResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match self.bounded(operation, call()).await {
                Err(err) if err.is_retryable() && attempt < self.read_retries => {
                    attempt += 1;
                    warn!(operation, attempt, error = %err, "Retrying read");
                }
                result => return result,
            }
        }
    }

    /// Run a write once, bounded by the timeout
    pub async fn write<T>(
        &self,
        operation: &str,
        call: impl Future<Output = GraphResult<T>>,
    ) -> GraphResult<T> {
        self.bounded(operation, call).await
    }

    /// Run any future bounded by the timeout
    pub async fn bounded<T>(
        &self,
        operation: &str,
        call: impl Future<Output = GraphResult<T>>,
    ) -> GraphResult<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(GraphError::Timeout {
                operation: operation.to_string(),
                millis: self.timeout.as_millis().try_into().unwrap_or(u64::MAX),
            }),
        }
    }
}
