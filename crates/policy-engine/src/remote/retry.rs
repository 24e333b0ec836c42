//! Bounded retry policy for the model endpoint
//!
//! The policy is plain data plus a runner; the wait itself goes through
//! [`Backoff`] so the browser build can sleep on a JS timer and tests can skip
//! waiting entirely.

use crate::error::AnalysisError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay after attempt `n` is `n * base_delay`
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt that follows `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Whether a failure on `attempt` should be followed by another attempt
    pub fn should_retry(&self, error: &AnalysisError, attempt: u32) -> bool {
        attempt < self.max_attempts && error.is_retryable()
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error, or
    /// runs out of attempts. The last error is returned.
    pub async fn run<T, F, Fut>(
        &self,
        backoff: &dyn Backoff,
        mut operation: F,
    ) -> Result<T, AnalysisError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, AnalysisError>>,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) if self.should_retry(&error, attempt) => {
                    let delay = self.delay_after(attempt);
                    tracing::warn!(attempt, ?delay, %error, "model request failed, retrying");
                    backoff.wait(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

/// Suspends between attempts
#[async_trait(?Send)]
pub trait Backoff {
    async fn wait(&self, delay: Duration);
}

/// Sleeps on the tokio timer
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioBackoff;

#[cfg(not(target_arch = "wasm32"))]
#[async_trait(?Send)]
impl Backoff for TokioBackoff {
    async fn wait(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Records requested delays without waiting
#[derive(Debug, Default)]
pub struct NoBackoff {
    waited: std::cell::RefCell<Vec<Duration>>,
}

impl NoBackoff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.waited.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Backoff for NoBackoff {
    async fn wait(&self, delay: Duration) {
        self.waited.borrow_mut().push(delay);
    }
}
