//! Bounded retry with exponential backoff for network-dependent stages.

use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// How many times an operation is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero is treated as one.
    pub max_attempts: u32,
    /// Wait before the second attempt; doubled for every following attempt.
    pub initial_backoff: Duration,
    /// Upper bound for a single wait.
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff,
            max_backoff: Duration::from_secs(30),
        }
    }

    /// A policy that runs the operation exactly once.
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Backoff to wait after the given failed attempt (1-based).
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts are used up. The closure receives the 1-based attempt.
pub async fn with_backoff<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let wait = policy.backoff_after(attempt);
                warn!(
                    "{} attempt {}/{} failed: {}. Retrying in {:?}",
                    label, attempt, max_attempts, e, wait
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
