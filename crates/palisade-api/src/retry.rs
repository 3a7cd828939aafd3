// Retry-with-backoff around backend calls.
//
// Only connectivity-class errors are retried; semantic rejections are
// surfaced on first occurrence. The delay doubles per attempt: with the
// default policy the caller sees waits of 2s then 4s before the final try.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::ApiError;

/// Retry policy for transient backend failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles each subsequent retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries (tests, dry runs).
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Backoff delay after the given 1-based failed attempt.
    fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Run `op` until it succeeds, a non-transient error occurs, or the
/// attempt budget is exhausted.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                let delay = policy.delay_after(attempt);
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_secs = delay.as_secs(),
                    error = %e,
                    "transient backend failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
