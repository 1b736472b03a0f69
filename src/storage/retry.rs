//! Bounded retry for transient storage contention.
//!
//! One primitive shared by every read and write: an operation that fails
//! with a busy/locked error is retried with linearly increasing backoff;
//! any other error is returned immediately.

use super::traits::StorageResult;
use std::time::Duration;
use tracing::{error, warn};

/// Attempt budget and backoff step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Sleep after attempt `n` is `base_backoff * n`
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn with_base_backoff(mut self, base_backoff: Duration) -> Self {
        self.base_backoff = base_backoff;
        self
    }

    /// Delay before the attempt that follows `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff * attempt
    }
}

/// Run `op`, retrying on contention per `policy`.
pub async fn with_retry<T, F>(policy: &RetryPolicy, operation: &str, mut op: F) -> StorageResult<T>
where
    F: FnMut() -> StorageResult<T>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_contention() && attempt < max_attempts => {
                let delay = policy.backoff(attempt);
                warn!(
                    operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "database locked, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_contention() {
                    error!(operation, attempts = attempt, error = %e, "database still locked, giving up");
                }
                return Err(e);
            }
        }
    }
}
