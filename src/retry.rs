//! Retry driver for single fetch-and-extract units of work.

use std::future::Future;
use tracing::{debug, warn};

use crate::portal::ScrapeError;

/// How often a failing unit of work is attempted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts before giving up. `None` retries until success.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub fn unlimited() -> Self {
        Self { max_attempts: None }
    }

    pub fn attempts(max: u32) -> Self {
        Self {
            max_attempts: Some(max),
        }
    }

    fn exhausted(&self, attempt: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempt >= max)
    }
}

/// Run `op` until it succeeds, retrying retryable failures immediately.
///
/// `op` receives the 1-based attempt number. A terminal failure is returned
/// at once, and the last failure is returned when the policy's attempts run
/// out.
pub async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, ScrapeError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ScrapeError>>,
{
    let mut attempt = 0u32;
    loop {
        attempt = attempt.saturating_add(1);
        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(label, attempt, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if !e.is_retryable() => {
                warn!(label, attempt, error = %e, "giving up on non-retryable failure");
                return Err(e);
            }
            Err(e) if policy.exhausted(attempt) => {
                warn!(label, attempt, error = %e, "giving up after final attempt");
                return Err(e);
            }
            Err(e) => {
                warn!(label, attempt, error = ?e, "attempt failed, retrying");
            }
        }
    }
}
