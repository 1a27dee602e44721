//! Linear-backoff retry for the push-update workflow
//!
//! The main orchestrator loop never retries; its only failure response is
//! the fixed inter-cycle pause. This policy exists solely for the one-shot
//! `push-update` command: retry on 429/503 with delay = attempt x step,
//! capped at a fixed attempt count.

use super::contest_errors::ContestError;
use std::future::Future;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first)
    pub max_attempts: u32,
    /// Base delay; attempt N waits N x step before retrying
    pub step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            step: Duration::from_secs(15),
        }
    }
}

/// Execute an async closure with linear backoff.
///
/// Only retries when `ContestError::is_retryable()` returns true.
pub async fn with_linear_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut f: F,
) -> Result<T, ContestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ContestError>>,
{
    let mut attempt = 0u32;

    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(err) => {
                attempt += 1;

                if !err.is_retryable() || attempt >= policy.max_attempts {
                    if attempt >= policy.max_attempts {
                        warn!(
                            "[Retry] {} failed after {} attempts: {}",
                            operation_name, attempt, err
                        );
                    }
                    return Err(err);
                }

                let delay = policy.step * attempt;
                debug!(
                    "[Retry] {} attempt {}/{} failed ({}), retrying in {:?}",
                    operation_name, attempt, policy.max_attempts, err, delay
                );

                sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_succeeds_first_try() {
        let policy = RetryPolicy::default();
        let result = with_linear_retry(&policy, "test", || async { Ok::<_, ContestError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_retries_rate_limit_then_succeeds() {
        let policy = RetryPolicy {
            max_attempts: 6,
            step: Duration::from_millis(1),
        };

        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = with_linear_retry(&policy, "test", || {
            let count = counter_clone.fetch_add(1, Ordering::SeqCst);
            async move {
                if count < 2 {
                    Err(ContestError::RateLimited)
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_immediately() {
        let policy = RetryPolicy {
            max_attempts: 6,
            step: Duration::from_millis(1),
        };

        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = with_linear_retry(&policy, "test", || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            async { Err::<i32, _>(ContestError::AuthFailed) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_attempts_capped() {
        let policy = RetryPolicy {
            max_attempts: 6,
            step: Duration::from_millis(1),
        };

        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = with_linear_retry(&policy, "test", || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            async { Err::<i32, _>(ContestError::Unavailable) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 6);
    }
}
