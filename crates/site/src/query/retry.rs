//! Retry policy for failed fetches and mutations.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::api::ApiError;
use crate::config::CacheConfig;

/// How often, and how patiently, to retry a failed API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first failure; `0` disables retrying
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Double the delay after every failure
    pub exponential: bool,
}

impl RetryPolicy {
    /// Reads: up to 3 retries, 1s doubling to at most 30s.
    #[must_use]
    pub const fn for_queries() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            exponential: true,
        }
    }

    /// Writes: one retry after a flat second.
    #[must_use]
    pub const fn for_mutations() -> Self {
        Self {
            max_retries: 1,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(1),
            exponential: false,
        }
    }

    /// Never retry.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            exponential: false,
        }
    }

    /// Read policy using the configured retry count and delays.
    #[must_use]
    pub const fn from_config(config: &CacheConfig) -> Self {
        Self {
            max_retries: config.retries,
            base_delay: config.retry_base_delay,
            max_delay: config.retry_max_delay,
            exponential: true,
        }
    }

    /// Whether to try again after `failures` failed attempts ending in `err`.
    ///
    /// Client errors (4xx) are final: the same request will fail the same way.
    #[must_use]
    pub const fn should_retry(&self, failures: u32, err: &ApiError) -> bool {
        !err.is_client_error() && failures < self.max_retries
    }

    /// Delay after `failures` failed attempts: `min(base * 2^failures, max)`.
    #[must_use]
    pub fn delay_for(&self, failures: u32) -> Duration {
        if !self.exponential {
            return self.base_delay.min(self.max_delay);
        }
        let factor = 2u32.checked_pow(failures).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Run `attempt` until it succeeds or the policy gives up.
    ///
    /// # Errors
    ///
    /// Returns the last error once retrying stops.
    pub async fn run<T, F, Fut>(&self, attempt: F) -> Result<T, ApiError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut failures = 0;
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) if self.should_retry(failures, &err) => {
                    let delay = self.delay_for(failures);
                    failures += 1;
                    warn!(
                        error = %err,
                        attempt = failures,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "API call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::for_queries()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use reqwest::StatusCode;

    use super::*;

    fn server_error() -> ApiError {
        ApiError::from_response(StatusCode::SERVICE_UNAVAILABLE, "")
    }

    #[test]
    fn test_exponential_delays_are_capped() {
        let policy = RetryPolicy::for_queries();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(5), Duration::from_secs(30));
        assert_eq!(policy.delay_for(40), Duration::from_secs(30));
    }

    #[test]
    fn test_mutation_delay_is_flat() {
        let policy = RetryPolicy::for_mutations();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(3), Duration::from_secs(1));
    }

    #[test]
    fn test_client_errors_are_final() {
        let policy = RetryPolicy::for_queries();
        let not_found = ApiError::from_response(StatusCode::NOT_FOUND, "");
        assert!(!policy.should_retry(0, &not_found));
        assert!(policy.should_retry(0, &server_error()));
        assert!(policy.should_retry(2, &server_error()));
        assert!(!policy.should_retry(3, &server_error()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_retries_server_errors_then_gives_up() {
        let calls = Arc::new(AtomicU32::new(0));
        let started = tokio::time::Instant::now();

        let result: Result<(), ApiError> = RetryPolicy::for_queries()
            .run(|| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(server_error())
                }
            })
            .await;

        assert_eq!(result.unwrap_err().status(), 503);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // 1s + 2s + 4s of backoff.
        assert_eq!(started.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_does_not_retry_client_errors() {
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), ApiError> = RetryPolicy::for_queries()
            .run(|| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(ApiError::from_response(StatusCode::FORBIDDEN, ""))
                }
            })
            .await;

        assert_eq!(result.unwrap_err().status(), 403);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_recovers_after_transient_failure() {
        let calls = Arc::new(AtomicU32::new(0));

        let result = RetryPolicy::for_queries()
            .run(|| {
                let calls = Arc::clone(&calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(ApiError::Network {
                            message: "down".to_string(),
                        })
                    } else {
                        Ok("up")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "up");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
