//! Generic async retry with exponential backoff, adapted from the
//! teacher's `PodAIClient::retry_with_backoff`. Used by the message
//! pipeline around `Store`/`LLMClient` calls, never inside the pure
//! components.

use crate::errors::NegotiationError;
use std::future::Future;
use std::time::Duration;

/// Maximum backoff between attempts, regardless of attempt count.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Retry `operation` up to `max_attempts` times, doubling the delay
/// between attempts starting at `base_delay` and capping at
/// [`MAX_BACKOFF`]. Stops immediately on a non-retryable error.
pub async fn retry_with_backoff<T, F, Fut>(
    max_attempts: u32,
    base_delay: Duration,
    mut operation: F,
) -> Result<T, NegotiationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, NegotiationError>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_retryable() && attempt < max_attempts => {
                let delay = base_delay
                    .saturating_mul(2u32.saturating_pow(attempt - 1))
                    .min(MAX_BACKOFF);
                tokio::time::sleep(delay).await;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retries_until_success() {
        let attempts = AtomicU32::new(0);
        let result = retry_with_backoff(5, Duration::from_millis(1), || {
            let count = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if count < 2 {
                    Err(NegotiationError::dependency_transient("timeout"))
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_immediately() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), NegotiationError> =
            retry_with_backoff(5, Duration::from_millis(1), || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(NegotiationError::validation("x", "bad")) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausts_attempts_and_returns_last_error() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), NegotiationError> =
            retry_with_backoff(3, Duration::from_millis(1), || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(NegotiationError::dependency_transient("still down")) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
