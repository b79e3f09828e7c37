//! Bounded exponential backoff for idempotent external calls.

use crate::config::RetryConfig;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Run `operation` until it succeeds or the policy's attempts are exhausted,
/// sleeping with jittered exponential backoff between attempts. Returns the
/// last error when every attempt fails.
///
/// Only use this for idempotent operations; retrying a charge submission
/// could double-bill.
pub async fn with_backoff<T, E, F, Fut>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut backoff = config.initial_backoff;

    for attempt in 1..=config.max_attempts {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt == config.max_attempts => {
                tracing::warn!(%error, attempt, "giving up after final attempt");
                return Err(error);
            }
            Err(error) => {
                let jitter = rand::rng().random_range(0..=backoff.as_millis() as u64 / 4);
                let delay = backoff + Duration::from_millis(jitter);
                tracing::warn!(%error, attempt, delay_ms = delay.as_millis() as u64, "attempt failed, backing off");
                tokio::time::sleep(delay).await;
                backoff = (backoff * 2).min(config.max_backoff);
            }
        }
    }

    unreachable!("retry loop always returns within max_attempts")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
        }
    }

    #[tokio::test]
    async fn succeeds_without_retrying() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = with_backoff(&fast_policy(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(42)
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = with_backoff(&fast_policy(), || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err("transient".to_string())
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = with_backoff(&fast_policy(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("down".to_string())
        })
        .await;
        assert_eq!(result.unwrap_err(), "down");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
