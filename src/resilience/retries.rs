//! Retry loop.
//!
//! # Responsibilities
//! - Re-run a fallible async operation until it succeeds or attempts run out
//! - Sleep with jittered backoff between attempts
//! - Hand back the last error so callers can report it per endpoint

use std::future::Future;

use crate::resilience::backoff::RetryPolicy;

/// Run `op` up to `policy.max_attempts` times.
pub async fn retry_with_backoff<T, E, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_attempts => {
                let delay = policy.delay(attempt);
                tracing::debug!(attempt, delay = ?delay, error = %e, "Retrying after failure");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay_ms: 1,
            max_delay_ms: 5,
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry_with_backoff(fast(3), |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err(format!("attempt {} failed", attempt))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_returns_last_error() {
        let result: Result<(), String> =
            retry_with_backoff(fast(2), |attempt| async move { Err(format!("boom {}", attempt)) }).await;
        assert_eq!(result.unwrap_err(), "boom 2");
    }
}
