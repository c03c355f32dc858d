//! Executes an async call under the interactive or main-loop retry
//! policy (spec.md §5, §6): exponential backoff from `initial_backoff`,
//! multiplied by `multiplier` each attempt, capped at `max_backoff`,
//! bounded by an optional `deadline`.

use std::future::Future;
use std::time::{Duration, Instant};

use pgha_config::RetryPolicyConfig;
use rand::Rng;
use tracing::warn;

use crate::error::TransportError;

/// Runs `call` under `policy`, retrying whenever the error is
/// [`TransportError::is_retryable`], until it succeeds, a non-retryable
/// error is hit, or the policy's deadline elapses.
pub async fn with_retry<F, Fut, T>(policy: RetryPolicyConfig, mut call: F) -> Result<T, TransportError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    let start = Instant::now();
    let mut backoff = policy.initial_backoff;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => {
                if let Some(deadline) = policy.deadline {
                    if start.elapsed() >= deadline {
                        return Err(TransportError::RetriesExhausted {
                            attempts,
                            last: err.to_string(),
                        });
                    }
                }
                warn!(attempt = attempts, %err, ?backoff, "monitor RPC failed, retrying");
                tokio::time::sleep(jitter(backoff)).await;
                backoff = backoff.mul_f64(policy.multiplier).min(policy.max_backoff);
            }
        }
    }
}

/// Adds up to 20% jitter so a thundering herd of keepers don't retry in
/// lockstep against the monitor.
fn jitter(base: Duration) -> Duration {
    let factor = rand::thread_rng().gen_range(0.9..1.1);
    base.mul_f64(factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn succeeds_immediately_without_retrying() {
        let policy = RetryPolicyConfig::interactive();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result = with_retry(policy, move || {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TransportError>(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_on_object_in_use_then_succeeds() {
        let mut policy = RetryPolicyConfig::interactive();
        policy.initial_backoff = Duration::from_millis(1);
        policy.max_backoff = Duration::from_millis(5);
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result = with_retry(policy, move || {
            let calls = calls_clone.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(TransportError::ObjectInUse)
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_a_version_mismatch() {
        let policy = RetryPolicyConfig::interactive();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: Result<(), TransportError> = with_retry(policy, move || {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TransportError::VersionMismatch {
                    found: "1.5".into(),
                    expected: "1.6".into(),
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_once_the_deadline_elapses() {
        let mut policy = RetryPolicyConfig::interactive();
        policy.initial_backoff = Duration::from_millis(1);
        policy.max_backoff = Duration::from_millis(1);
        policy.deadline = Some(Duration::from_millis(5));

        let result: Result<(), TransportError> = with_retry(policy, || async { Err(TransportError::ObjectInUse) }).await;

        assert!(matches!(result, Err(TransportError::RetriesExhausted { .. })));
    }
}
