//! Retry with exponential backoff and jitter.
//!
//! Every call to a generative back-end (LLM or TTS) goes through [`with_retry`].
//! The delay doubles after each failure and is scaled by a random factor in
//! `[0.5, 1.0)`, so the expected growth per attempt is 1.5x.

use crate::error::{PodsmithError, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Retry bounds for a single back-end call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt (total attempts = max_retries + 1).
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 1000,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff_ms: 0,
        }
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }
}

/// A retry policy paired with the run's cancellation token.
///
/// Stages hold one of these and route every back-end call through [`RetryContext::call`].
#[derive(Debug, Clone, Default)]
pub struct RetryContext {
    pub policy: RetryPolicy,
    pub cancel: CancellationToken,
}

impl RetryContext {
    pub fn new(policy: RetryPolicy, cancel: CancellationToken) -> Self {
        Self { policy, cancel }
    }

    pub async fn call<T, F, Fut>(&self, operation_name: &str, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        with_retry(&self.policy, &self.cancel, operation_name, operation).await
    }
}

/// Next backoff given the current one: `backoff * 2 * (0.5 + jitter / 2)`, jitter in `[0, 1)`.
pub fn next_backoff(current: Duration, jitter: f64) -> Duration {
    let factor = 2.0 * (0.5 + jitter.clamp(0.0, 1.0) / 2.0);
    current.mul_f64(factor)
}

/// Run `operation` until it succeeds or the policy is exhausted.
///
/// On exhaustion the last error is returned unchanged. Cancellation is checked
/// before every attempt and raced against every backoff sleep.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    operation_name: &str,
    operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    with_retry_observed(policy, cancel, operation_name, operation, |_, _| {}).await
}

/// Like [`with_retry`], calling `on_backoff(retry_number, delay)` before each sleep.
pub async fn with_retry_observed<T, F, Fut, O>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    operation_name: &str,
    mut operation: F,
    mut on_backoff: O,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    O: FnMut(u32, Duration),
{
    let mut failures = 0u32;
    let mut backoff = policy.initial_backoff();

    loop {
        if cancel.is_cancelled() {
            return Err(PodsmithError::Cancelled);
        }

        match operation().await {
            Ok(value) => {
                if failures > 0 {
                    debug!(operation = operation_name, failures, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(PodsmithError::Cancelled) => return Err(PodsmithError::Cancelled),
            Err(e) => {
                failures += 1;
                if failures > policy.max_retries {
                    return Err(e);
                }

                warn!(
                    operation = operation_name,
                    attempt = failures,
                    delay_ms = backoff.as_millis() as u64,
                    "Call failed, retrying: {}",
                    e
                );
                on_backoff(failures, backoff);

                tokio::select! {
                    _ = cancel.cancelled() => return Err(PodsmithError::Cancelled),
                    _ = tokio::time::sleep(backoff) => {}
                }

                backoff = next_backoff(backoff, rand::random::<f64>());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn flaky(failures: u32, calls: Arc<AtomicU32>) -> impl FnMut() -> std::pin::Pin<Box<dyn Future<Output = Result<u32>> + Send>> {
        move || {
            let calls = calls.clone();
            Box::pin(async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < failures {
                    Err(PodsmithError::Generation(format!("failure {}", n)))
                } else {
                    Ok(n)
                }
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_k_failures() {
        let policy = RetryPolicy::default();
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));
        let mut delays = Vec::new();

        let value = with_retry_observed(&policy, &cancel, "test", flaky(2, calls.clone()), |_, d| {
            delays.push(d)
        })
        .await
        .unwrap();

        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(delays.len(), 2);
        assert_eq!(delays[0], Duration::from_millis(1000));
        assert!(delays[1] >= Duration::from_millis(1000));
        assert!(delays[1] < Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_stops_after_max_retries_plus_one() {
        let policy = RetryPolicy::default();
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));
        let mut sleeps = 0;

        let err = with_retry_observed(&policy, &cancel, "test", flaky(u32::MAX, calls.clone()), |_, _| {
            sleeps += 1
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), policy.max_retries + 1);
        assert_eq!(sleeps, policy.max_retries);
        // Original error is propagated unchanged
        match err {
            PodsmithError::Generation(msg) => assert_eq!(msg, "failure 3"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_single_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = with_retry(&RetryPolicy::none(), &CancellationToken::new(), "test", flaky(1, calls.clone())).await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff() {
        let policy = RetryPolicy {
            max_retries: 5,
            initial_backoff_ms: 60_000,
        };
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let err = with_retry(&policy, &cancel, "test", flaky(u32::MAX, calls.clone()))
            .await
            .unwrap_err();

        assert!(matches!(err, PodsmithError::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_next_backoff_jitter_bounds() {
        let base = Duration::from_millis(1000);
        assert_eq!(next_backoff(base, 0.0), Duration::from_millis(1000));
        assert_eq!(next_backoff(base, 1.0), Duration::from_millis(2000));
        let mid = next_backoff(base, 0.5);
        assert_eq!(mid, Duration::from_millis(1500));
    }
}
