//! Async execution of [`RetryPolicy`] values.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use pixsynth_core::retry::RetryPolicy;
use pixsynth_gateway::GatewayError;

/// Waits between attempts. Injected so tests can record delays instead of
/// sleeping.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real wall-clock sleeping on the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Run `op` until it succeeds or `policy` gives up.
///
/// `op` receives the 1-based attempt number. Non-retryable failures and
/// the failure that exhausts the policy are returned unchanged.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    label: &str,
    mut op: F,
) -> Result<T, GatewayError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    let mut retries_done = 0u32;
    loop {
        let attempt = retries_done + 1;
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let class = e.class();
                if !policy.should_retry(class, retries_done) {
                    if policy.is_retryable(class) && policy.max_retries > 0 {
                        tracing::error!(
                            operation = label,
                            attempts = attempt,
                            error = %e,
                            "Retries exhausted",
                        );
                    }
                    return Err(e);
                }

                retries_done += 1;
                let delay = policy.delay_for(retries_done);
                tracing::warn!(
                    operation = label,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Attempt failed, retrying",
                );
                sleeper.sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording(Mutex<Vec<Duration>>);

    #[async_trait]
    impl Sleeper for Recording {
        async fn sleep(&self, duration: Duration) {
            self.0.lock().unwrap().push(duration);
        }
    }

    fn secs(sleeper: &Recording) -> Vec<u64> {
        sleeper.0.lock().unwrap().iter().map(|d| d.as_secs()).collect()
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let sleeper = Recording::default();
        let result = with_retry(&RetryPolicy::base_image(), &sleeper, "base", |attempt| async move {
            if attempt < 3 {
                Err(GatewayError::Timeout("slow".into()))
            } else {
                Ok(attempt)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(secs(&sleeper), vec![10, 20]);
    }

    #[tokio::test]
    async fn non_retryable_fails_immediately() {
        let sleeper = Recording::default();
        let mut calls = 0;
        let result: Result<(), _> = with_retry(&RetryPolicy::base_image(), &sleeper, "base", |_| {
            calls += 1;
            async { Err(GatewayError::Api { status: 400, body: "bad".into() }) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls, 1);
        assert!(secs(&sleeper).is_empty());
    }

    #[tokio::test]
    async fn exhaustion_returns_last_error() {
        let sleeper = Recording::default();
        let mut calls = 0;
        let result: Result<(), _> =
            with_retry(&RetryPolicy::direction_transform(), &sleeper, "rotate", |_| {
                calls += 1;
                async { Err(GatewayError::Malformed("nope".into())) }
            })
            .await;
        assert!(matches!(result, Err(GatewayError::Malformed(_))));
        assert_eq!(calls, 3);
        assert_eq!(secs(&sleeper), vec![2, 4]);
    }
}
