//! Retry with exponential backoff, applied by the client façade around a
//! single provider attempt.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use super::error::LlmError;
use super::http::HttpClientConfig;

/// Run `attempt` until it succeeds, fails with a non-transient error, or the
/// retry budget in `config` is spent.
///
/// Attempts are strictly sequential. When the budget runs out the last
/// transient failure is surfaced as [`LlmError::Transport`].
pub async fn with_backoff<T, F, Fut>(
    config: &HttpClientConfig,
    mut attempt: F,
) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let total_attempts = config.max_retries + 1;

    let mut n = 0;

    loop {
        let err = match attempt().await {
            Ok(value) => {
                if n > 0 {
                    debug!(attempt = n + 1, "request succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !err.is_transient() {
            return Err(err);
        }

        if n >= config.max_retries {
            return Err(LlmError::Transport {
                message: format!("giving up after {total_attempts} attempts: {err}"),
                source: Some(Box::new(err)),
            });
        }

        let delay = retry_delay(config, n, err.retry_after());
        warn!(
            attempt = n + 1,
            max_attempts = total_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "transient failure, retrying"
        );
        tokio::time::sleep(delay).await;
        n += 1;
    }
}

/// Delay before the attempt following attempt `n` (zero-based).
fn retry_delay(config: &HttpClientConfig, n: u32, retry_after: Option<Duration>) -> Duration {
    if let Some(hint) = retry_after {
        return hint.min(config.max_retry_delay);
    }

    let base_delay = config.initial_retry_delay.as_millis() as f64 * 2_f64.powi(n as i32);

    // +/- 10% jitter (0.9 to 1.1)
    let jitter_factor = rand::random::<f64>() * 0.2 + 0.9;
    let delay_ms = (base_delay * jitter_factor) as u64;

    Duration::from_millis(delay_ms).min(config.max_retry_delay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config(max_retries: u32) -> HttpClientConfig {
        HttpClientConfig {
            timeout: Duration::from_secs(5),
            max_retries,
            initial_retry_delay: Duration::from_millis(1),
            max_retry_delay: Duration::from_millis(5),
        }
    }

    fn server_error() -> LlmError {
        LlmError::Provider {
            message: "overloaded".to_string(),
            status_code: Some(503),
            retry_after: None,
        }
    }

    /// Counts attempts and fails with `error()` until `failures` attempts
    /// have been made.
    fn flaky(
        calls: &Arc<AtomicU32>,
        failures: u32,
        error: fn() -> LlmError,
    ) -> impl FnMut() -> std::future::Ready<Result<&'static str, LlmError>> {
        let calls = Arc::clone(calls);
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(if n < failures { Err(error()) } else { Ok("done") })
        }
    }

    fn unauthorized() -> LlmError {
        LlmError::Provider {
            message: "bad key".to_string(),
            status_code: Some(401),
            retry_after: None,
        }
    }

    fn connection_reset() -> LlmError {
        LlmError::Transport {
            message: "connection reset".to_string(),
            source: None,
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_k_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));

        let result = with_backoff(&fast_config(3), flaky(&calls, 3, server_error)).await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_as_transport_error() {
        let calls = Arc::new(AtomicU32::new(0));

        let result = with_backoff(&fast_config(2), flaky(&calls, u32::MAX, server_error)).await;

        match result {
            Err(LlmError::Transport { message, .. }) => {
                assert!(message.contains("3 attempts"), "got {message}")
            }
            other => panic!("Expected Transport error, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_transient_failure_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));

        let result = with_backoff(&fast_config(3), flaky(&calls, u32::MAX, unauthorized)).await;

        assert!(matches!(
            result,
            Err(LlmError::Provider {
                status_code: Some(401),
                ..
            })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_retries_means_single_attempt() {
        let calls = Arc::new(AtomicU32::new(0));

        let result = with_backoff(&fast_config(0), flaky(&calls, u32::MAX, connection_reset)).await;

        assert!(matches!(result, Err(LlmError::Transport { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_retry_delay_grows_and_is_capped() {
        let config = HttpClientConfig {
            initial_retry_delay: Duration::from_millis(100),
            max_retry_delay: Duration::from_millis(350),
            ..HttpClientConfig::default()
        };

        let first = retry_delay(&config, 0, None);
        assert!(first >= Duration::from_millis(90) && first <= Duration::from_millis(110));

        let second = retry_delay(&config, 1, None);
        assert!(second >= Duration::from_millis(180) && second <= Duration::from_millis(220));

        assert_eq!(retry_delay(&config, 5, None), Duration::from_millis(350));
    }

    #[test]
    fn test_retry_after_hint_overrides_backoff_but_not_cap() {
        let config = HttpClientConfig {
            initial_retry_delay: Duration::from_millis(100),
            max_retry_delay: Duration::from_secs(2),
            ..HttpClientConfig::default()
        };

        assert_eq!(
            retry_delay(&config, 0, Some(Duration::from_secs(1))),
            Duration::from_secs(1)
        );
        assert_eq!(
            retry_delay(&config, 0, Some(Duration::from_secs(30))),
            Duration::from_secs(2)
        );
    }
}
