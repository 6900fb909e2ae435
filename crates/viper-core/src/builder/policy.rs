//! Timeout and retry handling for generation attempts.
//!
//! Stateless, like the rest of the builder helpers: the policy comes from
//! configuration and the attempt closure is supplied by the caller.

use std::future::Future;
use std::time::Duration;

use viper_types::config::GenerationPolicy;
use viper_types::error::GenerationError;
use viper_types::llm::LlmError;

/// Whether a failed attempt should be followed by another one.
///
/// `attempt` is 1-based (first execution is attempt 1).
pub fn should_retry(policy: &GenerationPolicy, attempt: u32, error: &GenerationError) -> bool {
    error.is_retryable() && attempt < policy.attempts()
}

/// Delay before the attempt following `attempt`.
///
/// Linear backoff, stretched to the provider's `Retry-After` hint when a
/// rate limit carries one.
pub fn retry_delay(policy: &GenerationPolicy, attempt: u32, error: &GenerationError) -> Duration {
    let backoff = policy.retry_backoff_ms.saturating_mul(u64::from(attempt));
    let hinted = match error {
        GenerationError::ServiceFailure(LlmError::RateLimited {
            retry_after_ms: Some(ms),
        }) => *ms,
        _ => 0,
    };
    Duration::from_millis(backoff.max(hinted))
}

/// Run `attempt` under the policy's deadline, retrying retryable failures.
///
/// Each attempt gets its own deadline. An expired deadline becomes
/// [`GenerationError::Timeout`]; the in-flight attempt is dropped.
pub async fn run_with_policy<T, F, Fut>(
    policy: &GenerationPolicy,
    mut attempt: F,
) -> Result<T, GenerationError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, GenerationError>>,
{
    let mut n = 1;
    loop {
        let result = match policy.deadline() {
            Some(deadline) => match tokio::time::timeout(deadline, attempt(n)).await {
                Ok(result) => result,
                Err(_) => Err(GenerationError::Timeout {
                    after_secs: deadline.as_secs(),
                }),
            },
            None => attempt(n).await,
        };

        match result {
            Err(err) if should_retry(policy, n, &err) => {
                let delay = retry_delay(policy, n, &err);
                tracing::warn!(
                    attempt = n,
                    max_attempts = policy.attempts(),
                    delay_ms = delay.as_millis() as u64,
                    "generation attempt failed: {err}; retrying"
                );
                tokio::time::sleep(delay).await;
                n += 1;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(timeout_secs: Option<u64>, max_attempts: u32) -> GenerationPolicy {
        GenerationPolicy {
            timeout_secs,
            max_attempts,
            retry_backoff_ms: 100,
        }
    }

    #[test]
    fn test_should_retry_respects_attempts_and_kind() {
        let p = policy(None, 3);
        let transient = GenerationError::ServiceFailure(LlmError::Overloaded("busy".into()));
        let permanent = GenerationError::ParseFailure("eof".into());

        assert!(should_retry(&p, 1, &transient));
        assert!(should_retry(&p, 2, &transient));
        assert!(!should_retry(&p, 3, &transient));
        assert!(!should_retry(&p, 1, &permanent));
    }

    #[test]
    fn test_retry_delay_linear_and_hinted() {
        let p = policy(None, 3);
        let overloaded = GenerationError::ServiceFailure(LlmError::Overloaded("busy".into()));
        assert_eq!(retry_delay(&p, 1, &overloaded), Duration::from_millis(100));
        assert_eq!(retry_delay(&p, 2, &overloaded), Duration::from_millis(200));

        let limited = GenerationError::ServiceFailure(LlmError::RateLimited {
            retry_after_ms: Some(1_500),
        });
        assert_eq!(retry_delay(&p, 1, &limited), Duration::from_millis(1_500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_by_default() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = run_with_policy(&GenerationPolicy::default(), |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async {
                Err(GenerationError::ServiceFailure(LlmError::Overloaded(
                    "busy".into(),
                )))
            }
        })
        .await;

        assert!(matches!(result, Err(GenerationError::ServiceFailure(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = run_with_policy(&policy(None, 3), |attempt| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err(GenerationError::ServiceFailure(LlmError::Provider {
                        message: "connection reset".into(),
                    }))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = run_with_policy(&policy(None, 5), |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(GenerationError::ServiceFailure(LlmError::AuthenticationFailed)) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_produces_timeout() {
        let result: Result<(), _> = run_with_policy(&policy(Some(2), 1), |_| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        })
        .await;

        match result {
            Err(GenerationError::Timeout { after_secs }) => assert_eq!(after_secs, 2),
            other => panic!("expected Timeout, got: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_retried() {
        let result = run_with_policy(&policy(Some(1), 2), |attempt| async move {
            if attempt == 1 {
                tokio::time::sleep(Duration::from_secs(10)).await;
            }
            Ok(attempt)
        })
        .await;

        assert_eq!(result.unwrap(), 2);
    }
}
