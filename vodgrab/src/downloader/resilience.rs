//! Fixed-delay retry for metadata extraction.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{Error, Result};

/// Delay between extraction attempts unless configured otherwise.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// How failed extraction attempts are repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wait between two attempts. Not scaled by attempt count.
    pub delay: Duration,
    /// Total attempts allowed, the first one included. `None` never gives up.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: DEFAULT_RETRY_DELAY,
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Whether another attempt may follow attempt number `attempt` (1-based).
    pub fn should_retry(&self, attempt: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempt < max)
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, runs
/// out of attempts, or `token` is cancelled.
///
/// `operation` receives the 1-based attempt number. Cancellation is observed
/// before each attempt, while an attempt is in flight, and during the delay;
/// it always yields [`Error::Cancelled`].
pub async fn retry_until_ok<T, F, Fut>(
    policy: &RetryPolicy,
    token: &CancellationToken,
    mut operation: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;

    loop {
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        attempt = attempt.saturating_add(1);

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(Error::Cancelled),
            result = operation(attempt) => result,
        };

        let err = match result {
            Ok(value) => {
                if attempt > 1 {
                    info!(attempts = attempt, "Succeeded after retrying");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !err.is_retryable() {
            debug!(attempt, error = %err, "Non-retryable error, giving up");
            return Err(err);
        }
        if !policy.should_retry(attempt) {
            warn!(attempt, error = %err, "Retry attempts exhausted");
            return Err(err);
        }

        warn!(
            attempt,
            delay_ms = policy.delay.as_millis() as u64,
            error = %err,
            "Attempt failed, retrying"
        );

        tokio::select! {
            biased;
            _ = token.cancelled() => return Err(Error::Cancelled),
            _ = tokio::time::sleep(policy.delay) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use platforms_parser::extractor::ExtractorError;

    use super::*;

    fn fast() -> RetryPolicy {
        RetryPolicy::fixed(Duration::from_millis(5))
    }

    #[test]
    fn default_policy_is_unbounded_three_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay, Duration::from_secs(3));
        assert!(policy.should_retry(u32::MAX - 1));

        let bounded = policy.with_max_attempts(2);
        assert!(bounded.should_retry(1));
        assert!(!bounded.should_retry(2));
    }

    #[tokio::test]
    async fn succeeds_after_two_failures() {
        let calls = AtomicU32::new(0);
        let token = CancellationToken::new();

        let result = retry_until_ok(&fast(), &token, |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err(ExtractorError::ScriptNotFound.into())
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
    async fn non_retryable_error_returns_immediately() {
        let calls = AtomicU32::new(0);
        let token = CancellationToken::new();

        let result: Result<()> = retry_until_ok(&fast(), &token, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(ExtractorError::Challenge(Box::new(ExtractorError::ScriptNotFound)).into())
            }
        })
        .await;

        assert!(matches!(result, Err(Error::Challenge(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn bounded_policy_gives_up() {
        let calls = AtomicU32::new(0);
        let token = CancellationToken::new();

        let result: Result<()> = retry_until_ok(&fast().with_max_attempts(4), &token, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ExtractorError::NoStreamsFound.into()) }
        })
        .await;

        assert!(matches!(result, Err(Error::Parse(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn cancellation_stops_unbounded_loop() {
        let token = CancellationToken::new();
        let calls = AtomicU32::new(0);

        let canceller = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                token.cancel();
            })
        };

        let result: Result<()> = retry_until_ok(&fast(), &token, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ExtractorError::ScriptNotFound.into()) }
        })
        .await;

        canceller.await.unwrap();
        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(calls.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn cancelled_token_skips_the_first_attempt() {
        let token = CancellationToken::new();
        token.cancel();

        let calls = AtomicU32::new(0);

        let result: Result<()> = retry_until_ok(&fast(), &token, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancellation_interrupts_a_long_delay() {
        let token = CancellationToken::new();
        let policy = RetryPolicy::fixed(Duration::from_secs(3600));

        let canceller = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                token.cancel();
            })
        };

        let result: Result<()> = tokio::time::timeout(
            Duration::from_secs(5),
            retry_until_ok(&policy, &token, |_| async {
                Err(ExtractorError::ScriptNotFound.into())
            }),
        )
        .await
        .unwrap();

        canceller.await.unwrap();
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
