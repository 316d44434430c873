//! Single cookie round-trip for session challenge pages.
//!
//! Some player pages answer the first request with a page that looks normal
//! but only carries `Set-Cookie` headers instead of the player config. The
//! page is served properly once those cookies are sent back.

use std::future::Future;

use tracing::{debug, warn};

use super::error::ExtractorError;
use super::session::SessionState;

/// Why one extraction attempt failed, plus the cookies the response tried to set.
#[derive(Debug)]
pub struct AttemptFailure {
    pub error: ExtractorError,
    pub set_cookies: Vec<String>,
}

impl AttemptFailure {
    pub fn new(error: ExtractorError, set_cookies: Vec<String>) -> Self {
        Self { error, set_cookies }
    }

    /// Failure that never reached a response, so no cookies can be involved.
    pub fn without_cookies(error: ExtractorError) -> Self {
        Self::new(error, Vec::new())
    }

    pub fn is_challenge(&self) -> bool {
        !self.set_cookies.is_empty()
    }
}

impl From<ExtractorError> for AttemptFailure {
    fn from(error: ExtractorError) -> Self {
        Self::without_cookies(error)
    }
}

/// Run `attempt`, answering at most one session challenge.
///
/// When the first attempt fails and its response carried cookies, they are
/// stored in `session` (so every later request sharing that state sends them)
/// and the attempt runs exactly once more. A second failure is reported as
/// [`ExtractorError::Challenge`]. Failures without cookies are returned as is.
pub async fn resolve_with_challenge<T, F, Fut>(
    session: &SessionState,
    mut attempt: F,
) -> Result<T, ExtractorError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AttemptFailure>>,
{
    let failure = match attempt().await {
        Ok(value) => return Ok(value),
        Err(failure) => failure,
    };

    if !failure.is_challenge() {
        return Err(failure.error);
    }

    let stored = session.store_set_cookies(&failure.set_cookies);
    if stored == 0 {
        debug!(error = %failure.error, "Response cookies were unusable; not retrying");
        return Err(failure.error);
    }

    warn!(
        cookies = stored,
        error = %failure.error,
        "Session challenge detected, retrying with cookies"
    );

    attempt()
        .await
        .map_err(|retry| ExtractorError::Challenge(Box::new(retry.error)))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn success_does_not_touch_session() {
        let session = SessionState::new();
        let result: Result<u32, _> = resolve_with_challenge(&session, || async { Ok(7) }).await;

        assert_eq!(result.unwrap(), 7);
        assert!(session.is_empty());
    }

    #[tokio::test]
    async fn failure_without_cookies_propagates_unchanged() {
        let session = SessionState::new();
        let calls = AtomicUsize::new(0);

        let result: Result<(), _> = resolve_with_challenge(&session, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ExtractorError::ScriptNotFound.into()) }
        })
        .await;

        assert!(matches!(result, Err(ExtractorError::ScriptNotFound)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn challenge_retries_once_with_cookies() {
        let session = SessionState::new();
        let calls = AtomicUsize::new(0);

        let result = resolve_with_challenge(&session, || {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            let cookie = session.get_cookie("vuid");
            async move {
                if call == 0 {
                    Err(AttemptFailure::new(
                        ExtractorError::ScriptNotFound,
                        vec!["vuid=abc; Path=/".to_string()],
                    ))
                } else {
                    Ok(cookie)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap().as_deref(), Some("abc"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn second_failure_is_a_challenge_error() {
        let session = SessionState::new();
        let calls = AtomicUsize::new(0);

        let result: Result<(), _> = resolve_with_challenge(&session, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(AttemptFailure::new(
                    ExtractorError::ScriptNotFound,
                    vec!["vuid=abc".to_string()],
                ))
            }
        })
        .await;

        let err = result.unwrap_err();
        assert!(err.is_challenge());
        assert!(!err.is_retryable());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unusable_cookies_do_not_trigger_a_retry() {
        let session = SessionState::new();
        let calls = AtomicUsize::new(0);

        let result: Result<(), _> = resolve_with_challenge(&session, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(AttemptFailure::new(
                    ExtractorError::ScriptNotFound,
                    vec!["garbage".to_string()],
                ))
            }
        })
        .await;

        assert!(matches!(result, Err(ExtractorError::ScriptNotFound)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
