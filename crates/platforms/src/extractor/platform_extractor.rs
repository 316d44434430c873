use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use super::error::ExtractorError;
use super::fetcher::{PageFetcher, PageResponse};
use super::session::SessionState;
use crate::media::VideoDescriptor;

/// User agent sent when the caller does not configure one.
pub const DEFAULT_UA: &str = concat!("vodgrab-extractor/", env!("CARGO_PKG_VERSION"));

/// Request state shared by every platform extractor.
///
/// Holds the page URL, the platform headers, and a handle to the session
/// cookie store. Cookies are read from the store on every request, so
/// cookies captured by one extractor are seen by every other extractor
/// holding the same [`SessionState`].
#[derive(Clone)]
pub struct Extractor {
    // url to extract from, e.g. "https://player.vimeo.com/video/42"
    pub url: String,
    // name of the platform, used in logs
    pub platform_name: String,
    fetcher: Arc<dyn PageFetcher>,
    platform_headers: HeaderMap,
    session: SessionState,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("url", &self.url)
            .field("platform_name", &self.platform_name)
            .field("platform_headers", &self.platform_headers)
            .finish_non_exhaustive()
    }
}

impl Extractor {
    pub fn new<S1: Into<String>, S2: Into<String>>(
        platform_name: S1,
        platform_url: S2,
        fetcher: Arc<dyn PageFetcher>,
        session: SessionState,
    ) -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(reqwest::header::ACCEPT, HeaderValue::from_static("*/*"));
        default_headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(DEFAULT_UA),
        );

        Self {
            platform_name: platform_name.into(),
            url: platform_url.into(),
            fetcher,
            platform_headers: default_headers,
            session,
        }
    }

    pub fn set_referer(&mut self, referer: &str) {
        self.add_header_typed(reqwest::header::REFERER, referer);
    }

    pub fn set_user_agent(&mut self, user_agent: &str) {
        self.add_header_typed(reqwest::header::USER_AGENT, user_agent);
    }

    /// Insert an arbitrary header; invalid names or values are skipped.
    pub fn add_header_str<K: AsRef<str>, V: AsRef<str>>(&mut self, key: K, value: V) {
        match HeaderName::from_str(key.as_ref()) {
            Ok(name) => self.add_header_typed(name, value),
            Err(e) => {
                debug!(error = %e, "Invalid header name; skipping");
            }
        }
    }

    pub fn add_header_typed<K: Into<HeaderName>, V: AsRef<str>>(&mut self, key: K, value: V) {
        match HeaderValue::from_str(value.as_ref()) {
            Ok(value) => {
                self.platform_headers.insert(key.into(), value);
            }
            Err(e) => {
                debug!(error = %e, "Invalid header value; skipping");
            }
        }
    }

    pub fn get_platform_headers(&self) -> &HeaderMap {
        &self.platform_headers
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Platform headers plus the current session `Cookie` header.
    pub fn request_headers(&self) -> HeaderMap {
        let mut headers = self.platform_headers.clone();
        if let Some(cookie) = self.session.cookie_header() {
            headers.insert(reqwest::header::COOKIE, cookie);
        }
        headers
    }

    pub async fn fetch(&self, url: &str) -> Result<PageResponse, ExtractorError> {
        self.fetcher.fetch(url, self.request_headers()).await
    }

    pub async fn fetch_page(&self) -> Result<PageResponse, ExtractorError> {
        self.fetch(&self.url).await
    }
}

#[async_trait]
pub trait PlatformExtractor: Send + Sync {
    fn get_extractor(&self) -> &Extractor;

    async fn extract(&self) -> Result<VideoDescriptor, ExtractorError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingFetcher {
        seen: Mutex<Vec<HeaderMap>>,
    }

    #[async_trait]
    impl PageFetcher for RecordingFetcher {
        async fn fetch(
            &self,
            _url: &str,
            headers: HeaderMap,
        ) -> Result<PageResponse, ExtractorError> {
            self.seen.lock().push(headers);
            Ok(PageResponse {
                status: 200,
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn sends_accept_referer_agent_and_session_cookies() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let session = SessionState::new();
        let mut extractor = Extractor::new(
            "Test",
            "https://example.com/video/42",
            fetcher.clone(),
            session.clone(),
        );
        extractor.set_referer("https://player.example.com/");

        extractor.fetch_page().await.unwrap();
        session.store_set_cookies(&["vuid=1; Path=/"]);
        extractor.fetch_page().await.unwrap();

        let seen = fetcher.seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0]["accept"], "*/*");
        assert_eq!(seen[0]["referer"], "https://player.example.com/");
        assert_eq!(seen[0]["user-agent"], DEFAULT_UA);
        assert!(seen[0].get("cookie").is_none());
        assert_eq!(seen[1]["cookie"], "vuid=1");
    }

    #[test]
    fn invalid_headers_are_skipped() {
        let mut extractor = Extractor::new(
            "Test",
            "https://example.com",
            Arc::new(RecordingFetcher::default()),
            SessionState::new(),
        );
        extractor.add_header_str("bad header", "x");
        extractor.add_header_str("x-ok", "bad\nvalue");
        extractor.add_header_str("x-ok", "fine");

        let headers = extractor.get_platform_headers();
        assert_eq!(headers["x-ok"], "fine");
        assert_eq!(headers.len(), 3);
    }
}
