//! Top-level acquisition: extract the descriptor, then copy its stream.

use std::path::PathBuf;
use std::sync::Arc;

use platforms_parser::extractor::platforms::Vimeo;
use platforms_parser::extractor::platforms::vimeo::page_url;
use platforms_parser::extractor::{
    ExtractorError, HttpFetcher, PageFetcher, PlatformExtractor, SessionState, build_client,
};
use platforms_parser::media::VideoDescriptor;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::engine::{DownloadEngine, DownloadRequest, FfmpegEngine};
use super::job::AcquisitionJob;
use super::progress::{ProgressReporter, ProgressSink};
use super::resilience::{RetryPolicy, retry_until_ok};
use crate::config::AppConfig;
use crate::{Error, Result};

/// Outcome of a successful acquisition.
#[derive(Debug, Clone)]
pub struct AcquisitionReport {
    pub descriptor: VideoDescriptor,
    /// Extraction attempts it took, the successful one included.
    pub extraction_attempts: u32,
    pub stream_url: String,
    pub output_path: PathBuf,
}

/// Runs acquisitions. Cheap to share; each call is independent apart from
/// the session cookies, which all jobs without their own store share.
pub struct Acquirer {
    fetcher: Arc<dyn PageFetcher>,
    session: SessionState,
    engine: Arc<dyn DownloadEngine>,
    retry: RetryPolicy,
    user_agent: Option<String>,
    default_referer: String,
}

impl Acquirer {
    /// Build the HTTP client, cookie store and ffmpeg engine from `config`.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = build_client(config.extractor.timeout(), config.extractor.proxy.as_deref())
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        let session = SessionState::new();
        if let Some(cookies) = config.extractor.cookies.as_deref() {
            session.set_cookies_from_string(cookies);
        }

        let mut acquirer = Self::from_parts(
            Arc::new(HttpFetcher::new(client)),
            Arc::new(FfmpegEngine::with_config(config.ffmpeg.clone())),
        )
        .with_session(session)
        .with_retry_policy(config.retry.policy())
        .with_default_referer(config.extractor.referer.clone());
        acquirer.user_agent = config.extractor.user_agent.clone();
        Ok(acquirer)
    }

    /// Assemble from explicit collaborators with default policy and a fresh
    /// cookie store.
    pub fn from_parts(fetcher: Arc<dyn PageFetcher>, engine: Arc<dyn DownloadEngine>) -> Self {
        Self {
            fetcher,
            session: SessionState::new(),
            engine,
            retry: RetryPolicy::default(),
            user_agent: None,
            default_referer: Vimeo::BASE_URL.to_string(),
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_engine(mut self, engine: Arc<dyn DownloadEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_session(mut self, session: SessionState) -> Self {
        self.session = session;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_default_referer(mut self, referer: impl Into<String>) -> Self {
        self.default_referer = referer.into();
        self
    }

    /// Cookie store shared by jobs without their own.
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn engine(&self) -> &Arc<dyn DownloadEngine> {
        &self.engine
    }

    /// Extract the descriptor only, retrying like [`acquire`](Self::acquire).
    pub async fn describe(
        &self,
        url: &str,
        referer: Option<&str>,
        token: &CancellationToken,
    ) -> Result<VideoDescriptor> {
        let (descriptor, _) = self.extract(url, referer, &self.session, token).await?;
        Ok(descriptor)
    }

    /// Acquire `job` into `job.output_path`, reporting through `sink`.
    ///
    /// Extraction is retried until it succeeds, fails terminally or `token` is
    /// cancelled; only then is the transcoder started. The sink receives
    /// exactly one `Complete` or `Error` event before this returns.
    pub async fn acquire(
        &self,
        job: AcquisitionJob,
        sink: &dyn ProgressSink,
        token: &CancellationToken,
    ) -> Result<AcquisitionReport> {
        let mut reporter = ProgressReporter::new(sink);
        let result = self.run(&job, &mut reporter, token).await;

        if let Err(err) = &result {
            warn!(url = %job.source_url, error = %err, "Acquisition failed");
            if !reporter.is_finished() {
                reporter.error(err.to_string());
            }
        }
        result
    }

    async fn run(
        &self,
        job: &AcquisitionJob,
        reporter: &mut ProgressReporter<'_>,
        token: &CancellationToken,
    ) -> Result<AcquisitionReport> {
        job.validate()?;
        let session = job.session.as_ref().unwrap_or(&self.session);

        info!(
            url = %job.source_url,
            output = %job.output_path.display(),
            "Starting acquisition"
        );

        let (descriptor, extraction_attempts) = self
            .extract(&job.source_url, job.referer.as_deref(), session, token)
            .await?;

        let (protocol, variant, stream_url) = descriptor
            .preferred_stream()
            .ok_or(ExtractorError::NoStreamsFound)?;
        let stream_url = stream_url.to_string();
        let expected_duration_secs = job.effective_duration(&descriptor);

        info!(
            id = descriptor.id(),
            title = %descriptor.title(),
            %protocol,
            ?variant,
            expected_duration_secs,
            "Stream selected"
        );

        let request = DownloadRequest::new(
            stream_url.clone(),
            job.output_path.clone(),
            expected_duration_secs,
        );
        self.engine.download(&request, reporter, token).await?;

        Ok(AcquisitionReport {
            descriptor,
            extraction_attempts,
            stream_url,
            output_path: job.output_path.clone(),
        })
    }

    async fn extract(
        &self,
        url: &str,
        referer: Option<&str>,
        session: &SessionState,
        token: &CancellationToken,
    ) -> Result<(VideoDescriptor, u32)> {
        let page = page_url(url)?;
        let referer = referer.unwrap_or(&self.default_referer);

        let mut vimeo = Vimeo::new(page, referer, self.fetcher.clone(), session.clone());
        if let Some(user_agent) = self.user_agent.as_deref() {
            vimeo = vimeo.with_user_agent(user_agent);
        }
        let vimeo = &vimeo;

        let mut attempts = 0;
        let descriptor = retry_until_ok(&self.retry, token, |attempt| {
            attempts = attempt;
            async move {
                debug!(attempt, url = %vimeo.get_extractor().url, "Extracting player config");
                vimeo.extract().await.map_err(Error::from)
            }
        })
        .await?;

        Ok((descriptor, attempts))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use platforms_parser::extractor::PageResponse;

    use super::*;
    use crate::downloader::progress::ProgressEvent;

    struct NoEngine;

    #[async_trait]
    impl DownloadEngine for NoEngine {
        fn name(&self) -> &'static str {
            "none"
        }

        async fn download(
            &self,
            _request: &DownloadRequest,
            reporter: &mut ProgressReporter<'_>,
            _token: &CancellationToken,
        ) -> Result<()> {
            reporter.complete();
            Ok(())
        }

        async fn version(&self) -> Result<String> {
            Ok("none".to_string())
        }
    }

    struct Pages(Mutex<VecDeque<PageResponse>>);

    #[async_trait]
    impl PageFetcher for Pages {
        async fn fetch(
            &self,
            _url: &str,
            _headers: reqwest::header::HeaderMap,
        ) -> std::result::Result<PageResponse, ExtractorError> {
            Ok(self.0.lock().pop_front().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct Collect(Mutex<Vec<ProgressEvent>>);

    impl ProgressSink for Collect {
        fn send(&self, event: ProgressEvent) {
            self.0.lock().push(event);
        }
    }

    fn acquirer(pages: Vec<PageResponse>) -> Acquirer {
        Acquirer::from_parts(Arc::new(Pages(Mutex::new(pages.into()))), Arc::new(NoEngine))
            .with_retry_policy(RetryPolicy::fixed(std::time::Duration::from_millis(1)))
    }

    #[tokio::test]
    async fn invalid_url_fails_once_without_retrying() {
        let acquirer = acquirer(Vec::new());
        let sink = Collect::default();

        let err = acquirer
            .acquire(
                AcquisitionJob::new("not a url", "out.mp4"),
                &sink,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Parse(ExtractorError::InvalidUrl(_))));
        let events = sink.0.into_inner();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ProgressEvent::Error { .. }));
    }

    #[tokio::test]
    async fn invalid_job_is_reported() {
        let acquirer = acquirer(Vec::new());
        let sink = Collect::default();

        let err = acquirer
            .acquire(
                AcquisitionJob::new("https://vimeo.com/42", "out.mp4").with_expected_duration(0),
                &sink,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(sink.0.lock().len(), 1);
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let acquirer = acquirer(Vec::new());
        let token = CancellationToken::new();
        token.cancel();

        let err = acquirer
            .describe("https://vimeo.com/42", None, &token)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn new_imports_configured_cookies() {
        let mut config = AppConfig::default();
        config.extractor.cookies = Some("vuid=abc; other=1".to_string());

        let acquirer = Acquirer::new(&config).unwrap();
        assert_eq!(acquirer.session().get_cookie("vuid").as_deref(), Some("abc"));
        assert_eq!(acquirer.engine().name(), "ffmpeg");
    }
}
