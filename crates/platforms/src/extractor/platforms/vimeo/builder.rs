use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::{
    extractor::{
        challenge::{AttemptFailure, resolve_with_challenge},
        error::ExtractorError,
        fetcher::PageFetcher,
        platform_extractor::{Extractor, PlatformExtractor},
        platforms::vimeo::models::{PlayerConfig, StreamFiles},
        session::SessionState,
    },
    media::{CdnUrls, Owner, StreamUrls, VideoDescriptor},
};

static SHORT_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"vimeo\.com/(\d+)(?:$|[/?#])").unwrap());
static VIDEO_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"video/(\d+)(?:$|[/?#])").unwrap());
static SCRIPT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>(.*?)</script>").unwrap());

const PLAYER_CONFIG_MARKER: &str = "window.playerConfig =";
const PRIMARY_CDN: &str = "akfire_interconnect_quic";
const ALTERNATE_CDN: &str = "fastly_skyfire";
const USER_AGENT: &str = "Vimeo-Downloader";

/// Rewrite `vimeo.com/<id>` page links to the embeddable player URL.
///
/// Anything else, including URLs already on `player.vimeo.com`, is returned
/// unchanged.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if VIDEO_ID_REGEX.is_match(url) {
        return url.to_string();
    }
    match SHORT_URL_REGEX.captures(url).and_then(|c| c.get(1)) {
        Some(id) => format!("{}video/{}", Vimeo::BASE_URL, id.as_str()),
        None => url.to_string(),
    }
}

/// Normalize `url` and check that it is an absolute http(s) URL.
pub fn page_url(raw: &str) -> Result<String, ExtractorError> {
    let normalized = normalize_url(raw);
    let parsed = url::Url::parse(&normalized)
        .map_err(|e| ExtractorError::InvalidUrl(format!("{raw}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" if parsed.has_host() => Ok(normalized),
        scheme => Err(ExtractorError::InvalidUrl(format!(
            "{raw}: unsupported scheme {scheme:?}"
        ))),
    }
}

/// Numeric id from a `.../video/<id>` URL.
pub fn video_id_from_url(url: &str) -> Option<u64> {
    VIDEO_ID_REGEX
        .captures(url)
        .and_then(|c| c.get(1))
        .and_then(|id| id.as_str().parse().ok())
}

/// Private video pages on Vimeo's embeddable player.
///
/// Stream URLs are only published through the `window.playerConfig` object
/// injected into one of the page's script elements.
pub struct Vimeo {
    pub extractor: Extractor,
}

impl Vimeo {
    pub const BASE_URL: &str = "https://player.vimeo.com/";

    pub fn new(
        url: impl Into<String>,
        referer: &str,
        fetcher: Arc<dyn PageFetcher>,
        session: SessionState,
    ) -> Self {
        let mut extractor = Extractor::new("Vimeo", url, fetcher, session);
        extractor.set_referer(referer);
        extractor.set_user_agent(USER_AGENT);
        Self { extractor }
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.extractor.set_user_agent(user_agent);
        self
    }

    /// Text of the first script element carrying the player config, with the
    /// assignment marker and trailing `;` removed.
    pub fn extract_player_config(body: &str) -> Result<&str, ExtractorError> {
        SCRIPT_REGEX
            .captures_iter(body)
            .filter_map(|captures| captures.get(1))
            .map(|m| m.as_str())
            .find_map(|script| {
                script
                    .find(PLAYER_CONFIG_MARKER)
                    .map(|start| &script[start + PLAYER_CONFIG_MARKER.len()..])
            })
            .map(|payload| {
                let payload = payload.trim();
                payload.strip_suffix(';').unwrap_or(payload).trim_end()
            })
            .filter(|payload| !payload.is_empty())
            .ok_or(ExtractorError::ScriptNotFound)
    }

    /// Parse a whole player page into a descriptor.
    pub fn parse_page(body: &str) -> Result<VideoDescriptor, ExtractorError> {
        let payload = Self::extract_player_config(body)?;
        let config: PlayerConfig = serde_json::from_str(payload)?;
        Self::build_descriptor(config)
    }

    fn cdn_urls(files: Option<&StreamFiles>) -> CdnUrls {
        let Some(files) = files else {
            return CdnUrls::default();
        };

        let lookup = |name: &str| {
            files
                .cdns
                .get(name)
                .and_then(|cdn| cdn.best_url())
                .map(str::to_string)
        };

        let primary = lookup(PRIMARY_CDN).or_else(|| {
            files
                .default_cdn
                .as_deref()
                .filter(|name| *name != ALTERNATE_CDN)
                .and_then(lookup)
        });

        CdnUrls {
            primary,
            alternate: lookup(ALTERNATE_CDN),
        }
    }

    fn build_descriptor(config: PlayerConfig) -> Result<VideoDescriptor, ExtractorError> {
        let files = &config.request.files;
        let streams = StreamUrls {
            hls: Self::cdn_urls(files.hls.as_ref()),
            dash: Self::cdn_urls(files.dash.as_ref()),
        };

        let qualities = files
            .dash
            .iter()
            .flat_map(|dash| dash.streams.iter())
            .filter_map(|stream| stream.quality.clone())
            .collect::<Vec<_>>();

        let video = config.video;
        let owner = video
            .owner
            .map(|owner| Owner {
                id: owner.id.unwrap_or_default(),
                name: owner.name.unwrap_or_default(),
            })
            .unwrap_or_default();
        let duration_secs = video.duration.unwrap_or_default().max(0.0).round() as u64;

        debug!(
            id = video.id,
            duration_secs,
            qualities = qualities.len(),
            "Parsed player config"
        );

        VideoDescriptor::new(
            video.id,
            video.title.unwrap_or_default(),
            duration_secs,
            video.width.unwrap_or_default(),
            video.height.unwrap_or_default(),
            qualities,
            video.thumbs,
            owner,
            streams,
        )
    }

    async fn attempt(&self) -> Result<VideoDescriptor, AttemptFailure> {
        let response = self.extractor.fetch_page().await?;

        let result = if response.is_success() {
            Self::parse_page(&response.body)
        } else {
            Err(ExtractorError::HttpStatus {
                status: response.status,
                url: self.extractor.url.clone(),
            })
        };

        result.map_err(|error| AttemptFailure::new(error, response.set_cookies))
    }

    pub async fn get_video_info(&self) -> Result<VideoDescriptor, ExtractorError> {
        resolve_with_challenge(self.extractor.session(), || self.attempt()).await
    }
}

#[async_trait]
impl PlatformExtractor for Vimeo {
    fn get_extractor(&self) -> &Extractor {
        &self.extractor
    }

    async fn extract(&self) -> Result<VideoDescriptor, ExtractorError> {
        self.get_video_info().await
    }
}
