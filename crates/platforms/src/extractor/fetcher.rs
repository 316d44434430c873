use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, SET_COOKIE};
use tracing::{debug, warn};

use super::error::ExtractorError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A fetched page, whatever its status.
///
/// Non-2xx responses are still returned so the caller can inspect the
/// `Set-Cookie` headers a challenge page carries.
#[derive(Debug, Clone, Default)]
pub struct PageResponse {
    pub status: u16,
    /// Raw `Set-Cookie` header values, in response order.
    pub set_cookies: Vec<String>,
    pub body: String,
}

impl PageResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs the single page GET behind every extraction attempt.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, headers: HeaderMap) -> Result<PageResponse, ExtractorError>;
}

/// [`PageFetcher`] backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn with_default_client() -> Result<Self, ExtractorError> {
        Ok(Self::new(build_client(DEFAULT_TIMEOUT, None)?))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, headers: HeaderMap) -> Result<PageResponse, ExtractorError> {
        let response = self.client.get(url).headers(headers).send().await?;
        let status = response.status().as_u16();

        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_owned)
            .collect::<Vec<_>>();

        let body = response.text().await?;
        debug!(
            status,
            cookies = set_cookies.len(),
            bytes = body.len(),
            "Fetched page {url}"
        );

        Ok(PageResponse {
            status,
            set_cookies,
            body,
        })
    }
}

/// Build the HTTP client used for page fetches.
///
/// An unparsable proxy URL is logged and ignored rather than failing the
/// whole client.
pub fn build_client(timeout: Duration, proxy: Option<&str>) -> Result<Client, ExtractorError> {
    let mut builder = Client::builder().timeout(timeout);

    if let Some(proxy_url) = proxy {
        match reqwest::Proxy::all(proxy_url) {
            Ok(proxy) => builder = builder.proxy(proxy),
            Err(error) => {
                warn!(proxy_url, error = %error, "Invalid proxy URL; connecting directly");
                builder = builder.no_proxy();
            }
        }
    }

    Ok(builder.build()?)
}
