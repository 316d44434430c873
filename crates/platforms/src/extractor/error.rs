use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("unexpected http status {status} for {url}")]
    HttpStatus { status: u16, url: String },
    #[error("player config script not found in page")]
    ScriptNotFound,
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("no streams found")]
    NoStreamsFound,
    #[error("session challenge not resolved: {0}")]
    Challenge(Box<ExtractorError>),
}

impl ExtractorError {
    /// Whether a later attempt against the same page may succeed.
    ///
    /// A failed challenge round-trip and a malformed source URL are final.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Challenge(_) | Self::InvalidUrl(_))
    }

    /// Network or transport failure, as opposed to a page that loaded but
    /// did not contain what we need.
    pub fn is_fetch_error(&self) -> bool {
        matches!(self, Self::HttpError(_) | Self::HttpStatus { .. })
    }

    pub fn is_challenge(&self) -> bool {
        matches!(self, Self::Challenge(_))
    }
}
