//! Application-wide error types.

use std::path::{Path, PathBuf};

use platforms_parser::extractor::ExtractorError;
use thiserror::Error;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    /// The player page could not be fetched.
    #[error("Fetch error: {0}")]
    Fetch(#[source] ExtractorError),

    /// A session challenge was answered once and the page still failed.
    #[error("Challenge error: {0}")]
    Challenge(#[source] ExtractorError),

    /// The page loaded but did not carry a usable player config.
    #[error("Parse error: {0}")]
    Parse(#[source] ExtractorError),

    #[error("Failed to start {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("process exited with code {code}")]
    Process { code: i32 },

    #[error("Acquisition cancelled")]
    Cancelled,

    #[error("IO error while {op} {}: {source}", .path.display())]
    IoPath {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ExtractorError> for Error {
    fn from(error: ExtractorError) -> Self {
        if error.is_challenge() {
            Self::Challenge(error)
        } else if error.is_fetch_error() {
            Self::Fetch(error)
        } else {
            Self::Parse(error)
        }
    }
}

impl Error {
    pub fn io_path(op: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::IoPath {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Whether extraction should be attempted again after this error.
    ///
    /// Only page fetch and page parse failures qualify; an invalid source URL
    /// is classified as a parse failure but can never succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch(e) | Self::Parse(e) => e.is_retryable(),
            _ => false,
        }
    }
}
