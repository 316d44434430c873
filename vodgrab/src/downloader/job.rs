//! Per-call acquisition parameters.

use std::path::PathBuf;

use platforms_parser::extractor::SessionState;
use platforms_parser::media::VideoDescriptor;

use crate::{Error, Result};

/// Expected media length when the caller does not know better.
pub const DEFAULT_EXPECTED_DURATION_SECS: u64 = 600;

/// What one acquisition call works on. Created by the caller, consumed by
/// [`Acquirer::acquire`](super::Acquirer::acquire).
#[derive(Debug, Clone)]
pub struct AcquisitionJob {
    /// Player page URL. `vimeo.com/<id>` links are normalized to the player page.
    pub source_url: String,
    /// `Referer` for page requests; the acquirer's default when `None`.
    pub referer: Option<String>,
    pub output_path: PathBuf,
    /// Denominator of the progress percentage.
    pub expected_duration_secs: u64,
    /// Prefer the duration published by the page when it is non-zero.
    pub use_descriptor_duration: bool,
    /// Cookie store for this job only; the acquirer's shared store when `None`.
    pub session: Option<SessionState>,
}

impl AcquisitionJob {
    pub fn new(source_url: impl Into<String>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            source_url: source_url.into(),
            referer: None,
            output_path: output_path.into(),
            expected_duration_secs: DEFAULT_EXPECTED_DURATION_SECS,
            use_descriptor_duration: false,
            session: None,
        }
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    pub fn with_expected_duration(mut self, secs: u64) -> Self {
        self.expected_duration_secs = secs;
        self
    }

    pub fn with_descriptor_duration(mut self, enabled: bool) -> Self {
        self.use_descriptor_duration = enabled;
        self
    }

    /// Use an isolated cookie store instead of the shared one.
    pub fn with_session(mut self, session: SessionState) -> Self {
        self.session = Some(session);
        self
    }

    /// Duration used for percentages once the descriptor is known.
    pub fn effective_duration(&self, descriptor: &VideoDescriptor) -> u64 {
        if self.use_descriptor_duration && descriptor.duration_secs() > 0 {
            descriptor.duration_secs()
        } else {
            self.expected_duration_secs
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.source_url.trim().is_empty() {
            return Err(Error::validation("source URL must not be empty"));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(Error::validation("output path must not be empty"));
        }
        if self.expected_duration_secs == 0 {
            return Err(Error::validation("expected duration must be > 0"));
        }
        Ok(())
    }
}
