//! Download engine trait and related types.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::Result;
use crate::downloader::progress::ProgressReporter;

/// One stream-to-file transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Manifest URL (HLS or DASH).
    pub url: String,
    /// Destination file. Replaced if it already exists.
    pub output_path: PathBuf,
    /// Media length used to turn elapsed time into a percentage.
    pub expected_duration_secs: u64,
}

impl DownloadRequest {
    pub fn new(
        url: impl Into<String>,
        output_path: impl Into<PathBuf>,
        expected_duration_secs: u64,
    ) -> Self {
        Self {
            url: url.into(),
            output_path: output_path.into(),
            expected_duration_secs,
        }
    }
}

/// Trait for download engines.
///
/// An engine reports through the given [`ProgressReporter`] and must finish
/// it: `Complete` on success, `Error` on every failure path, including
/// cancellation and a binary that cannot be started.
#[async_trait]
pub trait DownloadEngine: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &'static str;

    /// Copy `request.url` into `request.output_path`, returning once the
    /// transfer has ended.
    async fn download(
        &self,
        request: &DownloadRequest,
        reporter: &mut ProgressReporter<'_>,
        token: &CancellationToken,
    ) -> Result<()>;

    /// Version string of the underlying tool.
    async fn version(&self) -> Result<String>;
}
