//! Video acquisition pipeline.
//!
//! - [`resilience`]: fixed-delay, cancellable retry around extraction
//! - [`engine`]: the transcoder that copies the selected stream to disk
//! - [`progress`]: events delivered to the caller's sink
//! - [`acquisition`]: composes extraction and the engine for one job

pub mod acquisition;
pub mod engine;
pub mod job;
pub mod progress;
pub mod resilience;

pub use acquisition::{AcquisitionReport, Acquirer};
pub use engine::{DownloadEngine, DownloadRequest, FfmpegConfig, FfmpegEngine};
pub use job::{AcquisitionJob, DEFAULT_EXPECTED_DURATION_SECS};
pub use progress::{FnSink, ProgressEvent, ProgressReporter, ProgressSink};
pub use resilience::{RetryPolicy, retry_until_ok};
