//! Download engine abstraction.
//!
//! [`DownloadEngine`] turns a stream URL into a local file while reporting
//! progress; [`FfmpegEngine`] is the implementation used by the acquirer.

mod ffmpeg;
mod traits;
pub mod utils;

pub use ffmpeg::{FfmpegConfig, FfmpegEngine};
pub use traits::{DownloadEngine, DownloadRequest};
