//! vodgrab library crate.
//!
//! Acquires a video published through an embedded player configuration:
//! the page is fetched and parsed (with challenge handling and retries),
//! then the selected stream is copied to a local file by ffmpeg while
//! progress events flow to a caller-owned sink.

pub mod config;
pub mod downloader;
pub mod error;
pub mod logging;
pub mod utils;

pub use error::{Error, Result};
