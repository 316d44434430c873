//! FFmpeg download engine implementation.

use std::collections::VecDeque;
use std::process::Stdio;

use async_trait::async_trait;
use process_utils::OutputRecordReader;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::traits::{DownloadEngine, DownloadRequest};
use super::utils::{kill_and_reap, parse_status_line, percentage, prepare_output_file, wait_or_kill};
use crate::downloader::progress::ProgressReporter;
use crate::{Error, Result};

/// Non-status stderr lines kept for the failure log.
const STDERR_TAIL_LINES: usize = 20;

/// FFmpeg engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FfmpegConfig {
    /// Program to run. Looked up on `PATH` unless absolute.
    pub binary_path: String,
    /// Arguments placed before the input, e.g. `["-loglevel", "info"]`.
    pub global_args: Vec<String>,
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
            global_args: Vec::new(),
        }
    }
}

/// FFmpeg-based download engine.
///
/// Remuxes the stream without re-encoding and converts ADTS audio for the
/// MP4 container. Progress is read from the `time=`/`size=` status lines
/// ffmpeg writes to stderr.
#[derive(Debug, Clone, Default)]
pub struct FfmpegEngine {
    config: FfmpegConfig,
}

impl FfmpegEngine {
    /// Create a new FFmpeg engine with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FfmpegConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FfmpegConfig {
        &self.config
    }

    /// Build ffmpeg command arguments, configured global arguments excluded.
    pub fn build_args(&self, request: &DownloadRequest) -> Vec<String> {
        vec![
            "-i".to_string(),
            request.url.clone(),
            "-c".to_string(),
            "copy".to_string(),
            "-bsf:a".to_string(),
            "aac_adtstoasc".to_string(),
            request.output_path.to_string_lossy().to_string(),
        ]
    }

    async fn run(
        &self,
        request: &DownloadRequest,
        reporter: &mut ProgressReporter<'_>,
        token: &CancellationToken,
    ) -> Result<()> {
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        prepare_output_file(&request.output_path).await?;

        let args = self.build_args(request);
        info!(
            url = %request.url,
            output = %request.output_path.display(),
            "Starting ffmpeg download"
        );
        debug!(binary = %self.config.binary_path, ?args, "ffmpeg arguments");

        let mut child = process_utils::tokio_command(&self.config.binary_path)
            .args(&self.config.global_args)
            .args(&args)
            .env("LC_ALL", "C") // Force consistent output
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| Error::Launch {
                program: self.config.binary_path.clone(),
                source,
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Io(std::io::Error::other("ffmpeg stderr was not captured")))?;

        let mut records = OutputRecordReader::new(stderr);
        let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);

        loop {
            let record = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    info!(output = %request.output_path.display(), "Cancelling ffmpeg download");
                    kill_and_reap(&mut child).await;
                    return Err(Error::Cancelled);
                }
                record = records.next_record() => record,
            };

            match record {
                Ok(Some(line)) => {
                    if let Some(status) = parse_status_line(&line) {
                        let pct = percentage(status.elapsed_secs, request.expected_duration_secs);
                        let size = status.size.unwrap_or_default().to_string();
                        if reporter.progress(pct, status.hours_minutes(), size) {
                            trace!(percentage = pct, timecode = status.timecode, "ffmpeg progress");
                        }
                    } else {
                        trace!(line = %line, "ffmpeg");
                        if tail.len() == STDERR_TAIL_LINES {
                            tail.pop_front();
                        }
                        tail.push_back(line);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Error reading ffmpeg output");
                    break;
                }
            }
        }

        // release the pipe so a child still writing to it cannot block on a full buffer
        drop(records);

        let Some(status) = wait_or_kill(&mut child, token).await? else {
            return Err(Error::Cancelled);
        };

        if status.success() {
            info!(output = %request.output_path.display(), "ffmpeg download finished");
            return Ok(());
        }

        // no exit code means the process was killed by a signal
        let code = status.code().unwrap_or(-1);
        warn!(
            code,
            stderr = %tail.iter().map(String::as_str).collect::<Vec<_>>().join("\n"),
            "ffmpeg exited with an error"
        );
        Err(Error::Process { code })
    }
}

#[async_trait]
impl DownloadEngine for FfmpegEngine {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn download(
        &self,
        request: &DownloadRequest,
        reporter: &mut ProgressReporter<'_>,
        token: &CancellationToken,
    ) -> Result<()> {
        let result = self.run(request, reporter, token).await;
        match &result {
            Ok(()) => {
                reporter.complete();
            }
            Err(err) => {
                reporter.error(err.to_string());
            }
        }
        result
    }

    async fn version(&self) -> Result<String> {
        let output = process_utils::tokio_command(&self.config.binary_path)
            .args(&self.config.global_args)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| Error::Launch {
                program: self.config.binary_path.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(Error::Process {
                code: output.status.code().unwrap_or(-1),
            });
        }

        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "empty version output",
                ))
            })
    }
}
