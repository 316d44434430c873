//! Logging setup: console output, optional rolling log files, local timestamps.
//!
//! Filter precedence, highest first: `-q`, `-v`, `RUST_LOG`, the configured
//! directive, [`DEFAULT_LOG_FILTER`].

use std::path::Path;

use chrono::{Local, Utc};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::Writer, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::{Error, Result};

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "vodgrab=info,platforms_parser=info";

/// Prefix of the daily log files (`vodgrab.log.YYYY-MM-DD`).
const LOG_FILE_PREFIX: &str = "vodgrab.log";

/// Log retention period in days.
pub const LOG_RETENTION_DAYS: i64 = 7;

/// Timestamps in the local timezone.
#[derive(Debug, Clone, Copy)]
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// What the command line and config file ask of the logger.
#[derive(Debug, Clone, Default)]
pub struct LogOptions<'a> {
    /// Number of `-v` flags.
    pub verbose: u8,
    pub quiet: bool,
    /// Directive from the config file.
    pub filter: Option<&'a str>,
    /// Directory for rolling log files.
    pub dir: Option<&'a Path>,
}

/// Pick the filter directive for the given options and `RUST_LOG` value.
pub fn filter_directive(options: &LogOptions<'_>, rust_log: Option<&str>) -> String {
    if options.quiet {
        return "error".to_string();
    }
    match options.verbose {
        0 => {}
        1 => return "vodgrab=debug,platforms_parser=debug,process_utils=debug".to_string(),
        _ => return "trace".to_string(),
    }

    rust_log
        .or(options.filter)
        .map(str::trim)
        .filter(|directive| !directive.is_empty())
        .unwrap_or(DEFAULT_LOG_FILTER)
        .to_string()
}

/// Install the global subscriber.
///
/// Console output goes to stderr so stdout stays free for machine-readable
/// output. When a log directory is configured, a daily rolling file layer is
/// added; keep the returned guard alive until exit so buffered lines are
/// flushed.
pub fn init_logging(options: &LogOptions<'_>) -> Result<Option<WorkerGuard>> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = filter_directive(options, rust_log.as_deref());
    let filter = EnvFilter::try_new(&directive)
        .map_err(|e| Error::config(format!("Invalid log filter {directive:?}: {e}")))?;

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(options.verbose > 0)
        .with_timer(LocalTimer);

    let (file_layer, guard) = match options.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .map_err(|e| Error::io_path("creating log directory", dir, e))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_timer(LocalTimer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::config(format!("Failed to set global default subscriber: {e}")))?;

    debug!(filter = %directive, "Logging initialized");
    Ok(guard)
}

/// Delete rolled log files older than `retention_days`.
///
/// Returns how many files were removed.
pub async fn cleanup_old_logs(log_dir: &Path, retention_days: i64) -> std::io::Result<usize> {
    let cutoff = (Utc::now() - chrono::Duration::days(retention_days)).date_naive();

    let mut entries = tokio::fs::read_dir(log_dir).await?;
    let mut deleted_count = 0;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let Some(date_str) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|name| name.strip_prefix(LOG_FILE_PREFIX))
            .and_then(|rest| rest.strip_prefix('.'))
        else {
            continue;
        };

        let Ok(file_date) = chrono::NaiveDate::parse_from_str(date_str, "%Y-%m-%d") else {
            continue;
        };

        if file_date < cutoff {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    deleted_count += 1;
                    debug!(path = %path.display(), "Deleted old log file");
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to delete old log file"),
            }
        }
    }

    if deleted_count > 0 {
        info!(count = deleted_count, "Cleaned up old log files");
    }

    Ok(deleted_count)
}
