//! File-based application configuration.
//!
//! Settings come from a TOML file (explicit path, or
//! `<config dir>/vodgrab/config.toml` when present), then environment
//! overrides, then validation. Every field has a default, so an empty or
//! missing file is a valid configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use platforms_parser::extractor::platforms::Vimeo;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::downloader::engine::FfmpegConfig;
use crate::downloader::resilience::RetryPolicy;
use crate::{Error, Result};

/// Overrides `ffmpeg.binary_path`.
pub const ENV_FFMPEG_PATH: &str = "FFMPEG_PATH";
/// Overrides `output_dir`.
pub const ENV_OUTPUT_DIR: &str = "VODGRAB_OUTPUT_DIR";

const DEFAULT_DURATION_SECS: u64 = 600;
const DEFAULT_OUTPUT_DIR: &str = "downloads";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory used when no explicit output path is given.
    pub output_dir: PathBuf,
    /// Expected media duration when the caller supplies none.
    pub default_duration_secs: u64,
    pub extractor: ExtractorConfig,
    pub retry: RetryConfig,
    pub ffmpeg: FfmpegConfig,
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            default_duration_secs: DEFAULT_DURATION_SECS,
            extractor: ExtractorConfig::default(),
            retry: RetryConfig::default(),
            ffmpeg: FfmpegConfig::default(),
            log: LogConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// `User-Agent` for page requests; the platform default when unset.
    pub user_agent: Option<String>,
    /// `Referer` for page requests.
    pub referer: String,
    pub timeout_secs: u64,
    pub proxy: Option<String>,
    /// Cookies in `Cookie` header form, sent with every page request.
    pub cookies: Option<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            referer: Vimeo::BASE_URL.to_string(),
            timeout_secs: 30,
            proxy: None,
            cookies: None,
        }
    }
}

impl ExtractorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Fixed wait between extraction attempts.
    pub delay_ms: u64,
    /// Give up after this many attempts; unbounded when unset.
    pub max_attempts: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            delay_ms: policy.delay.as_millis() as u64,
            max_attempts: policy.max_attempts,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            delay: Duration::from_millis(self.delay_ms),
            max_attempts: self.max_attempts,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive; `RUST_LOG` still wins when set.
    pub filter: Option<String>,
    /// Write daily rolling log files here in addition to the console.
    pub dir: Option<PathBuf>,
}

impl AppConfig {
    /// `<config dir>/vodgrab/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("vodgrab").join("config.toml"))
    }

    /// Load, apply environment overrides and validate.
    ///
    /// An explicit `path` must exist; the default location is only read when
    /// a file is there.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading configuration");
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io_path("reading config file", path, e))?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(e.to_string()))
    }

    /// Apply overrides looked up through `var`, so callers can inject the
    /// environment.
    pub fn apply_env_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = var(ENV_FFMPEG_PATH).filter(|v| !v.is_empty()) {
            self.ffmpeg.binary_path = path;
        }
        if let Some(dir) = var(ENV_OUTPUT_DIR).filter(|v| !v.is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_duration_secs == 0 {
            return Err(Error::validation("default_duration_secs must be > 0"));
        }
        if self.extractor.timeout_secs == 0 {
            return Err(Error::validation("extractor.timeout_secs must be > 0"));
        }
        if self.retry.max_attempts == Some(0) {
            return Err(Error::validation("retry.max_attempts must be > 0 when set"));
        }
        if self.ffmpeg.binary_path.trim().is_empty() {
            return Err(Error::validation("ffmpeg.binary_path must not be empty"));
        }
        Ok(())
    }

    /// Effective configuration rendered as TOML.
    pub fn show(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.default_duration_secs, 600);
        assert_eq!(config.output_dir, PathBuf::from("downloads"));
        assert_eq!(config.extractor.referer, "https://player.vimeo.com/");
        assert_eq!(config.retry.policy().delay, Duration::from_secs(3));
        assert_eq!(config.retry.policy().max_attempts, None);
        config.validate().unwrap();
    }

    #[test]
    fn sections_override_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
output_dir = "/srv/videos"
default_duration_secs = 120

[extractor]
user_agent = "test-agent"
proxy = "http://127.0.0.1:8080"

[retry]
delay_ms = 10
max_attempts = 5

[ffmpeg]
binary_path = "/opt/ffmpeg/bin/ffmpeg"
global_args = ["-loglevel", "info"]

[log]
filter = "vodgrab=debug"
"#,
        )
        .unwrap();

        assert_eq!(config.output_dir, PathBuf::from("/srv/videos"));
        assert_eq!(config.default_duration_secs, 120);
        assert_eq!(config.extractor.user_agent.as_deref(), Some("test-agent"));
        assert_eq!(config.extractor.timeout_secs, 30);
        assert_eq!(config.retry.policy().delay, Duration::from_millis(10));
        assert_eq!(config.retry.policy().max_attempts, Some(5));
        assert_eq!(config.ffmpeg.binary_path, "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(config.ffmpeg.global_args, vec!["-loglevel", "info"]);
        assert_eq!(config.log.filter.as_deref(), Some("vodgrab=debug"));
    }

    #[test]
    fn malformed_toml_is_a_configuration_error() {
        let err = AppConfig::from_toml_str("default_duration_secs = \"ten\"").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn env_overrides_take_precedence() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| match key {
            ENV_FFMPEG_PATH => Some("/usr/local/bin/ffmpeg".to_string()),
            ENV_OUTPUT_DIR => Some("/data".to_string()),
            _ => None,
        });
        assert_eq!(config.ffmpeg.binary_path, "/usr/local/bin/ffmpeg");
        assert_eq!(config.output_dir, PathBuf::from("/data"));
    }

    #[test]
    fn validation_rejects_zero_values() {
        let mut config = AppConfig::default();
        config.default_duration_secs = 0;
        assert!(matches!(config.validate(), Err(Error::Validation(_))));

        let mut config = AppConfig::default();
        config.retry.max_attempts = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_duration_secs = 42\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.default_duration_secs, 42);

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            AppConfig::load(Some(&missing)),
            Err(Error::IoPath { .. })
        ));
    }

    #[test]
    fn show_round_trips_through_toml() {
        let rendered = AppConfig::default().show().unwrap();
        assert!(rendered.contains("default_duration_secs = 600"));
        AppConfig::from_toml_str(&rendered).unwrap();
    }
}
