//! Logging and observability helpers.

pub mod sensitive;

pub use sensitive::Sensitive;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use crate::engine::error::{OdmError, OdmResult};

const LOG_FILE_PREFIX: &str = "mongo-odm.log";
const DEFAULT_FILTER: &str = "mongo_odm=info";

/// Subscriber settings. `RUST_LOG` takes precedence over `default_filter`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub default_filter: String,
    pub json: bool,
    /// Write daily-rotated files here instead of stderr.
    pub directory: Option<PathBuf>,
    pub retention_days: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_filter: DEFAULT_FILTER.to_string(),
            json: false,
            directory: None,
            retention_days: 14,
        }
    }
}

/// Installs the global tracing subscriber. Later calls are no-ops.
///
/// If the log directory cannot be used, logs go to stderr and a warning is
/// emitted once the subscriber is up.
pub fn init_tracing(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE);

    let mut file_error = None;
    let file_appender = config
        .directory
        .as_deref()
        .and_then(|dir| match open_log_file(dir, config.retention_days) {
            Ok(appender) => Some(appender),
            Err(e) => {
                file_error = Some(e);
                None
            }
        });

    let installed = match (file_appender, config.json) {
        (Some(appender), true) => builder
            .with_writer(appender)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .try_init(),
        (Some(appender), false) => builder.with_writer(appender).with_ansi(false).try_init(),
        (None, true) => builder
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .try_init(),
        (None, false) => builder.with_writer(std::io::stderr).try_init(),
    };

    if installed.is_ok() {
        if let Some(e) = file_error {
            tracing::warn!("File logging disabled, writing to stderr: {}", e);
        }
        tracing::debug!(directory = ?config.directory, "Tracing initialized");
    }
}

/// Creates `dir` if needed, prunes expired files and opens a daily-rotated appender
fn open_log_file(dir: &Path, retention_days: u64) -> OdmResult<RollingFileAppender> {
    fs::create_dir_all(dir).map_err(|e| {
        OdmError::configuration(format!("Cannot create log directory {}: {}", dir.display(), e))
    })?;

    if let Err(e) = cleanup_old_logs(dir, retention_days) {
        eprintln!("Failed to clean up old logs: {}", e);
    }

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(dir)
        .map_err(|e| {
            OdmError::configuration(format!("Cannot open log file in {}: {}", dir.display(), e))
        })
}

fn cleanup_old_logs(log_dir: &Path, retention_days: u64) -> std::io::Result<usize> {
    let now = SystemTime::now();
    let retention = Duration::from_secs(retention_days * 24 * 60 * 60);
    let mut removed = 0;

    for entry in fs::read_dir(log_dir)? {
        let path = entry?.path();

        let is_ours = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with(LOG_FILE_PREFIX))
            .unwrap_or(false);
        if !is_ours {
            continue;
        }

        let age = fs::metadata(&path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok());

        if matches!(age, Some(age) if age > retention) {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => eprintln!("Failed to remove old log file {:?}: {}", path, e),
            }
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_defaults_from_empty_json() {
        let config: LoggingConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.default_filter, "mongo_odm=info");
        assert!(!config.json);
        assert!(config.directory.is_none());
        assert_eq!(config.retention_days, 14);
    }

    #[test]
    fn test_cleanup_keeps_fresh_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mongo-odm.log.2026-10-01"), "fresh").unwrap();
        fs::write(dir.path().join("other.log"), "not ours").unwrap();

        let removed = cleanup_old_logs(dir.path(), 14).unwrap();
        assert_eq!(removed, 0);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_cleanup_with_zero_retention_removes_our_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mongo-odm.log.2026-10-01"), "old").unwrap();
        fs::write(dir.path().join("other.log"), "not ours").unwrap();
        std::thread::sleep(Duration::from_millis(20));

        let removed = cleanup_old_logs(dir.path(), 0).unwrap();
        assert_eq!(removed, 1);
        assert!(dir.path().join("other.log").exists());
    }

    #[test]
    fn test_open_log_file_in_fresh_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("logs").join("odm");

        open_log_file(&nested, 14).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_unusable_log_directory_is_an_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let below_a_file = file.path().join("logs");

        let err = open_log_file(&below_a_file, 14).unwrap_err();
        assert!(matches!(err, OdmError::Configuration { .. }));
    }

    #[test]
    fn test_init_tracing_falls_back_instead_of_panicking() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = LoggingConfig {
            directory: Some(file.path().join("logs")),
            ..LoggingConfig::default()
        };

        init_tracing(&config);
        init_tracing(&config);
    }
}
