//! Logging system initialization
//!
//! Sets up tracing-based logging with file output to `<log dir>/island.log`
//! and rotation on every startup, keeping the previous nine sessions.
//! `--verbose` runs add a compact stderr layer on top of the file.

use crate::config::LoggingConfig;
use crate::error::{IslandError, Result, StringError};
use crate::utils::paths;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Maximum number of historical log files to keep (island.log.1 through island.log.9)
const MAX_LOG_FILES: u8 = 9;

const LOG_FILE_PREFIX: &str = "island";
const LOG_FILE_SUFFIX: &str = "log";

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over `config.filter`; an unparsable filter
/// falls back to `info`. When `config.log_to_file` is off and `verbose` is
/// not set, events are filtered but written nowhere.
pub fn init_logging(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = if config.log_to_file {
        let log_dir = paths::log_dir();
        std::fs::create_dir_all(&log_dir)?;
        rotate_logs_on_startup(&log_dir.join(format!("{LOG_FILE_PREFIX}.{LOG_FILE_SUFFIX}")))?;

        // Rotation happens above, once per session
        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(LOG_FILE_PREFIX)
            .filename_suffix(LOG_FILE_SUFFIX)
            .build(&log_dir)
            .map_err(|e| IslandError::ConfigError(Box::new(e)))?;

        Some(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
    } else {
        None
    };

    let stderr_layer = verbose.then(|| {
        fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| IslandError::ConfigError(Box::new(e)))?;

    tracing::info!("Island v{} started", env!("CARGO_PKG_VERSION"));

    Ok(())
}

/// Rotate log files on startup
///
/// - island.log.9 is deleted
/// - island.log.N -> island.log.N+1 for N in 8..=1
/// - island.log -> island.log.1
///
/// The logger then creates a fresh island.log.
fn rotate_logs_on_startup(log_path: &Path) -> Result<()> {
    if !log_path.exists() {
        return Ok(());
    }

    let log_dir = log_path
        .parent()
        .ok_or_else(|| IslandError::ConfigError(StringError::new("Invalid log path")))?;

    let log_name = log_path
        .file_name()
        .ok_or_else(|| IslandError::ConfigError(StringError::new("Invalid log filename")))?
        .to_string_lossy();

    let oldest_log = log_dir.join(format!("{log_name}.{MAX_LOG_FILES}"));
    if oldest_log.exists() {
        std::fs::remove_file(&oldest_log)?;
    }

    for i in (1..MAX_LOG_FILES).rev() {
        let current_log = log_dir.join(format!("{log_name}.{i}"));
        if current_log.exists() {
            std::fs::rename(&current_log, log_dir.join(format!("{log_name}.{}", i + 1)))?;
        }
    }

    std::fs::rename(log_path, log_dir.join(format!("{log_name}.1")))?;

    Ok(())
}
