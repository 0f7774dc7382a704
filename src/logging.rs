//! Logging setup for tidyframe.
//!
//! Logs go to the console and to two daily-rotated files in the platform data
//! directory:
//!
//! - `tidyframe.<date>.log`: everything the env filter lets through
//! - `error.<date>.log`: warnings and errors only
//!
//! ```no_run
//! tidyframe::logging::init().expect("Failed to initialize logging");
//! tracing::info!("ready");
//! ```
//!
//! The default level is `info`; `RUST_LOG` overrides it.

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

const APP_DIR: &str = "tidyframe";
const MAX_LOG_FILES: usize = 10;

/// `<data_dir>/tidyframe/logs`, created if missing.
///
/// - Linux: `~/.local/share/tidyframe/logs`
/// - macOS: `~/Library/Application Support/tidyframe/logs`
/// - Windows: `%APPDATA%/tidyframe/logs`
pub fn get_log_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir().context("Failed to determine data directory")?;
    let log_dir = log_dir_under(&base_dir);

    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    Ok(log_dir)
}

fn log_dir_under(base: &Path) -> PathBuf {
    base.join(APP_DIR).join("logs")
}

/// Installs the global subscriber writing to the platform log directory.
pub fn init() -> Result<()> {
    init_with_dir(&get_log_dir()?)
}

/// Installs the global subscriber writing its files under `log_dir`.
///
/// # Errors
///
/// Fails if the file appenders cannot be created or a global subscriber is
/// already installed.
pub fn init_with_dir(log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let all_logs_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(APP_DIR)
        .filename_suffix("log")
        .build(log_dir)
        .context("Failed to create all-logs file appender")?;

    let error_logs_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix("error")
        .filename_suffix("log")
        .build(log_dir)
        .context("Failed to create error-logs file appender")?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Failed to create env filter")?;

    // stderr keeps stdout clean for JSON printed by the CLI
    let console_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    let all_logs_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(all_logs_appender);

    let error_logs_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(error_logs_appender)
        .with_filter(EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(all_logs_layer)
        .with(error_logs_layer)
        .try_init()
        .context("Failed to install global tracing subscriber")?;

    tracing::info!(log_dir = %log_dir.display(), "Logging initialized");
    Ok(())
}
