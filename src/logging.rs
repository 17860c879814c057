//! Logging setup for hosts embedding the engine.
//!
//! UI hosts log to a file (stderr may be unavailable or owned by the UI);
//! headless hosts and the test suite log to stderr. Initialization installs
//! the process-wide subscriber, so it is fallible and runs at most once.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tracing_subscriber::EnvFilter;

use crate::error::{Result, SqldeckError};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sqldeck=info"))
}

/// Initializes logging to the given file, truncating previous contents.
///
/// Parent directories are created as needed. Fails when a subscriber is
/// already installed.
pub fn init_file_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| SqldeckError::config(format!("Could not create log directory: {e}")))?;
    }

    let log_file = File::create(path)
        .map_err(|e| SqldeckError::config(format!("Could not create log file: {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(log_file)
        .with_ansi(false)
        .try_init()
        .map_err(|e| SqldeckError::config(format!("Could not install subscriber: {e}")))
}

/// Initializes logging to stderr for headless hosts and tests.
pub fn init_stderr_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .try_init()
        .map_err(|e| SqldeckError::config(format!("Could not install subscriber: {e}")))
}

/// Default log file location: the platform state directory when available,
/// the config directory otherwise, falling back to the temp directory.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        return state_dir.join("sqldeck").join("sqldeck.log");
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("sqldeck").join("sqldeck.log");
    }

    std::env::temp_dir().join("sqldeck.log")
}
