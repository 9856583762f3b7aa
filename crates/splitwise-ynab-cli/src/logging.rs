use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const LOG_FILE_NAME: &str = "splitwise-ynab.log";

/// Events under this target go to the log file only.
pub const ABORT_TARGET: &str = "splitwise_ynab::abort";

/// The log file to use when none is given: next to the config file.
pub fn default_log_file(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|dir| dir.join(LOG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(LOG_FILE_NAME))
}

/// Full trace appended to `log_file`, warnings and errors on stderr.
///
/// The file filter is taken from `RUST_LOG` and defaults to debug output
/// for all of our crates.
pub fn init(log_file: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file: {}", log_file.display()))?;

    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "splitwise_ynab=debug".into());
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .with_filter(file_filter);

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(
            Targets::new()
                .with_default(LevelFilter::WARN)
                .with_target(ABORT_TARGET, LevelFilter::OFF),
        );

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}
