//! Logging initialization for Loft.
//!
//! Uses `tracing` with an `EnvFilter`: the `RUST_LOG` environment variable
//! wins when set, otherwise the configured level applies.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::Result;

/// Parse a configured level (or directive list) into a filter.
///
/// Unparseable input falls back to `info`.
fn parse_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Build the active filter, preferring `RUST_LOG` over the configured level.
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| parse_filter(level))
}

/// Initialize logging to both stdout and the configured log file.
pub fn init(config: &LoggingConfig) -> Result<()> {
    // Ensure log directory exists
    if let Some(parent) = Path::new(&config.file).parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let log_file = Arc::new(File::create(&config.file)?);

    tracing_subscriber::fmt()
        .with_env_filter(build_filter(&config.level))
        .with_writer(std::io::stdout.and(log_file))
        .with_ansi(false)
        .with_target(true)
        .init();

    Ok(())
}

/// Initialize console-only logging (for development/testing).
pub fn init_console_only(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(level))
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .init();
}
