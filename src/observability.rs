//! Structured logging configuration.
//!
//! Sets up the `tracing` subscriber with:
//! - Configurable log level, overridable through `RUST_LOG`
//! - Plain or JSON output on stdout
//! - An optional non-ANSI log file written from a background thread

use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Registry,
};

use crate::{Error, Result};

/// Initialize tracing.
///
/// When `log_file` is given, every event is also appended to that file. The
/// returned guard flushes the file on drop and must be kept alive for as
/// long as logging is needed.
///
/// # Errors
///
/// Returns a configuration error if the log file cannot be opened.
///
/// # Panics
///
/// Panics if tracing subscriber has already been initialized in this process.
pub fn init_tracing(level: &str, json: bool, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let (writer, guard) = open_log_file(path)?;
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let base = Registry::default().with(env_filter).with(file_layer);

    if json {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true);

        base.with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer().with_target(true);

        base.with(fmt_layer).init();
    }

    tracing::debug!(
        level,
        json,
        log_file = ?log_file.map(Path::display),
        "Tracing initialized"
    );
    Ok(guard)
}

/// Open `path` for appending through a non-blocking writer.
fn open_log_file(path: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::config(format!("invalid log file path: {}", path.display())))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    std::fs::create_dir_all(dir).map_err(|e| {
        Error::config(format!("cannot create log directory {}: {e}", dir.display()))
    })?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(dir)
        .map_err(|e| Error::config(format!("cannot open log file {}: {e}", path.display())))?;

    Ok(tracing_appender::non_blocking(appender))
}
