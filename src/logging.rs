//!
//! src/logging.rs  Andrew Belles  Oct 19th, 2026
//!
//! Initializes logger so each step of a run prints a timestamped
//! progress line to stdout
//!
//!

use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use tracing_error::ErrorLayer;
use tracing_appender::non_blocking;

use crate::config::{LogFormat, LoggingConfig};
use crate::errors::SyncError;

/// Same layout the sheet uses for dates, plus wall-clock time
pub const LOCAL_TIMESTAMP: &str = "%Y/%m/%d %H:%M:%S";

/// Flushes buffered lines when dropped; hold it until main returns
pub struct LoggingGuard(tracing_appender::non_blocking::WorkerGuard);

pub fn init_logging(cfg: &LoggingConfig) -> Result<LoggingGuard, SyncError> {
    let (writer, guard) = non_blocking(std::io::stdout());
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) => EnvFilter::try_new(directives),
        Err(_) => EnvFilter::try_new(&cfg.filter_directives),
    }
    .map_err(|e| SyncError::Config(format!("invalid log filter: {e}")))?;

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(ErrorLayer::default());

    let installed = match cfg.format {
        LogFormat::Pretty => {
            let time = fmt::time::ChronoLocal::new(LOCAL_TIMESTAMP.to_string());
            let layer = fmt::layer()
                .with_writer(writer)
                .with_timer(time)
                .with_ansi(false)
                .with_target(cfg.include_target)
                .with_file(cfg.include_file_line)
                .with_line_number(cfg.include_file_line);
            registry.with(layer).try_init()
        }
        LogFormat::Json => {
            let time = fmt::time::UtcTime::rfc_3339();
            let layer = fmt::layer()
                .with_writer(writer)
                .with_timer(time)
                .with_target(cfg.include_target)
                .with_file(cfg.include_file_line)
                .with_line_number(cfg.include_file_line)
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_span_list(true);
            registry.with(layer).try_init()
        }
    };
    installed.map_err(|e| SyncError::Config(format!("logger already set: {e}")))?;

    Ok( LoggingGuard(guard) )
}
