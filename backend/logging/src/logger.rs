//! Structured Logger
//!
//! Wraps `tracing` to provide console output, an optional daily-rolling NDJSON
//! file, and environment-based level control.

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log file prefix inside the log directory.
const LOG_FILE_PREFIX: &str = "plugboard.log";

/// Initialize the global logger.
///
/// `RUST_LOG` overrides `level`. With `json` the console prints JSON lines,
/// otherwise compact human-readable output. When `log_dir` is set a second
/// layer writes NDJSON to `plugboard.log.YYYY-MM-DD` there. Calling this twice
/// is harmless; the first subscriber stays installed.
pub fn init_logger(log_dir: Option<&Path>, level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(true)
            .boxed()
    };

    let file_layer = log_dir.map(|dir| {
        let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
        fmt::layer()
            .json()
            .with_writer(file_appender)
            .with_ansi(false)
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
}
