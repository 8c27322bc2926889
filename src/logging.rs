use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FILE_PREFIX: &str = "footprint.log";

/// Install the global subscriber. `RUST_LOG` overrides the `info` default.
///
/// With a log directory, events go to a daily rolling file; keep the returned
/// guard alive until exit so buffered lines are flushed.
pub fn init(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_dir {
        Some(dir) => {
            let file_appender = rolling::daily(dir, LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            fmt()
                .with_env_filter(filter)
                .with_writer(non_blocking)
                .with_ansi(false) // no color codes in file
                .init();
            Some(guard)
        }
        None => {
            fmt().with_env_filter(filter).init();
            None
        }
    }
}
