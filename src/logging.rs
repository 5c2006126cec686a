//! Tracing subscriber setup.
//!
//! `RUST_LOG` controls the filter (default `macro_pulse=info`). The TUI owns the
//! terminal, so in that mode logs go to a file instead of stderr.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::AppError;

const DEFAULT_FILTER: &str = "macro_pulse=info";

/// Where log lines are written.
#[derive(Debug, Clone, Copy)]
pub enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(target: LogTarget<'_>) -> Result<(), AppError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let result = match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            let file = open_log_file(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };

    // `try_init` only fails when a global subscriber (or `log` logger) is
    // already installed, e.g. by a test harness or an embedding binary.
    match result {
        Ok(()) => Ok(()),
        Err(err) => {
            tracing::debug!(error = %err, "tracing already initialized");
            Ok(())
        }
    }
}

fn open_log_file(path: &Path) -> Result<File, AppError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            let msg = format!("Failed to open log file '{}': {e}", path.display());
            AppError::new(2, msg)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_not_an_error() {
        init(LogTarget::Stderr).unwrap();
        init(LogTarget::Stderr).unwrap();
    }

    #[test]
    fn unwritable_log_file_is_a_usage_error() {
        let path = Path::new("/nonexistent-dir/pulse.log");
        let err = init(LogTarget::File(path)).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
