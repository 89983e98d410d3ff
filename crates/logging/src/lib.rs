//! Logging initialization for the ckg binaries.
//!
//! Modes:
//! - CLI mode: human-readable logs on STDOUT.
//! - ServerForeground mode: STDERR plus a rolling file, so a supervising process can tail either.
//! - ServerBackground mode: JSON lines to a rolling file only.
//! - DataStdout mode: no subscriber at all, STDOUT carries command output.
//!
//! Files live in `<data dir>/logs/ckg.log`. They roll over at 5 MB, rotated files
//! are compressed and at most 20 are kept.

use anyhow::Result;
use file_rotate::{ContentLimit, FileRotate, compression::Compression, suffix::AppendCount};
use slice_manager::DataDirectory;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt::writer::MakeWriterExt};

const LOG_FILE_NAME: &str = "ckg.log";
const MAX_LOG_FILE_BYTES: usize = 5 * 1024 * 1024;
const MAX_ROTATED_FILES: usize = 20;

pub enum LogMode {
    Cli,
    ServerForeground,
    ServerBackground,
    DataStdout,
}

/// Guard that keeps background logging workers alive.
pub struct LoggingGuards {
    _guards: Vec<WorkerGuard>,
}

fn env_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

fn rolling_file(logs_dir: &Path) -> FileRotate<AppendCount> {
    FileRotate::new(
        logs_dir.join(LOG_FILE_NAME),
        AppendCount::new(MAX_ROTATED_FILES),
        ContentLimit::Bytes(MAX_LOG_FILE_BYTES),
        Compression::OnRotate(1),
        None,
    )
}

/// Initialize logging with files under the system data directory
pub fn init(mode: LogMode, verbose: bool) -> Result<Option<LoggingGuards>> {
    match mode {
        LogMode::ServerForeground | LogMode::ServerBackground => {
            let data_directory = DataDirectory::new_system_default()?;
            init_with_logs_dir(mode, verbose, &data_directory.logs_dir)
        }
        LogMode::Cli | LogMode::DataStdout => init_with_logs_dir(mode, verbose, Path::new("")),
    }
}

/// Initialize logging, writing server log files to `logs_dir`
pub fn init_with_logs_dir(
    mode: LogMode,
    verbose: bool,
    logs_dir: &Path,
) -> Result<Option<LoggingGuards>> {
    let filter = env_filter(verbose);

    match mode {
        LogMode::Cli => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .init();
            Ok(None)
        }
        LogMode::ServerForeground => {
            let (file_non_blocking, file_guard) =
                tracing_appender::non_blocking(rolling_file(logs_dir));
            // Nobody may be draining stderr; cap the buffer and drop overflow
            let (stderr_non_blocking, stderr_guard) = NonBlockingBuilder::default()
                .lossy(true)
                .buffered_lines_limit(10_000)
                .finish(std::io::stderr());

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(
                    file_non_blocking
                        .with_max_level(tracing::Level::INFO)
                        .and(stderr_non_blocking),
                )
                .with_ansi(false)
                .init();

            Ok(Some(LoggingGuards {
                _guards: vec![file_guard, stderr_guard],
            }))
        }
        LogMode::ServerBackground => {
            let (non_blocking, guard) = tracing_appender::non_blocking(rolling_file(logs_dir));

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(non_blocking.with_max_level(tracing::Level::INFO))
                .with_ansi(false)
                .json()
                .init();

            Ok(Some(LoggingGuards {
                _guards: vec![guard],
            }))
        }
        LogMode::DataStdout => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_rolling_file_lands_in_logs_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = rolling_file(dir.path());
        writer.write_all(b"started\n").unwrap();
        writer.flush().unwrap();

        let content = std::fs::read_to_string(dir.path().join(LOG_FILE_NAME)).unwrap();
        assert_eq!(content, "started\n");
    }

    #[test]
    fn test_verbose_overrides_environment() {
        assert_eq!(env_filter(true).to_string(), "debug");
    }

    #[test]
    fn test_data_stdout_installs_nothing() {
        let guards = init_with_logs_dir(LogMode::DataStdout, false, Path::new("")).unwrap();
        assert!(guards.is_none());
    }
}
