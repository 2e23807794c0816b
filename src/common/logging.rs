//! Logging and tracing configuration
//!
//! Every run logs to stderr; when a log file is available it also gets a
//! full copy, like the per-run log the workbook runner has always kept.

use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset
const DEFAULT_FILTER: &str = "apitest=info,warn";

/// Initialize tracing for a run
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// When `log_file` is set (or the default log path can be created), a file
/// layer is added. The returned guard must be held until exit so buffered
/// file output is flushed.
pub fn init(log_file: Option<&Path>) -> Option<(PathBuf, WorkerGuard)> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let target = log_file
        .map(Path::to_path_buf)
        .or_else(super::paths::default_log_file);

    if let Some(path) = target {
        match open_log_file(&path) {
            Ok(file) => {
                let (writer, guard) = tracing_appender::non_blocking(file);
                let file_layer = fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false);

                tracing_subscriber::registry()
                    .with(filter)
                    .with(stderr_layer)
                    .with(file_layer)
                    .init();

                return Some((path, guard));
            }
            Err(e) => {
                eprintln!("Warning: Could not open log file {}: {}", path.display(), e);
            }
        }
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .init();

    None
}

/// Initialize stderr-only tracing, for commands that do not run cases
pub fn init_stderr() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false).compact())
        .init();
}

/// Open (truncating) the log file, creating its directory
fn open_log_file(path: &Path) -> std::io::Result<std::fs::File> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
}
