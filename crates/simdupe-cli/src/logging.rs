use std::env;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LEVEL: &str = "info";
const DEFAULT_LOG_FILE: &str = "./logs/simdupe.log";

/// Split a log file path into the directory the appender writes to and the
/// file name inside it.
fn log_target(path: &str) -> (PathBuf, PathBuf) {
    let path = Path::new(path);
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file = path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("simdupe.log"));
    (dir, file)
}

/// Human-readable events on stderr, plain events in the log file.
///
/// `TRACING_LEVEL` takes an `EnvFilter` directive (`simdupe_core=debug`);
/// `LOG_FILE_PATH` names the file. The returned guard flushes the file
/// writer when dropped, so `main` holds it until exit.
pub fn init_logger() -> WorkerGuard {
    let filter = env::var("TRACING_LEVEL").unwrap_or_else(|_| DEFAULT_LEVEL.to_string());
    let log_file = env::var("LOG_FILE_PATH").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    let (dir, file) = log_target(&log_file);

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file));

    // stdout carries the report
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .pretty()
                .with_file(false)
                .without_time()
                .with_ansi(true),
        )
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .with(EnvFilter::new(filter))
        .init();

    info!("Logging to stderr and {}", log_file);

    guard
}
