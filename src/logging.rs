//! File logging. The TUI owns stdout, so tracing only ever writes to disk.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "repo-pilot.log";

/// Install the global subscriber writing to `<log_dir>/repo-pilot.log.<date>`.
///
/// Returns the appender guard; dropping it flushes pending lines. None when
/// the log directory cannot be created (the app still runs, unlogged).
pub fn init(log_dir: &Path) -> Option<WorkerGuard> {
    std::fs::create_dir_all(log_dir).ok()?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy();
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_thread_names(true)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(file_layer).try_init().ok()?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "repo-pilot starting");
    Some(guard)
}
