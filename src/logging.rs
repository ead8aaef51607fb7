//! Logging setup, matching the root crate's `main.rs` initialization
//! (`tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env())`),
//! extended with `tracing-appender` since the TUI owns the whole terminal
//! and can't share it with stdout-based log lines while running.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber. Returns the appender's
/// worker guard, which must be held for the lifetime of the process —
/// dropping it early truncates buffered log lines.
pub fn init(log_dir: &Path, debug: bool) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(log_dir, "codewright.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    guard
}
