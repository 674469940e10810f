//! # Observability
//!
//! Centralized tracing initialization for the dashboard binaries.
//!
//! ## Logging Architecture
//! - **stdout**: WARN only (the TUI owns the terminal; anything chattier
//!   would paint over the alternate screen)
//! - **file**: INFO for routedeck crates, WARN for deps (daily rotation
//!   under `logs/`)
//! - **RUST_LOG**: honored for file logs only; stdout stays bounded to WARN

use std::{fs, path::Path};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Guards that must be held for the lifetime of the process.
/// Dropping this will cause buffered logs to be lost.
pub struct TracingGuards {
    _file_guard: WorkerGuard,
}

fn ensure_logs_dir() {
    let dir = Path::new("logs");
    if !dir.exists() {
        // Best effort: if this fails, stdout logging still works.
        let _ = fs::create_dir_all(dir);
    }
}

/// Initializes tracing with bounded stdout and rotated file logs.
///
/// Returns `TracingGuards`, which must be held for the lifetime of the
/// process or buffered file logs may be lost.
pub fn init_tracing(service_name: &str) -> TracingGuards {
    ensure_logs_dir();

    let file_appender =
        tracing_appender::rolling::daily("logs", format!("{}.log", service_name));
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);

    // stdout: always WARN only, ignores RUST_LOG.
    let stdout_filter = EnvFilter::new("warn");

    // file: INFO for our crates, WARN for deps, RUST_LOG can override.
    let default_file_filter = "routedeck=info,routedeck_core=info,warn";
    let file_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_file_filter));

    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_ansi(true)
        .compact()
        .with_filter(stdout_filter);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_filter(file_filter);

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .init();

    tracing::info!(
        "observability initialized for service: {} (stdout=WARN, file=logs/{}.log)",
        service_name,
        service_name
    );

    TracingGuards {
        _file_guard: file_guard,
    }
}
