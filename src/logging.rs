//! # Structured Logging Module
//!
//! Console output for operators plus an append-only JSON lifecycle log on disk.
//! The log file is informational only and never read back.

use crate::config::LoggingConfig;
use chrono::Utc;
use std::fs;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging. Later calls are no-ops.
///
/// `RUST_LOG` overrides the configured level. If another subscriber is already
/// installed it is kept. Hold the returned guard until exit so the file writer
/// flushes.
pub fn init_structured_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let mut guard = None;
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = || {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
        };

        let console_layer = config.console.then(|| {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter())
        });

        let file_layer = config.directory.as_ref().and_then(|dir| {
            if let Err(e) = fs::create_dir_all(dir) {
                eprintln!("Failed to create log directory {}: {e}", dir.display());
                return None;
            }
            let appender = tracing_appender::rolling::never(dir, &config.file_name);
            let (writer, worker_guard) = tracing_appender::non_blocking(appender);
            guard = Some(worker_guard);
            Some(
                fmt::layer()
                    .with_writer(writer)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_level(true)
                    .with_ansi(false)
                    .json()
                    .with_filter(filter()),
            )
        });

        let subscriber = tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer);

        if subscriber.try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = std::process::id(),
            level = %config.level,
            log_dir = ?config.directory,
            "Structured logging initialized"
        );
    });
    guard
}

/// Log structured data for one job lifecycle step
pub fn log_job_operation(
    operation: &str,
    batch_index: usize,
    job_id: Option<&str>,
    state: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        batch_index = batch_index,
        job_id = job_id,
        state = %state,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "JOB_OPERATION"
    );
}

/// Log structured data for batch-level progress
pub fn log_batch_operation(
    operation: &str,
    batch_index: usize,
    record_count: usize,
    processed: Option<u64>,
    failed: Option<u64>,
) {
    tracing::info!(
        operation = %operation,
        batch_index = batch_index,
        record_count = record_count,
        processed = processed,
        failed = failed,
        timestamp = %Utc::now().to_rfc3339(),
        "BATCH_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "ERROR"
    );
}
