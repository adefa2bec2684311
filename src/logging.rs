//! Structured logging configuration
//!
//! Provides:
//! - JSON output for machine consumption
//! - Pretty formatting for development
//! - Daily-rolling file output via `tracing-appender`
//! - Per-pass spans carrying a `pass_id`

use crate::config::{LoggingConfig, PathsConfig};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::Span;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};
use uuid::Uuid;

const LOG_FILE_NAME: &str = "ads-insights.log";

/// Initialize the logging system based on configuration.
///
/// `RUST_LOG` takes precedence over the configured level. When logs go to a
/// file the returned guard must be held until exit so buffered lines flush.
pub fn init_logging(logging: &LoggingConfig, paths: &PathsConfig) -> Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match logging.output.as_str() {
        "file" => init_file_logging(env_filter, &logging.format, &paths.log_directory).map(Some),
        "both" => init_combined_logging(env_filter, &logging.format, &paths.log_directory).map(Some),
        _ => init_console_logging(env_filter, &logging.format).map(|_| None),
    }
}

fn init_console_logging(filter: EnvFilter, format: &str) -> Result<()> {
    let subscriber = tracing_subscriber::registry().with(filter);

    // Reports go to stdout, so log lines stay on stderr
    match format {
        "json" => subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init(),
        _ => subscriber
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_ansi(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .pretty(),
            )
            .try_init(),
    }
    .context("Failed to initialize console logging")
}

fn file_writer(log_dir: &Path) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    Ok(tracing_appender::non_blocking(file_appender))
}

fn init_file_logging(filter: EnvFilter, format: &str, log_dir: &Path) -> Result<WorkerGuard> {
    let (non_blocking, guard) = file_writer(log_dir)?;
    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        "json" => subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init(),
        _ => subscriber
            .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
            .try_init(),
    }
    .context("Failed to initialize file logging")?;

    Ok(guard)
}

fn init_combined_logging(filter: EnvFilter, format: &str, log_dir: &Path) -> Result<WorkerGuard> {
    let (non_blocking, guard) = file_writer(log_dir)?;
    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        "json" => subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(fmt::layer().json().with_writer(non_blocking))
            .try_init(),
        _ => subscriber
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
            .try_init(),
    }
    .context("Failed to initialize combined logging")?;

    Ok(guard)
}

/// Span for one ingestion pass (`remote`, `upload`), tagged with a fresh `pass_id`.
pub fn pass_span(kind: &'static str) -> Span {
    tracing::info_span!("ingest", kind, pass_id = %Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_logging_creates_directory_and_keeps_guard() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("nested").join("logs");
        let logging = LoggingConfig {
            output: "file".to_string(),
            ..LoggingConfig::default()
        };
        let paths = PathsConfig {
            log_directory: log_dir.clone(),
        };

        let guard = init_logging(&logging, &paths).unwrap();
        assert!(guard.is_some());
        assert!(log_dir.is_dir());
    }

    #[test]
    fn test_pass_span_is_usable_without_subscriber() {
        let span = pass_span("remote");
        let _entered = span.enter();
    }
}
