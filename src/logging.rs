//! Logging configuration for tutorrag

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

use crate::config::LoggingConfig;
use crate::errors::TutorRagError;
use crate::Result;

fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::new(format!("{level},tutorrag={level}"))
}

/// Initialize console and daily-rolling file logging.
///
/// `level` overrides the configured level (the CLI's `--verbose` flag).
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the process.
pub fn init_logging(config: &LoggingConfig, level: Option<&str>) -> Result<WorkerGuard> {
    let level = level.unwrap_or(&config.level);

    let logs_dir = Path::new(&config.directory);
    if !logs_dir.exists() {
        std::fs::create_dir_all(logs_dir)?;
    }

    let file_appender = tracing_appender::rolling::daily(logs_dir, "tutorrag.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(non_blocking)
        .with_ansi(false);

    Registry::default()
        .with(filter_for(level))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| TutorRagError::ConfigError(format!("logging already initialized: {e}")))?;

    tracing::info!("Logging initialized with level: {}", level);
    tracing::info!(
        "Log files will be saved to: {}/tutorrag.log.YYYY-MM-DD",
        logs_dir.display()
    );

    Ok(guard)
}

/// Initialize console-only logging for tests and one-off commands
pub fn init_simple_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(true)
        .with_line_number(true)
        .with_env_filter(filter_for("info"))
        .try_init()
        .map_err(|e| TutorRagError::ConfigError(format!("logging already initialized: {e}")))?;

    tracing::info!("Simple logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_logging_twice_does_not_panic() {
        let _ = init_simple_logging();
        assert!(init_simple_logging().is_err());
    }
}
