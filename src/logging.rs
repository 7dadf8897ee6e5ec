use std::fmt;
use std::fs;
use std::path::Path;

use chrono::format::{Item, StrftimeItems};
use chrono::Local;
use tracing::{error, Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{PipelineError, Result};

/// Events logged with this target are written with the CRITICAL level name.
pub const CRITICAL_TARGET: &str = "crime_etl::critical";

/// Renders one event per line as `timestamp LEVEL:message`.
pub struct LogLineFormat {
    time_format: String,
}

impl LogLineFormat {
    pub fn new(time_format: impl Into<String>) -> Self {
        Self { time_format: time_format.into() }
    }
}

fn level_name(target: &str, level: &Level) -> &'static str {
    if target == CRITICAL_TARGET {
        return "CRITICAL";
    }
    match level.as_str() {
        "WARN" => "WARNING",
        other => other,
    }
}

impl<S, N> FormatEvent<S, N> for LogLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        write!(
            writer,
            "{} {}:",
            Local::now().format(&self.time_format),
            level_name(meta.target(), meta.level())
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Rejects strftime patterns chrono cannot render.
pub fn check_time_format(time_format: &str) -> Result<()> {
    if StrftimeItems::new(time_format).any(|item| matches!(item, Item::Error)) {
        return Err(PipelineError::Config(format!("invalid log time format '{}'", time_format)));
    }
    Ok(())
}

/// Keeps the run's logging active. Dropping it uninstalls the subscriber
/// and flushes pending lines to the log file.
pub struct LoggingGuard {
    _subscriber: tracing::subscriber::DefaultGuard,
    _writer: WorkerGuard,
}

/// Installs file (and optionally console) logging for the current thread.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard> {
    check_time_format(&config.time_format)?;
    let log_file = config.file.as_path();
    let directory = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = log_file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| PipelineError::Config(format!("log file '{}' has no file name", log_file.display())))?;
    fs::create_dir_all(directory)?;

    // Single append-only file, no rotation
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(directory)
        .map_err(|e| PipelineError::Config(format!("cannot open log file '{}': {}", log_file.display(), e)))?;
    let (non_blocking_writer, writer_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(LogLineFormat::new(config.time_format.clone()))
        .with_ansi(false)
        .with_writer(non_blocking_writer);

    let console_layer = config.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stdout)
    });

    let env_filter = EnvFilter::try_new(&config.level)
        .map_err(|e| PipelineError::Config(format!("invalid log level '{}': {}", config.level, e)))?;

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer);

    Ok(LoggingGuard {
        _subscriber: tracing::subscriber::set_default(subscriber),
        _writer: writer_guard,
    })
}

/// Writes a CRITICAL line for a failure that happened before a run could start.
pub fn record_startup_failure(config: &LoggingConfig, message: &str) -> Result<()> {
    let _guard = init_logging(config)?;
    error!(target: CRITICAL_TARGET, "Pipeline execution failed: {}", message);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tracing::{info, warn};

    fn config_for(file: PathBuf) -> LoggingConfig {
        LoggingConfig {
            file,
            console: false,
            ..LoggingConfig::default()
        }
    }

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_lines_use_timestamp_level_message_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.log");
        {
            let _guard = init_logging(&config_for(path.clone())).unwrap();
            info!("Pipeline execution started");
            warn!("something odd");
            error!("File not found: missing.csv");
            error!(target: CRITICAL_TARGET, "Pipeline execution failed: boom");
        }

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with(" INFO:Pipeline execution started"));
        assert!(lines[1].ends_with(" WARNING:something odd"));
        assert!(lines[2].ends_with(" ERROR:File not found: missing.csv"));
        assert!(lines[3].ends_with(" CRITICAL:Pipeline execution failed: boom"));

        // "YYYY-MM-DD HH:MM:SS" prefix
        let stamp = &lines[0][..19];
        assert!(chrono::NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S").is_ok());
    }

    #[test]
    fn test_log_file_is_appended_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("pipeline.log");
        for run in 0..2 {
            let _guard = init_logging(&config_for(path.clone())).unwrap();
            info!("run {}", run);
        }
        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("INFO:run 0"));
        assert!(lines[1].ends_with("INFO:run 1"));
    }

    #[test]
    fn test_level_filter_applies_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.log");
        {
            let mut config = config_for(path.clone());
            config.level = "error".to_string();
            let _guard = init_logging(&config).unwrap();
            info!("hidden");
            error!("shown");
        }
        let lines = read_lines(&path);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("ERROR:shown"));
    }

    #[test]
    fn test_invalid_time_format_is_rejected_before_install() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.log");
        let mut config = config_for(path.clone());
        config.time_format = "%Y-%Q".to_string();

        let err = init_logging(&config).err().unwrap();
        assert!(matches!(err, PipelineError::Config(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_startup_failure_is_logged_critical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.log");
        record_startup_failure(&config_for(path.clone()), "bad config").unwrap();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with(" CRITICAL:Pipeline execution failed: bad config"));
    }
}
