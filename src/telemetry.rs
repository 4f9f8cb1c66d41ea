//! Tracing subscriber setup.
//!
//! The library itself only emits `tracing` events; nothing is printed unless
//! the host installs a subscriber. These helpers install one with sensible
//! defaults for binaries and test harnesses that do not bring their own.
//!
//! ```rust,ignore
//! use llm_relay::telemetry::{LogFormat, LoggingConfig, init_logging};
//!
//! let _guard = init_logging(
//!     LoggingConfig::builder()
//!         .level(tracing::Level::DEBUG)
//!         .format(LogFormat::Json)
//!         .build(),
//! )?;
//! ```

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::error::LlmError;

pub const ENV_LOG_LEVEL: &str = "LLM_RELAY_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "LLM_RELAY_LOG_FORMAT";
pub const ENV_LOG_FILE: &str = "LLM_RELAY_LOG_FILE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per event.
    Json,
    /// JSON without span lists.
    JsonCompact,
}

impl std::str::FromStr for LogFormat {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "json-compact" | "json_compact" => Ok(Self::JsonCompact),
            other => Err(LlmError::ConfigurationError(format!(
                "invalid log format '{other}' (expected text, json or json-compact)"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: tracing::Level,
    pub format: LogFormat,
    /// Write to stderr.
    pub console: bool,
    /// Append to this file as well; requires keeping the returned guard alive.
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            format: LogFormat::Text,
            console: true,
            log_file: None,
        }
    }
}

impl LoggingConfig {
    pub fn builder() -> LoggingConfigBuilder {
        LoggingConfigBuilder::default()
    }

    /// Default filter directive for this crate at the configured level.
    fn directive(&self) -> String {
        format!("llm_relay={}", level_name(self.level))
    }
}

#[derive(Debug, Default)]
pub struct LoggingConfigBuilder {
    level: Option<tracing::Level>,
    format: Option<LogFormat>,
    console: Option<bool>,
    log_file: Option<PathBuf>,
}

impl LoggingConfigBuilder {
    pub fn level(mut self, level: tracing::Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Parse `trace`, `debug`, `info`, `warn` or `error`.
    pub fn level_str(mut self, level: &str) -> Result<Self, LlmError> {
        self.level = Some(parse_level(level)?);
        Ok(self)
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn console(mut self, enabled: bool) -> Self {
        self.console = Some(enabled);
        self
    }

    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn build(self) -> LoggingConfig {
        LoggingConfig {
            level: self.level.unwrap_or(tracing::Level::INFO),
            format: self.format.unwrap_or_default(),
            console: self.console.unwrap_or(true),
            log_file: self.log_file,
        }
    }
}

fn parse_level(level: &str) -> Result<tracing::Level, LlmError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(tracing::Level::TRACE),
        "debug" => Ok(tracing::Level::DEBUG),
        "info" => Ok(tracing::Level::INFO),
        "warn" | "warning" => Ok(tracing::Level::WARN),
        "error" => Ok(tracing::Level::ERROR),
        other => Err(LlmError::ConfigurationError(format!(
            "invalid log level '{other}' (expected trace, debug, info, warn or error)"
        ))),
    }
}

const fn level_name(level: tracing::Level) -> &'static str {
    match level {
        tracing::Level::TRACE => "trace",
        tracing::Level::DEBUG => "debug",
        tracing::Level::INFO => "info",
        tracing::Level::WARN => "warn",
        tracing::Level::ERROR => "error",
    }
}

/// Install a global subscriber. `RUST_LOG`, when set, overrides the level.
///
/// Returns the file writer's guard when `log_file` is set; dropping it
/// flushes and stops the background writer. A subscriber that is already
/// installed is left in place and `Ok(None)` is returned.
pub fn init_logging(config: LoggingConfig) -> Result<Option<WorkerGuard>, LlmError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.directive()));

    let (writer, guard) = match (&config.log_file, config.console) {
        (Some(path), console) => {
            let file_name = path.file_name().ok_or_else(|| {
                LlmError::ConfigurationError(format!("log file path '{}' has no file name", path.display()))
            })?;
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (file_writer, guard) = tracing_appender::non_blocking(appender);
            let writer = if console {
                use tracing_subscriber::fmt::writer::MakeWriterExt;
                BoxMakeWriter::new(file_writer.and(std::io::stderr))
            } else {
                BoxMakeWriter::new(file_writer)
            };
            (writer, Some(guard))
        }
        (None, true) => (BoxMakeWriter::new(std::io::stderr), None),
        (None, false) => (BoxMakeWriter::new(std::io::sink), None),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(true);

    let result = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
        LogFormat::JsonCompact => builder.json().with_span_list(false).try_init(),
    };

    match result {
        Ok(()) => Ok(guard),
        Err(e) if e.to_string().contains("already been set") => Ok(None),
        Err(e) => Err(LlmError::ConfigurationError(format!(
            "failed to initialize logging: {e}"
        ))),
    }
}

/// Build a [`LoggingConfig`] from `LLM_RELAY_LOG_LEVEL`,
/// `LLM_RELAY_LOG_FORMAT` and `LLM_RELAY_LOG_FILE`.
pub fn config_from_env() -> Result<LoggingConfig, LlmError> {
    let mut builder = LoggingConfig::builder();
    if let Ok(level) = std::env::var(ENV_LOG_LEVEL) {
        builder = builder.level_str(&level)?;
    }
    if let Ok(format) = std::env::var(ENV_LOG_FORMAT) {
        builder = builder.format(format.parse()?);
    }
    if let Ok(path) = std::env::var(ENV_LOG_FILE) {
        builder = builder.log_file(path);
    }
    Ok(builder.build())
}

pub fn init_from_env() -> Result<Option<WorkerGuard>, LlmError> {
    init_logging(config_from_env()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let config = LoggingConfig::builder().build();
        assert_eq!(config.level, tracing::Level::INFO);
        assert_eq!(config.format, LogFormat::Text);
        assert!(config.console);
        assert!(config.log_file.is_none());
        assert_eq!(config.directive(), "llm_relay=info");
    }

    #[test]
    fn levels_and_formats_parse() {
        assert_eq!(parse_level("WARNING").unwrap(), tracing::Level::WARN);
        assert!(parse_level("loud").is_err());
        assert_eq!("json-compact".parse::<LogFormat>().unwrap(), LogFormat::JsonCompact);
        let err = "xml".parse::<LogFormat>().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    }

    #[test]
    fn file_logging_returns_guard_or_tolerates_existing_subscriber() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig::builder()
            .console(false)
            .log_file(dir.path().join("relay.log"))
            .build();
        // Another test may have installed a global subscriber first.
        assert!(init_logging(config).is_ok());
    }
}
