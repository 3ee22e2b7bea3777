//! # Logging Utilities
//!
//! Logging infrastructure for heft using `tracing`.
//!
//! This module provides structured logging with support for:
//! - Pretty (development) and JSON (machine) output formats
//! - Environment variable configuration
//! - An optional log file next to the console output
//!
//! Console logs always go to **stderr**. Stdout is reserved for the report,
//! so `heft --json` output stays machine-readable with logging enabled.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use heft_utils::init_logging;
//!
//! // Reads RUST_LOG, HEFT_LOG_FORMAT and HEFT_LOG_FILE
//! let _guard = init_logging().expect("Failed to initialize logging");
//!
//! tracing::warn!("module cache path does not exist");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Log filter (e.g. `RUST_LOG=debug`, `RUST_LOG=heft_core=debug`), default `warn`
//! - `HEFT_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `HEFT_LOG_FILE`: Optional log file. A directory gets a dated `YYYY-MM-DD-heft.log` inside it.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use heft_utils::{LogFormat, LogLevel, init_logging_with_level};
//!
//! // Explicit level, e.g. from a `--log-level` flag
//! let _guard = init_logging_with_level(LogLevel::Debug, LogFormat::Pretty)
//!     .expect("Failed to initialize logging");
//! ```

use std::env;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Utc;
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

const FORMAT_VAR: &str = "HEFT_LOG_FORMAT";
const FILE_VAR: &str = "HEFT_LOG_FILE";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format
    #[default]
    Pretty,
    /// JSON lines
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(format!("{s}. Use 'pretty' or 'json'"))),
        }
    }
}

impl LogFormat
{
    /// Format named by `HEFT_LOG_FORMAT`, [`LogFormat::Pretty`] when unset.
    ///
    /// ## Errors
    ///
    /// Returns [`LoggingError::InvalidFormat`] for an unknown value.
    pub fn from_env() -> Result<Self, LoggingError>
    {
        match env::var(FORMAT_VAR) {
            Ok(value) if !value.is_empty() => value.parse(),
            _ => Ok(LogFormat::default()),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level (default)
    #[default]
    Warn,
    /// Info level
    Info,
    /// Debug level
    Debug,
    /// Trace level (most verbose)
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(format!(
                "{s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            ))),
        }
    }
}

/// Keeps the file writer flushing until dropped. Hold it for the life of `main`.
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug, Default)]
pub struct LogGuard
{
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber from `RUST_LOG`, `HEFT_LOG_FORMAT` and `HEFT_LOG_FILE`.
///
/// Without `RUST_LOG` only warnings and errors are shown.
///
/// ## Errors
///
/// - [`LoggingError::InvalidFormat`] if `HEFT_LOG_FORMAT` names no known format.
/// - [`LoggingError::FileError`] if the log file's directory cannot be created.
/// - [`LoggingError::InitializationFailed`] if a global subscriber is already set.
pub fn init_logging() -> Result<LogGuard, LoggingError>
{
    install(LogFormat::from_env()?, None)
}

/// Like [`init_logging`], but `level` replaces whatever `RUST_LOG` says.
///
/// ## Errors
///
/// Same as [`init_logging`], minus the format lookup.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<LogGuard, LoggingError>
{
    install(format, Some(level.into()))
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Filter priority: explicit level, then `RUST_LOG`, then `warn`.
fn build_filter(explicit_level: Option<Level>) -> EnvFilter
{
    match explicit_level {
        Some(level) => EnvFilter::new(level.to_string()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::WARN.to_string())),
    }
}

/// Resolve `HEFT_LOG_FILE` to a concrete file. Directories get a dated file name.
fn log_file_path(value: &Path) -> Result<PathBuf, LoggingError>
{
    if value.is_dir() {
        let today = Utc::now().format("%Y-%m-%d");
        return Ok(value.join(format!("{today}-heft.log")));
    }
    if let Some(parent) = value.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(value.to_path_buf())
}

fn install(format: LogFormat, explicit_level: Option<Level>) -> Result<LogGuard, LoggingError>
{
    let mut layers: Vec<BoxedLayer> = Vec::with_capacity(2);
    let mut file_guard = None;

    if let Some(value) = env::var_os(FILE_VAR).filter(|value| !value.is_empty()) {
        let path = log_file_path(Path::new(&value))?;
        let directory = path.parent().unwrap_or_else(|| Path::new("."));
        let name = path.file_name().unwrap_or_default();
        // Never rolls: directory targets already get a dated file name.
        let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(directory, name));
        layers.push(file_layer(format, writer, build_filter(explicit_level)));
        file_guard = Some(guard);
    }
    layers.push(console_layer(format, build_filter(explicit_level)));

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;
    Ok(LogGuard { _file: file_guard })
}

/// Compact lines on stderr, colored only when stderr is a terminal.
fn console_layer(format: LogFormat, filter: EnvFilter) -> BoxedLayer
{
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_timer(ChronoUtc::rfc_3339());
    match format {
        LogFormat::Pretty => layer
            .compact()
            .with_target(false)
            .with_ansi(io::stderr().is_terminal())
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => layer.json().flatten_event(true).with_filter(filter).boxed(),
    }
}

/// File records keep source locations for later digging.
fn file_layer(format: LogFormat, writer: NonBlocking, filter: EnvFilter) -> BoxedLayer
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_timer(ChronoUtc::rfc_3339())
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true);
    match format {
        LogFormat::Pretty => layer.with_filter(filter).boxed(),
        LogFormat::Json => layer.json().with_span_list(true).with_filter(filter).boxed(),
    }
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_log_format_from_str()
    {
        assert_eq!(LogFormat::from_str("pretty").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("json").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("dev").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("PROD").unwrap(), LogFormat::Json);
        assert!(matches!(LogFormat::from_str("invalid"), Err(LoggingError::InvalidFormat(_))));
    }

    #[test]
    fn test_log_level_from_str()
    {
        assert_eq!(LogLevel::from_str("error").unwrap(), LogLevel::Error);
        assert_eq!(LogLevel::from_str("warning").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("debug").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("trace").unwrap(), LogLevel::Trace);
        assert!(matches!(LogLevel::from_str("loud"), Err(LoggingError::InvalidLevel(_))));
    }

    #[test]
    fn test_default_level_is_warn()
    {
        assert_eq!(LogLevel::default(), LogLevel::Warn);
        assert_eq!(Level::from(LogLevel::default()), Level::WARN);
    }

    #[test]
    fn test_explicit_level_sets_filter()
    {
        use tracing_subscriber::filter::LevelFilter;

        assert_eq!(build_filter(Some(Level::DEBUG)).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(
            build_filter(Some(LogLevel::Error.into())).max_level_hint(),
            Some(LevelFilter::ERROR)
        );
    }

    #[test]
    fn test_log_file_path_in_directory()
    {
        let dir = tempfile::TempDir::new().unwrap();
        let path = log_file_path(dir.path()).unwrap();
        assert_eq!(path.parent(), Some(dir.path()));
        assert!(path.file_name().unwrap().to_string_lossy().ends_with("-heft.log"));
    }

    #[test]
    fn test_log_file_path_creates_parent()
    {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("logs").join("run.log");
        assert_eq!(log_file_path(&target).unwrap(), target);
        assert!(dir.path().join("logs").is_dir());
    }
}
