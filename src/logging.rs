//! Tracing subscriber setup for the binary

use clap::Args;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log level '{level}': {message}")]
    InvalidLevel { level: String, message: String },

    #[error("Log file path has no file name: {}", .0.display())]
    InvalidFilePath(PathBuf),

    #[error("Failed to create log directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to install tracing subscriber: {0}")]
    Init(String),
}

/// Logging flags shared by every subcommand
#[derive(Debug, Clone, Args)]
pub struct LoggingArgs {
    /// Log level (DEBUG, INFO, WARNING, ERROR, CRITICAL or a tracing filter).
    /// RUST_LOG takes precedence when set.
    #[arg(long, env = "LOG_LEVEL", default_value = "INFO", global = true)]
    pub log_level: String,

    /// Also write logs to this file
    #[arg(long = "log-file", env = "LOG_FILE_PATH", global = true)]
    pub log_file_path: Option<PathBuf>,
}

impl Default for LoggingArgs {
    fn default() -> Self {
        Self {
            log_level: "INFO".to_string(),
            log_file_path: None,
        }
    }
}

/// Translate the Python-style level names used in `.env` files into a
/// tracing filter directive
pub fn level_directive(level: &str) -> String {
    match level.trim().to_ascii_uppercase().as_str() {
        "CRITICAL" | "FATAL" | "ERROR" => "error".to_string(),
        "WARNING" | "WARN" => "warn".to_string(),
        "INFO" => "info".to_string(),
        "DEBUG" => "debug".to_string(),
        "TRACE" | "NOTSET" => "trace".to_string(),
        _ => level.trim().to_string(),
    }
}

fn env_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level_directive(level)).map_err(|e| LoggingError::InvalidLevel {
        level: level.to_string(),
        message: e.to_string(),
    })
}

/// Install the global subscriber: stderr always, plus a non-blocking file
/// writer when a log file is configured.
///
/// The returned guard flushes the file writer on drop and must be held
/// for the life of the program.
pub fn init_tracing(args: &LoggingArgs) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = env_filter(&args.log_level)?;
    let stderr_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let (file_layer, guard) = match &args.log_file_path {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(guard)
}

fn file_writer(
    path: &Path,
) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard), LoggingError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::InvalidFilePath(path.to_path_buf()))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(directory).map_err(|source| LoggingError::CreateDir {
        path: directory.to_path_buf(),
        source,
    })?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(directory)
        .map_err(|e| LoggingError::Init(e.to_string()))?;
    Ok(tracing_appender::non_blocking(appender))
}
