//! Diagnostic logging setup.
//!
//! The full-screen chat owns the terminal, so it only logs when a file is
//! given. One-shot commands report warnings on stderr.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "MEDASSIST_LOG";
pub const DEFAULT_FILE_FILTER: &str = "medassist=info";
pub const DEFAULT_STDERR_FILTER: &str = "medassist=warn";

#[derive(Debug)]
pub enum LoggingError {
    Open { path: PathBuf, source: io::Error },
    Install(String),
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggingError::Open { path, source } => {
                write!(f, "cannot open log file {}: {source}", path.display())
            }
            LoggingError::Install(detail) => write!(f, "cannot install logger: {detail}"),
        }
    }
}

impl std::error::Error for LoggingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoggingError::Open { source, .. } => Some(source),
            LoggingError::Install(_) => None,
        }
    }
}

/// Directives from `MEDASSIST_LOG` when they parse, otherwise `default`.
fn filter_from(value: Option<String>, default: &str) -> EnvFilter {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(default))
}

fn env_filter(default: &str) -> EnvFilter {
    filter_from(std::env::var(LOG_ENV_VAR).ok(), default)
}

fn file_subscriber(file: File, filter: EnvFilter) -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .finish()
}

/// Append plain-text log lines to `path` for the rest of the process.
pub fn init_file_logging(path: &Path) -> Result<(), LoggingError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::subscriber::set_global_default(file_subscriber(
        file,
        env_filter(DEFAULT_FILE_FILTER),
    ))
    .map_err(|err| LoggingError::Install(err.to_string()))
}

pub fn init_stderr_logging() -> Result<(), LoggingError> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(DEFAULT_STDERR_FILTER))
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| LoggingError::Install(err.to_string()))
}
