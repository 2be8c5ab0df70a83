#![forbid(unsafe_code)]

//! Logging setup.
//!
//! Every crate logs through `tracing` macros. This module installs the
//! process-wide subscriber. Stdout is the render surface, so records are
//! written to a file or dropped; they must never reach the terminal.
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `SUBTUI_LOG` | `EnvFilter` directives | `info` |
//! | `SUBTUI_LOG_FILE` | Append log records to this path | logging disabled |
//!
//! With the `tracing-json` feature, records are emitted as JSON lines.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Environment variable holding filter directives.
pub const LOG_FILTER_ENV: &str = "SUBTUI_LOG";
/// Environment variable naming the log file.
pub const LOG_FILE_ENV: &str = "SUBTUI_LOG_FILE";

const DEFAULT_FILTER: &str = "info";

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter directives (e.g. `subtui_runtime=debug`). `None` uses the default.
    pub filter: Option<String>,
    /// Destination file. `None` disables logging.
    pub file: Option<PathBuf>,
}

impl LogConfig {
    /// Read `SUBTUI_LOG` and `SUBTUI_LOG_FILE`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            filter: std::env::var(LOG_FILTER_ENV).ok().filter(|s| !s.is_empty()),
            file: std::env::var_os(LOG_FILE_ENV)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        }
    }

    /// Overlay explicitly given values onto this config.
    #[must_use]
    pub fn merged(mut self, filter: Option<String>, file: Option<PathBuf>) -> Self {
        if filter.is_some() {
            self.filter = filter;
        }
        if file.is_some() {
            self.file = file;
        }
        self
    }

    fn env_filter(&self) -> Result<EnvFilter, LogInitError> {
        let directives = self.filter.as_deref().unwrap_or(DEFAULT_FILTER);
        EnvFilter::try_new(directives).map_err(|e| LogInitError::Filter(e.to_string()))
    }
}

/// Failure to install the logging subscriber.
#[derive(Debug)]
pub enum LogInitError {
    /// The log file could not be opened.
    Io(io::Error),
    /// The filter directives did not parse.
    Filter(String),
    /// A global subscriber was already installed.
    AlreadyInstalled,
}

impl fmt::Display for LogInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogInitError::Io(e) => write!(f, "cannot open log file: {e}"),
            LogInitError::Filter(msg) => write!(f, "invalid log filter: {msg}"),
            LogInitError::AlreadyInstalled => write!(f, "logging already initialized"),
        }
    }
}

impl std::error::Error for LogInitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LogInitError::Io(e) => Some(e),
            LogInitError::Filter(_) | LogInitError::AlreadyInstalled => None,
        }
    }
}

impl From<io::Error> for LogInitError {
    fn from(e: io::Error) -> Self {
        LogInitError::Io(e)
    }
}

/// Install the global subscriber described by `config`.
///
/// Returns `Ok(false)` when no log file is configured (nothing installed).
///
/// # Errors
///
/// See [`LogInitError`].
pub fn init_logging(config: &LogConfig) -> Result<bool, LogInitError> {
    let Some(path) = &config.file else {
        return Ok(false);
    };
    let filter = config.env_filter()?;
    let file = open_log_file(path)?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_thread_names(true);

    #[cfg(feature = "tracing-json")]
    let result = builder.json().try_init();
    #[cfg(not(feature = "tracing-json"))]
    let result = builder.try_init();

    result.map_err(|_| LogInitError::AlreadyInstalled)?;
    tracing::info!(path = %path.display(), "logging initialized");
    Ok(true)
}

fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
