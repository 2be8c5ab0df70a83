#![forbid(unsafe_code)]

//! Error types.
//!
//! - [`ConfigurationError`]: a display was attempted without a usable font.
//!   Fatal to that display call only.
//! - [`DisplayError`]: everything a single display, repaint or resize call
//!   can fail with.
//! - [`InitializationError`]: the terminal, logging, or font subsystem could
//!   not start. Aborts before any cue is shown.
//!
//! Font and surface failures themselves are [`FontLoadError`] and
//! [`SurfaceError`] from `subtui-render`.

use std::fmt;
use std::io;
use std::path::PathBuf;

use subtui_core::logging::LogInitError;
use subtui_render::{FontLoadError, SurfaceError};

/// No usable font: the default font failed to load.
#[derive(Debug)]
pub struct ConfigurationError {
    /// Default font path that was tried.
    pub path: PathBuf,
    /// Default font size that was tried.
    pub size: u16,
    /// Why it failed.
    pub source: FontLoadError,
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no usable font: default font {} (size {}) failed to load: {}",
            self.path.display(),
            self.size,
            self.source
        )
    }
}

impl std::error::Error for ConfigurationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Failure of a single display call.
#[derive(Debug)]
pub enum DisplayError {
    /// No usable font.
    Configuration(ConfigurationError),
    /// The surface rejected the frame.
    Surface(SurfaceError),
    /// The auto-clear timer thread could not be spawned. The cue was
    /// withdrawn.
    Timer(io::Error),
}

impl DisplayError {
    /// Whether the surface is no longer usable.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            DisplayError::Configuration(_) | DisplayError::Timer(_) => false,
            DisplayError::Surface(e) => e.is_fatal(),
        }
    }
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::Configuration(e) => write!(f, "{e}"),
            DisplayError::Surface(e) => write!(f, "{e}"),
            DisplayError::Timer(e) => write!(f, "failed to start auto-clear timer: {e}"),
        }
    }
}

impl std::error::Error for DisplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DisplayError::Configuration(e) => Some(e),
            DisplayError::Surface(e) => Some(e),
            DisplayError::Timer(e) => Some(e),
        }
    }
}

impl From<ConfigurationError> for DisplayError {
    fn from(e: ConfigurationError) -> Self {
        DisplayError::Configuration(e)
    }
}

impl From<SurfaceError> for DisplayError {
    fn from(e: SurfaceError) -> Self {
        DisplayError::Surface(e)
    }
}

/// Startup failure.
#[derive(Debug)]
pub enum InitializationError {
    /// Terminal setup (raw mode, alternate screen, size query) failed.
    Terminal(io::Error),
    /// The log subscriber could not be installed.
    Logging(LogInitError),
    /// The initial surface could not be created.
    Surface(SurfaceError),
    /// An explicitly requested font could not be loaded.
    Font(FontLoadError),
    /// A background thread could not be spawned.
    Thread(io::Error),
}

impl fmt::Display for InitializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitializationError::Terminal(e) => write!(f, "failed to initialize terminal: {e}"),
            InitializationError::Logging(e) => write!(f, "failed to initialize logging: {e}"),
            InitializationError::Surface(e) => write!(f, "failed to create surface: {e}"),
            InitializationError::Font(e) => write!(f, "failed to load font: {e}"),
            InitializationError::Thread(e) => write!(f, "failed to spawn thread: {e}"),
        }
    }
}

impl std::error::Error for InitializationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InitializationError::Terminal(e) | InitializationError::Thread(e) => Some(e),
            InitializationError::Logging(e) => Some(e),
            InitializationError::Surface(e) => Some(e),
            InitializationError::Font(e) => Some(e),
        }
    }
}

impl From<LogInitError> for InitializationError {
    fn from(e: LogInitError) -> Self {
        InitializationError::Logging(e)
    }
}

impl From<SurfaceError> for InitializationError {
    fn from(e: SurfaceError) -> Self {
        InitializationError::Surface(e)
    }
}

impl From<FontLoadError> for InitializationError {
    fn from(e: FontLoadError) -> Self {
        InitializationError::Font(e)
    }
}
