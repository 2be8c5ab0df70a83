#![forbid(unsafe_code)]

//! Scheduler and supervisor configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use subtui_render::{Anchor, PackedRgba};

/// Environment variable overriding the default font path.
pub const FONT_PATH_ENV: &str = "SUBTUI_FONT_PATH";
/// Environment variable overriding the default font size.
pub const FONT_SIZE_ENV: &str = "SUBTUI_FONT_SIZE";

/// Font used when a cue is displayed before any `set_font`.
pub const DEFAULT_FONT_PATH: &str = "/usr/share/fonts/truetype/nanum/NanumGothicBold.ttf";
/// Point size of the default font.
pub const DEFAULT_FONT_SIZE: u16 = 16;

/// How cues are drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Font loaded lazily on the first display if none was set.
    pub default_font_path: PathBuf,
    /// Size of the lazily loaded font.
    pub default_font_size: u16,
    /// Cue text color.
    pub text_color: PackedRgba,
    /// Where the rendered cue sits on the surface.
    pub anchor: Anchor,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_font_path: PathBuf::from(DEFAULT_FONT_PATH),
            default_font_size: DEFAULT_FONT_SIZE,
            text_color: PackedRgba::WHITE,
            anchor: Anchor::TopLeft,
        }
    }
}

impl SchedulerConfig {
    /// Defaults with `SUBTUI_FONT_PATH` / `SUBTUI_FONT_SIZE` applied.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults with overrides read through `lookup`. Unparseable or zero
    /// sizes are ignored.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = lookup(FONT_PATH_ENV).filter(|p| !p.is_empty()) {
            config.default_font_path = PathBuf::from(path);
        }
        if let Some(size) = lookup(FONT_SIZE_ENV)
            .and_then(|s| s.trim().parse::<u16>().ok())
            .filter(|&s| s > 0)
        {
            config.default_font_size = size;
        }
        config
    }
}

/// Event loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// How long each poll of the event source may block. Bounds the latency
    /// of a shutdown request.
    pub poll_interval: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
        }
    }
}
