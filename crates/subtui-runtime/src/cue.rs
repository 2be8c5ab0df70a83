#![forbid(unsafe_code)]

//! Cues and timeline entries.

use std::sync::Arc;
use std::time::Duration;

/// A single subtitle entry.
///
/// Cues are immutable and shared as `Arc<Cue>`. The scheduler compares cues
/// by allocation ([`Arc::ptr_eq`]), not by content: two cues with the same
/// text are still distinct displays.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cue {
    text: String,
    duration: Duration,
}

impl Cue {
    /// Create a cue.
    pub fn new(text: impl Into<String>, duration: Duration) -> Self {
        Self {
            text: text.into(),
            duration,
        }
    }

    /// Create a shared cue.
    pub fn shared(text: impl Into<String>, duration: Duration) -> Arc<Self> {
        Arc::new(Self::new(text, duration))
    }

    /// Cue text. Lines are separated by `\n`.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// How long the cue stays on screen.
    #[inline]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

/// A cue placed on a playback timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedCue {
    /// Offset from the start of playback.
    pub start: Duration,
    /// The cue shown at `start`.
    pub cue: Arc<Cue>,
}

impl TimedCue {
    /// Create a timeline entry.
    pub fn new(start: Duration, cue: Arc<Cue>) -> Self {
        Self { start, cue }
    }

    /// Offset at which the cue's duration runs out.
    #[must_use]
    pub fn end(&self) -> Duration {
        self.start.saturating_add(self.cue.duration())
    }
}
