#![forbid(unsafe_code)]

//! Cue-display scheduler.
//!
//! The [`CueScheduler`] decides, for a stream of incoming cues, when to
//! render, when to auto-clear, and how resizes interleave with an in-flight
//! display. It is a cheap-to-clone handle; the playback thread and the
//! supervisor each hold one.
//!
//! # Critical section
//!
//! One mutex guards the surface, the font, the active [`DisplaySession`] and
//! the generation counter. Every operation, including the auto-clear timer
//! callback, runs entirely under it.
//!
//! # Cancellation
//!
//! Each display bumps a monotonically increasing generation and starts a
//! timer thread tagged with it. When the timer fires it takes the lock and
//! clears only if the active session still carries its generation; a
//! superseded timer is a no-op. Timers are never killed.
//! [`CueScheduler::close`] wakes them through a [`StopSignal`] so they exit
//! without touching the surface, then joins them.
//!
//! # Faults
//!
//! A fatal surface error from any operation, including an auto-clear that
//! nobody awaits, is recorded once and exposed through
//! [`CueScheduler::fault`]. The supervisor polls it and stops.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use subtui_render::{
    Anchor, CellGlyphRenderer, FileFontLoader, FontConfig, FontLoadError, FontLoader, GlyphImage,
    GlyphRenderer, RenderSurface, SurfaceError,
};

use crate::config::SchedulerConfig;
use crate::cue::Cue;
use crate::error::{ConfigurationError, DisplayError};
use crate::stop::{StopSignal, StopTrigger};

/// The live binding between a cue and its render + timer lifecycle.
#[derive(Debug, Clone)]
pub struct DisplaySession {
    cue: Arc<Cue>,
    started_at: Instant,
    generation: u64,
}

impl DisplaySession {
    /// The cue on screen.
    pub fn cue(&self) -> &Arc<Cue> {
        &self.cue
    }

    /// When the cue was first rendered. Repaints do not move it.
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Generation tag of this session's auto-clear timer.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Time left before the auto-clear fires.
    pub fn remaining(&self) -> Duration {
        self.cue.duration().saturating_sub(self.started_at.elapsed())
    }
}

/// Result of a display request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayOutcome {
    /// A new session was started.
    Rendered,
    /// The cue was already active; nothing happened.
    Unchanged,
    /// The active cue was redrawn; its timer keeps running.
    Repainted,
    /// The scheduler is closed.
    Closed,
}

/// Result of a resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    /// The active cue was redrawn at the new size.
    Repainted,
    /// Nothing was active; the new surface is blank.
    Blank,
    /// The scheduler is closed.
    Closed,
}

/// Counters of scheduler activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Sessions started.
    pub renders: u64,
    /// Forced redraws of an active cue (resize or `display_forced`).
    pub repaints: u64,
    /// Explicit `clear` calls that removed a cue.
    pub clears: u64,
    /// Timer fires that removed their cue.
    pub auto_clears: u64,
    /// Sessions superseded by a newer cue.
    pub preemptions: u64,
    /// Timer fires that found their session superseded.
    pub stale_timer_fires: u64,
}

struct State<S> {
    surface: S,
    font: Option<FontConfig>,
    session: Option<DisplaySession>,
    generation: u64,
    closed: bool,
    fault: Option<String>,
    stats: SchedulerStats,
}

impl<S> State<S> {
    fn note_fault(&mut self, error: &SurfaceError) {
        if error.is_fatal() && self.fault.is_none() {
            self.fault = Some(error.to_string());
        }
    }
}

struct Shared<S> {
    state: Mutex<State<S>>,
    config: SchedulerConfig,
    renderer: Box<dyn GlyphRenderer>,
    loader: Box<dyn FontLoader>,
    shutdown: StopSignal,
    shutdown_trigger: StopTrigger,
    timers: Mutex<Vec<JoinHandle<()>>>,
}

impl<S> Drop for Shared<S> {
    fn drop(&mut self) {
        self.shutdown_trigger.stop();
    }
}

/// Schedules cue display on a [`RenderSurface`].
pub struct CueScheduler<S> {
    shared: Arc<Shared<S>>,
}

impl<S> Clone for CueScheduler<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S> std::fmt::Debug for CueScheduler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CueScheduler")
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

impl<S: RenderSurface + 'static> CueScheduler<S> {
    /// Scheduler with the cell glyph renderer and the file font loader.
    pub fn new(surface: S, config: SchedulerConfig) -> Self {
        Self::with_parts(
            surface,
            config,
            Box::new(CellGlyphRenderer),
            Box::new(FileFontLoader),
        )
    }

    /// Scheduler with explicit collaborators.
    pub fn with_parts(
        surface: S,
        config: SchedulerConfig,
        renderer: Box<dyn GlyphRenderer>,
        loader: Box<dyn FontLoader>,
    ) -> Self {
        let (shutdown, shutdown_trigger) = StopSignal::new();
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    surface,
                    font: None,
                    session: None,
                    generation: 0,
                    closed: false,
                    fault: None,
                    stats: SchedulerStats::default(),
                }),
                config,
                renderer,
                loader,
                shutdown,
                shutdown_trigger,
                timers: Mutex::new(Vec::new()),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<S>> {
        self.shared.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Show `cue`. A no-op if the same cue (by identity) is already active.
    ///
    /// # Errors
    ///
    /// - [`DisplayError::Configuration`] if no font is set and the default
    ///   font cannot be loaded. No session is started.
    /// - [`DisplayError::Surface`] if presenting failed. The session and its
    ///   timer are started regardless.
    pub fn display(&self, cue: Arc<Cue>) -> Result<DisplayOutcome, DisplayError> {
        self.show(cue, false)
    }

    /// Show `cue`, redrawing it even if it is already active. Redrawing the
    /// active cue keeps its session and timer.
    ///
    /// # Errors
    ///
    /// As [`CueScheduler::display`].
    pub fn display_forced(&self, cue: Arc<Cue>) -> Result<DisplayOutcome, DisplayError> {
        self.show(cue, true)
    }

    fn show(&self, cue: Arc<Cue>, force: bool) -> Result<DisplayOutcome, DisplayError> {
        let mut state = self.lock();
        if state.closed {
            tracing::debug!("display rejected: scheduler closed");
            return Ok(DisplayOutcome::Closed);
        }

        let is_current = state
            .session
            .as_ref()
            .is_some_and(|s| Arc::ptr_eq(&s.cue, &cue));
        if is_current {
            if !force {
                tracing::trace!("cue already active");
                return Ok(DisplayOutcome::Unchanged);
            }
            self.repaint(&mut state, &cue)?;
            state.stats.repaints += 1;
            return Ok(DisplayOutcome::Repainted);
        }

        state.generation += 1;
        let generation = state.generation;
        if let Some(old) = state.session.take() {
            state.stats.preemptions += 1;
            tracing::debug!(
                superseded = old.generation,
                generation,
                "cue superseded"
            );
        }

        let font = match self.ensure_font(&mut state) {
            Ok(font) => font,
            Err(e) => {
                tracing::warn!(error = %e, generation, "display without a usable font");
                return Err(e.into());
            }
        };

        let image = self
            .shared
            .renderer
            .render(&font, cue.text(), self.shared.config.text_color);
        if image.is_empty() {
            tracing::debug!(generation, "cue rendered empty; blit skipped");
        }
        let presented = paint(&mut state.surface, &image, self.shared.config.anchor);

        let duration = cue.duration();
        state.session = Some(DisplaySession {
            cue,
            started_at: Instant::now(),
            generation,
        });
        if let Err(e) = self.spawn_timer(generation, duration) {
            tracing::error!(error = %e, generation, "failed to spawn auto-clear timer");
            state.session = None;
            state.surface.clear();
            if let Err(pe) = state.surface.present() {
                tracing::warn!(error = %pe, "present failed while withdrawing cue");
                state.note_fault(&pe);
            }
            return Err(DisplayError::Timer(e));
        }
        state.stats.renders += 1;
        tracing::debug!(generation, duration_ms = duration.as_millis() as u64, "cue displayed");

        if let Err(e) = presented {
            state.note_fault(&e);
            return Err(e.into());
        }
        Ok(DisplayOutcome::Rendered)
    }

    fn ensure_font(&self, state: &mut State<S>) -> Result<FontConfig, ConfigurationError> {
        if let Some(font) = &state.font {
            return Ok(font.clone());
        }
        let config = &self.shared.config;
        tracing::info!(
            path = %config.default_font_path.display(),
            size = config.default_font_size,
            "loading default font"
        );
        match self
            .shared
            .loader
            .open_font(&config.default_font_path, config.default_font_size)
        {
            Ok(font) => {
                state.font = Some(font.clone());
                Ok(font)
            }
            Err(source) => Err(ConfigurationError {
                path: config.default_font_path.clone(),
                size: config.default_font_size,
                source,
            }),
        }
    }

    fn repaint(&self, state: &mut State<S>, cue: &Cue) -> Result<(), DisplayError> {
        let font = self.ensure_font(state)?;
        let image = self
            .shared
            .renderer
            .render(&font, cue.text(), self.shared.config.text_color);
        if let Err(e) = paint(&mut state.surface, &image, self.shared.config.anchor) {
            state.note_fault(&e);
            return Err(e.into());
        }
        Ok(())
    }

    fn spawn_timer(&self, generation: u64, duration: Duration) -> std::io::Result<()> {
        let weak: Weak<Shared<S>> = Arc::downgrade(&self.shared);
        let stop = self.shared.shutdown.clone();
        let handle = thread::Builder::new()
            .name(format!("subtui-autoclear-{generation}"))
            .spawn(move || {
                if stop.wait_timeout(duration) {
                    tracing::trace!(generation, "auto-clear timer stopped");
                    return;
                }
                if let Some(shared) = weak.upgrade() {
                    CueScheduler { shared }.auto_clear(generation);
                }
            })?;
        let mut timers = self.shared.timers.lock().unwrap_or_else(|e| e.into_inner());
        timers.retain(|h| !h.is_finished());
        timers.push(handle);
        Ok(())
    }

    fn auto_clear(&self, generation: u64) {
        let mut state = self.lock();
        if state.closed {
            return;
        }
        let current = state.session.as_ref().map(DisplaySession::generation);
        if current != Some(generation) {
            state.stats.stale_timer_fires += 1;
            tracing::trace!(generation, ?current, "stale auto-clear ignored");
            return;
        }
        state.session = None;
        state.surface.clear();
        state.stats.auto_clears += 1;
        match state.surface.present() {
            Ok(()) => tracing::debug!(generation, "cue auto-cleared"),
            Err(e) => {
                tracing::error!(error = %e, generation, "present failed during auto-clear");
                state.note_fault(&e);
            }
        }
    }

    /// Remove the active cue. Returns `false` if nothing was active.
    ///
    /// # Errors
    ///
    /// [`SurfaceError`] if presenting the blank frame failed. The cue is
    /// withdrawn regardless.
    pub fn clear(&self) -> Result<bool, SurfaceError> {
        let mut state = self.lock();
        if state.closed || state.session.is_none() {
            return Ok(false);
        }
        state.generation += 1;
        state.session = None;
        state.surface.clear();
        state.stats.clears += 1;
        tracing::debug!(generation = state.generation, "cue cleared");
        if let Err(e) = state.surface.present() {
            state.note_fault(&e);
            return Err(e);
        }
        Ok(true)
    }

    /// Load and install a font. The displayed cue is not redrawn.
    ///
    /// # Errors
    ///
    /// [`FontLoadError`] if the font cannot be loaded; the current font is
    /// kept.
    pub fn set_font(&self, path: &Path, size: u16) -> Result<(), FontLoadError> {
        let font = self.shared.loader.open_font(path, size)?;
        tracing::info!(path = %path.display(), size, line_height = font.line_height, "font set");
        self.lock().font = Some(font);
        Ok(())
    }

    /// Resize the surface and redraw the active cue on it. The active cue's
    /// timer is not restarted.
    ///
    /// # Errors
    ///
    /// - [`DisplayError::Surface`] with [`SurfaceError::UnsupportedSize`] if
    ///   the size was rejected; the previous surface is untouched.
    /// - [`DisplayError::Surface`] with [`SurfaceError::Io`] if presenting
    ///   failed.
    pub fn on_resize(&self, width: u16, height: u16) -> Result<ResizeOutcome, DisplayError> {
        let mut state = self.lock();
        if state.closed {
            tracing::debug!(width, height, "resize rejected: scheduler closed");
            return Ok(ResizeOutcome::Closed);
        }
        state.surface.resize(width, height)?;
        tracing::debug!(width, height, "surface resized");

        match state.session.as_ref().map(|s| Arc::clone(&s.cue)) {
            Some(cue) => {
                self.repaint(&mut state, &cue)?;
                state.stats.repaints += 1;
                Ok(ResizeOutcome::Repainted)
            }
            None => {
                state.surface.clear();
                if let Err(e) = state.surface.present() {
                    state.note_fault(&e);
                    return Err(e.into());
                }
                Ok(ResizeOutcome::Blank)
            }
        }
    }

    /// Shut the scheduler down.
    ///
    /// Later display and resize calls return `Closed`. Pending timers are
    /// woken and joined, and the surface is blanked. Idempotent.
    pub fn close(&self) {
        {
            let mut state = self.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.generation += 1;
            state.session = None;
            state.surface.clear();
            if let Err(e) = state.surface.present() {
                tracing::warn!(error = %e, "present failed while closing");
            }
        }
        self.shared.shutdown_trigger.stop();

        let timers = {
            let mut timers = self.shared.timers.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *timers)
        };
        let count = timers.len();
        for handle in timers {
            if handle.join().is_err() {
                tracing::warn!("auto-clear timer panicked");
            }
        }
        tracing::info!(timers = count, "scheduler closed");
    }

    /// The active cue.
    pub fn current_cue(&self) -> Option<Arc<Cue>> {
        self.lock().session.as_ref().map(|s| Arc::clone(&s.cue))
    }

    /// A snapshot of the active session.
    pub fn session(&self) -> Option<DisplaySession> {
        self.lock().session.clone()
    }

    /// Whether a cue is on screen.
    pub fn is_active(&self) -> bool {
        self.lock().session.is_some()
    }

    /// Whether [`CueScheduler::close`] has run.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// The first fatal surface error, if one has occurred.
    pub fn fault(&self) -> Option<String> {
        self.lock().fault.clone()
    }

    /// The loaded font, if any.
    pub fn font(&self) -> Option<FontConfig> {
        self.lock().font.clone()
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Activity counters.
    pub fn stats(&self) -> SchedulerStats {
        self.lock().stats
    }

    /// The scheduler's configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.shared.config
    }

    /// Inspect the surface under the lock.
    pub fn with_surface<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.lock().surface)
    }
}

fn paint<S: RenderSurface>(
    surface: &mut S,
    image: &GlyphImage,
    anchor: Anchor,
) -> Result<(), SurfaceError> {
    surface.clear();
    if !image.is_empty() {
        let at = anchor.position(surface.size(), (image.width(), image.height()));
        surface.blit(image, at);
    }
    surface.present()
}
