#![forbid(unsafe_code)]

//! Playback timeline.
//!
//! [`Playback::run`] drives [`CueScheduler::display`] from the calling
//! thread: it sleeps until each cue's start offset, displays the cue, and
//! after the last one waits for the longest-running cue to end. The
//! scheduler's own timers do the clearing. Every wait goes through a
//! [`StopSignal`], so a quit observed elsewhere ends playback promptly. A
//! fatal surface error ends playback at once.

use std::time::{Duration, Instant};

use subtui_render::RenderSurface;

use crate::cue::TimedCue;
use crate::scheduler::{CueScheduler, DisplayOutcome};
use crate::stop::StopSignal;

/// How playback ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Every cue was shown and its duration elapsed.
    Finished,
    /// The stop signal fired or the scheduler closed first.
    Stopped,
    /// Displaying a cue hit a fatal surface error.
    Fatal,
}

/// Summary of a playback run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackReport {
    /// How playback ended.
    pub outcome: PlaybackOutcome,
    /// Cues that started a display session.
    pub displayed: usize,
    /// Display calls that returned an error.
    pub errors: usize,
}

/// Plays a list of timed cues.
#[derive(Debug, Clone, Copy, Default)]
pub struct Playback;

impl Playback {
    /// Play `cues` in order, timed from now.
    ///
    /// Cues are taken in the order given; an entry whose start has already
    /// passed is shown immediately. Recoverable display errors are logged
    /// and playback continues; a fatal one ends it with
    /// [`PlaybackOutcome::Fatal`].
    pub fn run<S: RenderSurface + 'static>(
        scheduler: &CueScheduler<S>,
        cues: &[TimedCue],
        stop: &StopSignal,
    ) -> PlaybackReport {
        let origin = Instant::now();
        let mut report = PlaybackReport {
            outcome: PlaybackOutcome::Finished,
            displayed: 0,
            errors: 0,
        };
        tracing::info!(cues = cues.len(), "playback started");

        let mut end = Duration::ZERO;
        for (index, entry) in cues.iter().enumerate() {
            if wait_until(origin, entry.start, stop) {
                return stopped(report);
            }
            match scheduler.display(entry.cue.clone()) {
                Ok(DisplayOutcome::Rendered) => report.displayed += 1,
                Ok(DisplayOutcome::Closed) => {
                    tracing::debug!(index, "scheduler closed during playback");
                    return stopped(report);
                }
                Ok(outcome) => tracing::debug!(index, ?outcome, "cue not re-rendered"),
                Err(e) if e.is_fatal() => {
                    report.errors += 1;
                    report.outcome = PlaybackOutcome::Fatal;
                    tracing::error!(
                        error = %e,
                        index,
                        displayed = report.displayed,
                        "playback aborted"
                    );
                    return report;
                }
                Err(e) => {
                    report.errors += 1;
                    tracing::warn!(error = %e, index, "cue display failed");
                }
            }
            end = end.max(entry.end());
        }

        if wait_until(origin, end, stop) {
            return stopped(report);
        }
        tracing::info!(displayed = report.displayed, errors = report.errors, "playback finished");
        report
    }
}

/// Sleep until `origin + offset`. Returns `true` if stopped first.
fn wait_until(origin: Instant, offset: Duration, stop: &StopSignal) -> bool {
    let remaining = offset.saturating_sub(origin.elapsed());
    if remaining.is_zero() {
        return stop.is_stopped();
    }
    stop.wait_timeout(remaining)
}

fn stopped(mut report: PlaybackReport) -> PlaybackReport {
    report.outcome = PlaybackOutcome::Stopped;
    tracing::info!(displayed = report.displayed, "playback stopped");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Arc;
    use subtui_render::{
        CellGlyphRenderer, FontConfig, FontLoadError, FontLoader, HeadlessSurface,
    };

    use crate::config::SchedulerConfig;
    use crate::cue::Cue;

    struct AcceptAll;

    impl FontLoader for AcceptAll {
        fn open_font(&self, path: &Path, size: u16) -> Result<FontConfig, FontLoadError> {
            Ok(FontConfig::new(path, size))
        }
    }

    fn scheduler() -> CueScheduler<HeadlessSurface> {
        CueScheduler::with_parts(
            HeadlessSurface::new(20, 4),
            SchedulerConfig::default(),
            Box::new(CellGlyphRenderer),
            Box::new(AcceptAll),
        )
    }

    fn timed(start_ms: u64, text: &str, duration_ms: u64) -> TimedCue {
        TimedCue::new(
            Duration::from_millis(start_ms),
            Cue::shared(text, Duration::from_millis(duration_ms)),
        )
    }

    #[test]
    fn plays_every_cue_and_waits_for_the_last() {
        let s = scheduler();
        let (stop, _trigger) = StopSignal::new();
        let cues = vec![timed(0, "one", 20), timed(30, "two", 40)];
        let start = Instant::now();
        let report = Playback::run(&s, &cues, &stop);
        assert!(start.elapsed() >= Duration::from_millis(70));
        assert_eq!(report.outcome, PlaybackOutcome::Finished);
        assert_eq!(report.displayed, 2);
        assert_eq!(report.errors, 0);
        let frames = s.with_surface(|h| h.frames().to_vec());
        assert!(frames.iter().any(|f| f[0] == "one"));
        assert!(frames.iter().any(|f| f[0] == "two"));
        s.close();
    }

    #[test]
    fn stop_signal_ends_playback() {
        let s = scheduler();
        let (stop, trigger) = StopSignal::new();
        let cues = vec![timed(0, "a", 10), timed(60_000, "b", 10)];
        let waker = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            trigger.stop();
        });
        let start = Instant::now();
        let report = Playback::run(&s, &cues, &stop);
        waker.join().unwrap();
        assert!(start.elapsed() < Duration::from_secs(10));
        assert_eq!(report.outcome, PlaybackOutcome::Stopped);
        assert_eq!(report.displayed, 1);
        s.close();
    }

    #[test]
    fn closed_scheduler_stops_playback() {
        let s = scheduler();
        s.close();
        let (stop, _trigger) = StopSignal::new();
        let report = Playback::run(&s, &[timed(0, "a", 10)], &stop);
        assert_eq!(report.outcome, PlaybackOutcome::Stopped);
        assert_eq!(report.displayed, 0);
    }

    #[test]
    fn fatal_surface_error_aborts_timeline() {
        let mut surface = HeadlessSurface::new(20, 4);
        surface.set_fail_presents(true);
        let s = CueScheduler::with_parts(
            surface,
            SchedulerConfig::default(),
            Box::new(CellGlyphRenderer),
            Box::new(AcceptAll),
        );
        let (stop, _trigger) = StopSignal::new();
        let cues: Vec<_> = (0..5).map(|i| timed(i * 100, "x", 50)).collect();
        let start = Instant::now();
        let report = Playback::run(&s, &cues, &stop);
        assert!(start.elapsed() < Duration::from_millis(100));
        assert_eq!(report.outcome, PlaybackOutcome::Fatal);
        assert_eq!(report.errors, 1);
        assert!(s.fault().is_some());
        s.close();
    }

    #[test]
    fn repeated_entry_for_active_cue_is_not_counted() {
        let s = scheduler();
        let (stop, _trigger) = StopSignal::new();
        let cue = Cue::shared("same", Duration::from_millis(50));
        let cues = vec![
            TimedCue::new(Duration::ZERO, Arc::clone(&cue)),
            TimedCue::new(Duration::from_millis(5), cue),
        ];
        let report = Playback::run(&s, &cues, &stop);
        assert_eq!(report.displayed, 1);
        assert_eq!(s.stats().renders, 1);
        s.close();
    }
}
