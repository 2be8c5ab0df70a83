//! A broken surface ends playback and the supervisor with a fatal exit.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use subtui_core::event_source::ChannelEventSource;
use subtui_render::{GlyphImage, HeadlessSurface, Point, RenderSurface, SurfaceError};
use subtui_runtime::{
    Cue, CueScheduler, ExitReason, Playback, PlaybackOutcome, SchedulerConfig, Supervisor,
    SupervisorConfig, TimedCue,
};

fn font_fixture() -> (tempfile::TempDir, SchedulerConfig) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixture.otf");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(b"OTTO\0\0\0\0").unwrap();
    let config = SchedulerConfig {
        default_font_path: path,
        default_font_size: 12,
        ..SchedulerConfig::default()
    };
    (dir, config)
}

fn broken_surface() -> HeadlessSurface {
    let mut surface = HeadlessSurface::new(20, 4);
    surface.set_fail_presents(true);
    surface
}

fn poll() -> SupervisorConfig {
    SupervisorConfig {
        poll_interval: Duration::from_millis(10),
    }
}

fn timeline(count: u64, gap_ms: u64) -> Vec<TimedCue> {
    (0..count)
        .map(|i| {
            TimedCue::new(
                Duration::from_millis(i * gap_ms),
                Cue::shared(format!("cue {i}"), Duration::from_millis(gap_ms / 2)),
            )
        })
        .collect()
}

#[test]
fn failing_present_during_playback_exits_fatal() {
    let (_dir, config) = font_fixture();
    let s = CueScheduler::new(broken_surface(), config);
    let (_tx, source) = ChannelEventSource::channel();
    let handle = Supervisor::spawn(s.clone(), source, poll()).unwrap();

    let start = Instant::now();
    let report = Playback::run(&s, &timeline(5, 100), &handle.exit_signal());
    assert!(start.elapsed() < Duration::from_millis(300));
    assert_eq!(report.outcome, PlaybackOutcome::Fatal);
    assert_eq!(report.displayed, 0);

    match handle.join() {
        ExitReason::Fatal(msg) => assert!(msg.contains("headless present failure"), "{msg}"),
        other => panic!("unexpected exit: {other:?}"),
    }
    assert!(s.is_closed());
}

/// Presents succeed until the shared flag is set.
struct Breakable {
    inner: HeadlessSurface,
    broken: Arc<AtomicBool>,
}

impl RenderSurface for Breakable {
    fn size(&self) -> (u16, u16) {
        self.inner.size()
    }

    fn resize(&mut self, width: u16, height: u16) -> Result<(), SurfaceError> {
        self.inner.resize(width, height)
    }

    fn clear(&mut self) {
        self.inner.clear();
    }

    fn blit(&mut self, image: &GlyphImage, at: Point) {
        self.inner.blit(image, at);
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(SurfaceError::Io(io::Error::other("terminal gone")));
        }
        self.inner.present()
    }
}

#[test]
fn failing_auto_clear_stops_waiting_playback() {
    let (_dir, config) = font_fixture();
    let broken = Arc::new(AtomicBool::new(false));
    let surface = Breakable {
        inner: HeadlessSurface::new(20, 4),
        broken: Arc::clone(&broken),
    };
    let s = CueScheduler::new(surface, config);
    let (_tx, source) = ChannelEventSource::channel();
    let handle = Supervisor::spawn(s.clone(), source, poll()).unwrap();

    // The first cue clears long before the second is due.
    let cues = [
        TimedCue::new(Duration::ZERO, Cue::shared("first", Duration::from_millis(80))),
        TimedCue::new(Duration::from_secs(60), Cue::shared("second", Duration::from_secs(1))),
    ];
    let breaker = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        broken.store(true, Ordering::SeqCst);
    });

    let start = Instant::now();
    let report = Playback::run(&s, &cues, &handle.exit_signal());
    breaker.join().unwrap();
    assert!(start.elapsed() < Duration::from_secs(10));
    assert_eq!(report.outcome, PlaybackOutcome::Stopped);
    assert_eq!(report.displayed, 1);
    match handle.join() {
        ExitReason::Fatal(msg) => assert!(msg.contains("terminal gone"), "{msg}"),
        other => panic!("unexpected exit: {other:?}"),
    }
    assert!(s.is_closed());
    assert_eq!(s.stats().auto_clears, 1);
}
