#![forbid(unsafe_code)]

//! Wiring: logging, cue loading, surface and supervisor startup, playback.

use std::fmt;
use std::io;

use subtui_core::InputEventSource;
use subtui_core::event_source::{ChannelEventSource, TerminalEventSource};
use subtui_core::logging::{LogConfig, init_logging};
use subtui_core::terminal_session::{SessionOptions, TerminalSession};
use subtui_render::headless::FrameText;
use subtui_render::{
    FileFontLoader, FontLoader, HeadlessSurface, RenderSurface, SurfaceOptions, TerminalSurface,
};
use subtui_runtime::{
    CueScheduler, ExitReason, InitializationError, Playback, PlaybackOutcome, PlaybackReport,
    SchedulerConfig, Supervisor, SupervisorConfig, TimedCue,
};

use crate::cli::Opts;
use crate::srt::{SrtError, load_srt};

/// Anything that ends the program with a non-zero status.
#[derive(Debug)]
pub enum AppError {
    /// The subtitle file could not be loaded.
    Cues(SrtError),
    /// Startup failed before any cue was shown.
    Init(InitializationError),
    /// The supervisor stopped on a fatal error.
    Fatal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Cues(e) => write!(f, "{e}"),
            AppError::Init(e) => write!(f, "{e}"),
            AppError::Fatal(msg) => write!(f, "fatal: {msg}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Cues(e) => Some(e),
            AppError::Init(e) => Some(e),
            AppError::Fatal(_) => None,
        }
    }
}

impl From<SrtError> for AppError {
    fn from(e: SrtError) -> Self {
        AppError::Cues(e)
    }
}

impl From<InitializationError> for AppError {
    fn from(e: InitializationError) -> Self {
        AppError::Init(e)
    }
}

/// Apply command-line choices on top of `base`.
#[must_use]
pub fn scheduler_config(opts: &Opts, base: SchedulerConfig) -> SchedulerConfig {
    let mut config = base;
    if let Some(font) = &opts.font {
        config.default_font_path = font.clone();
    }
    if let Some(size) = opts.font_size {
        config.default_font_size = size;
    }
    config.text_color = opts.color;
    config.anchor = opts.anchor;
    config
}

/// Run the player described by `opts`.
///
/// # Errors
///
/// See [`AppError`].
pub fn run(opts: &Opts) -> Result<ExitReason, AppError> {
    let log = LogConfig::from_env().merged(opts.log_filter.clone(), opts.log_file.clone());
    init_logging(&log).map_err(InitializationError::from)?;

    let cues = load_srt(&opts.srt_path)?;
    let config = scheduler_config(opts, SchedulerConfig::from_env());
    let explicit_font = opts.font.is_some();
    if explicit_font {
        // Fail before the terminal switches screens.
        FileFontLoader
            .open_font(&config.default_font_path, config.default_font_size)
            .map_err(InitializationError::from)?;
    }

    match opts.dry_run {
        Some(size) => {
            let (frames, report) = dry_run(config, &cues, size, explicit_font)?;
            print_frames(&frames);
            tracing::info!(frames = frames.len(), displayed = report.displayed, "dry run done");
            Ok(ExitReason::Shutdown)
        }
        None => run_terminal(config, &cues, explicit_font),
    }
}

fn run_terminal(
    config: SchedulerConfig,
    cues: &[TimedCue],
    explicit_font: bool,
) -> Result<ExitReason, AppError> {
    let session = TerminalSession::new(SessionOptions::fullscreen())
        .map_err(InitializationError::Terminal)?;
    let source = TerminalEventSource::new(session);
    let (width, height) = source.size().map_err(InitializationError::Terminal)?;
    tracing::info!(width, height, "terminal ready");

    let surface = TerminalSurface::new(io::stdout(), width, height, SurfaceOptions::default())
        .map_err(InitializationError::from)?;
    let scheduler = CueScheduler::new(surface, config);
    if explicit_font {
        install_font(&scheduler)?;
    }
    play(scheduler, source, cues).map(|(reason, _)| reason)
}

/// Play `cues` on an in-memory surface of `size` and return every presented
/// frame.
///
/// # Errors
///
/// [`AppError::Init`] if the font or the supervisor thread fails to start.
pub fn dry_run(
    config: SchedulerConfig,
    cues: &[TimedCue],
    (width, height): (u16, u16),
    explicit_font: bool,
) -> Result<(Vec<FrameText>, PlaybackReport), AppError> {
    let scheduler = CueScheduler::new(HeadlessSurface::new(width, height), config);
    if explicit_font {
        install_font(&scheduler)?;
    }
    let (sender, source) = ChannelEventSource::channel();
    let (_, report) = play(scheduler.clone(), source, cues)?;
    drop(sender);
    let frames = scheduler.with_surface(|s| s.frames().to_vec());
    Ok((frames, report))
}

fn install_font<S: RenderSurface + 'static>(scheduler: &CueScheduler<S>) -> Result<(), AppError> {
    let config = scheduler.config();
    scheduler
        .set_font(&config.default_font_path, config.default_font_size)
        .map_err(InitializationError::from)?;
    Ok(())
}

fn play<S, E>(
    scheduler: CueScheduler<S>,
    source: E,
    cues: &[TimedCue],
) -> Result<(ExitReason, PlaybackReport), AppError>
where
    S: RenderSurface + 'static,
    E: InputEventSource + 'static,
{
    let handle = Supervisor::spawn(scheduler.clone(), source, SupervisorConfig::default())
        .map_err(InitializationError::Thread)?;
    let report = Playback::run(&scheduler, cues, &handle.exit_signal());
    if report.outcome == PlaybackOutcome::Finished {
        handle.request_shutdown();
    }
    match handle.join() {
        ExitReason::Fatal(msg) => Err(AppError::Fatal(msg)),
        reason => Ok((reason, report)),
    }
}

fn print_frames(frames: &[FrameText]) {
    for (i, frame) in frames.iter().enumerate() {
        println!("--- frame {} ---", i + 1);
        let used = frame
            .iter()
            .rposition(|row| !row.is_empty())
            .map_or(0, |last| last + 1);
        for row in &frame[..used] {
            println!("{row}");
        }
    }
}
