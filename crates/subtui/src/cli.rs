#![forbid(unsafe_code)]

//! Command-line argument parsing.
//!
//! Parses args manually (no external dependencies) to keep the binary lean.
//! Supports environment variable overrides via the `SUBTUI_*` prefix.

use std::env;
use std::path::PathBuf;
use std::process;

use subtui_render::{Anchor, PackedRgba};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
subtui: play SubRip subtitles in the terminal

USAGE:
    subtui [OPTIONS] <FILE.srt>

OPTIONS:
    --font=PATH          Font file (TrueType/OpenType); loaded at startup
    --font-size=N        Font size in points (default: 16)
    --anchor=POS         Cue position: 'top-left' (default), 'center', 'bottom'
    --color=RRGGBB       Cue text color (default: ffffff)
    --log=FILTER         Log filter, e.g. 'debug' or 'subtui_runtime=trace'
    --log-file=PATH      Write logs to PATH (logs are discarded otherwise)
    --dry-run[=WxH]      Play on an in-memory surface and print each frame
    --help, -h           Show this help message
    --version, -V        Show version

KEYBINDINGS:
    q / Esc / Ctrl+C     Quit

ENVIRONMENT VARIABLES:
    SUBTUI_FONT_PATH     Default font, used when --font is not given
    SUBTUI_FONT_SIZE     Override --font-size
    SUBTUI_ANCHOR        Override --anchor
    SUBTUI_COLOR         Override --color
    SUBTUI_LOG           Override --log
    SUBTUI_LOG_FILE      Override --log-file";

const DEFAULT_DRY_RUN_SIZE: (u16, u16) = (80, 24);

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    /// Subtitle file to play.
    pub srt_path: PathBuf,
    /// Font to load at startup.
    pub font: Option<PathBuf>,
    /// Font size override.
    pub font_size: Option<u16>,
    /// Cue position.
    pub anchor: Anchor,
    /// Cue text color.
    pub color: PackedRgba,
    /// Log filter directive.
    pub log_filter: Option<String>,
    /// Log file.
    pub log_file: Option<PathBuf>,
    /// Surface size for a headless dry run.
    pub dry_run: Option<(u16, u16)>,
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Play subtitles.
    Run(Opts),
    /// Print usage.
    Help,
    /// Print the version.
    Version,
}

impl Opts {
    /// Parse command-line arguments and environment variables, exiting on
    /// `--help`, `--version`, or a usage error.
    ///
    /// Environment variables take precedence over defaults but are
    /// overridden by explicit command-line flags.
    pub fn parse() -> Self {
        match Self::parse_from(env::args().skip(1), |key| env::var(key).ok()) {
            Ok(Command::Run(opts)) => opts,
            Ok(Command::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Command::Version) => {
                println!("subtui {VERSION}");
                process::exit(0);
            }
            Err(msg) => {
                eprintln!("{msg}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    /// Parse `args` with environment values read through `lookup`.
    ///
    /// # Errors
    ///
    /// A usage message for unknown flags, bad values, or a missing file.
    pub fn parse_from(
        args: impl IntoIterator<Item = String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Command, String> {
        let mut font = None;
        let mut font_size = None;
        let mut anchor = Anchor::default();
        let mut color = PackedRgba::WHITE;
        let mut log_filter = lookup("SUBTUI_LOG");
        let mut log_file = lookup("SUBTUI_LOG_FILE").map(PathBuf::from);
        let mut dry_run = None;
        let mut srt_path = None;

        // Apply environment variable defaults first
        if let Some(val) = lookup("SUBTUI_FONT_SIZE")
            && let Ok(n) = val.parse::<u16>()
            && n > 0
        {
            font_size = Some(n);
        }
        if let Some(val) = lookup("SUBTUI_ANCHOR")
            && let Some(a) = Anchor::parse(&val)
        {
            anchor = a;
        }
        if let Some(val) = lookup("SUBTUI_COLOR")
            && let Some(c) = PackedRgba::from_hex(&val)
        {
            color = c;
        }

        // Parse command-line args (override env vars)
        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => return Ok(Command::Help),
                "--version" | "-V" => return Ok(Command::Version),
                "--dry-run" => dry_run = Some(DEFAULT_DRY_RUN_SIZE),
                other => {
                    if let Some(val) = other.strip_prefix("--font=") {
                        font = Some(PathBuf::from(val));
                    } else if let Some(val) = other.strip_prefix("--font-size=") {
                        match val.parse::<u16>() {
                            Ok(n) if n > 0 => font_size = Some(n),
                            _ => return Err(format!("Invalid --font-size value: {val}")),
                        }
                    } else if let Some(val) = other.strip_prefix("--anchor=") {
                        anchor = Anchor::parse(val)
                            .ok_or_else(|| format!("Invalid --anchor value: {val}"))?;
                    } else if let Some(val) = other.strip_prefix("--color=") {
                        color = PackedRgba::from_hex(val)
                            .ok_or_else(|| format!("Invalid --color value: {val}"))?;
                    } else if let Some(val) = other.strip_prefix("--log=") {
                        log_filter = Some(val.to_string());
                    } else if let Some(val) = other.strip_prefix("--log-file=") {
                        log_file = Some(PathBuf::from(val));
                    } else if let Some(val) = other.strip_prefix("--dry-run=") {
                        dry_run = Some(
                            parse_size(val)
                                .ok_or_else(|| format!("Invalid --dry-run size: {val}"))?,
                        );
                    } else if other.starts_with('-') && other != "-" {
                        return Err(format!("Unknown argument: {other}"));
                    } else if srt_path.is_some() {
                        return Err(format!("Unexpected extra argument: {other}"));
                    } else {
                        srt_path = Some(PathBuf::from(other));
                    }
                }
            }
        }

        let srt_path = srt_path.ok_or_else(|| "Missing subtitle file argument".to_string())?;
        Ok(Command::Run(Opts {
            srt_path,
            font,
            font_size,
            anchor,
            color,
            log_filter,
            log_file,
            dry_run,
        }))
    }
}

/// `WxH`, both non-zero.
fn parse_size(text: &str) -> Option<(u16, u16)> {
    let (w, h) = text.split_once(['x', 'X'])?;
    let w = w.parse().ok().filter(|&w: &u16| w > 0)?;
    let h = h.parse().ok().filter(|&h: &u16| h > 0)?;
    Some((w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn run(list: &[&str]) -> Opts {
        match Opts::parse_from(args(list), no_env) {
            Ok(Command::Run(opts)) => opts,
            other => panic!("unexpected parse result: {other:?}"),
        }
    }

    #[test]
    fn defaults() {
        let opts = run(&["movie.srt"]);
        assert_eq!(opts.srt_path, PathBuf::from("movie.srt"));
        assert_eq!(opts.font, None);
        assert_eq!(opts.font_size, None);
        assert_eq!(opts.anchor, Anchor::TopLeft);
        assert_eq!(opts.color, PackedRgba::WHITE);
        assert_eq!(opts.dry_run, None);
    }

    #[test]
    fn flags() {
        let opts = run(&[
            "--font=/f/a.ttf",
            "--font-size=24",
            "--anchor=bottom",
            "--color=#ff8800",
            "--log=debug",
            "--log-file=/tmp/subtui.log",
            "--dry-run=40x10",
            "movie.srt",
        ]);
        assert_eq!(opts.font, Some(PathBuf::from("/f/a.ttf")));
        assert_eq!(opts.font_size, Some(24));
        assert_eq!(opts.anchor, Anchor::BottomCenter);
        assert_eq!(opts.color, PackedRgba::rgb(0xff, 0x88, 0x00));
        assert_eq!(opts.log_filter.as_deref(), Some("debug"));
        assert_eq!(opts.log_file, Some(PathBuf::from("/tmp/subtui.log")));
        assert_eq!(opts.dry_run, Some((40, 10)));
    }

    #[test]
    fn flags_override_env() {
        let env = |key: &str| match key {
            "SUBTUI_ANCHOR" => Some("center".to_string()),
            "SUBTUI_FONT_SIZE" => Some("30".to_string()),
            _ => None,
        };
        let Ok(Command::Run(opts)) = Opts::parse_from(args(&["--anchor=bottom", "x.srt"]), env)
        else {
            panic!("expected run");
        };
        assert_eq!(opts.anchor, Anchor::BottomCenter);
        assert_eq!(opts.font_size, Some(30));
    }

    #[test]
    fn help_and_version_win() {
        assert_eq!(Opts::parse_from(args(&["-h"]), no_env), Ok(Command::Help));
        assert_eq!(
            Opts::parse_from(args(&["x.srt", "--version"]), no_env),
            Ok(Command::Version)
        );
    }

    #[test]
    fn usage_errors() {
        for bad in [
            &["--font-size=0", "x.srt"][..],
            &["--anchor=left", "x.srt"],
            &["--color=blue", "x.srt"],
            &["--dry-run=80", "x.srt"],
            &["--bogus", "x.srt"],
            &["a.srt", "b.srt"],
            &[],
        ] {
            assert!(Opts::parse_from(args(bad), no_env).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn help_text_lists_env_vars() {
        assert!(HELP_TEXT.contains("SUBTUI_FONT_PATH"));
        assert!(HELP_TEXT.contains("--dry-run"));
        assert!(!VERSION.is_empty());
    }
}
