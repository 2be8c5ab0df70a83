#![forbid(unsafe_code)]

//! SubRip (`.srt`) cue source.
//!
//! ```text
//! 1
//! 00:00:01,000 --> 00:00:04,000
//! First line
//! Second line
//!
//! 2
//! ...
//! ```
//!
//! Blocks are separated by blank lines. The index line is optional; the
//! timing line accepts `,` or `.` before the milliseconds and ignores any
//! trailing position hints. A UTF-8 BOM and CRLF line endings are accepted.
//! Cues are returned sorted by start time.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use subtui_runtime::{Cue, TimedCue};

const ARROW: &str = "-->";

/// Failure to read or parse an SRT file.
#[derive(Debug)]
pub enum SrtError {
    /// The file could not be read.
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// A block has no `start --> end` line.
    MissingTiming {
        /// 1-based line number of the block start.
        line: usize,
    },
    /// A timestamp is malformed.
    InvalidTimestamp {
        /// 1-based line number.
        line: usize,
        /// The offending text.
        text: String,
    },
    /// The end timestamp precedes the start.
    EndBeforeStart {
        /// 1-based line number.
        line: usize,
    },
}

impl fmt::Display for SrtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SrtError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            SrtError::MissingTiming { line } => write!(f, "line {line}: missing timing line"),
            SrtError::InvalidTimestamp { line, text } => {
                write!(f, "line {line}: invalid timestamp {text:?}")
            }
            SrtError::EndBeforeStart { line } => {
                write!(f, "line {line}: cue ends before it starts")
            }
        }
    }
}

impl std::error::Error for SrtError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SrtError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Read and parse an SRT file.
///
/// # Errors
///
/// [`SrtError::Io`] if the file cannot be read (or is not UTF-8), otherwise
/// any parse error from [`parse_srt`].
pub fn load_srt(path: &Path) -> Result<Vec<TimedCue>, SrtError> {
    let text = fs::read_to_string(path).map_err(|source| SrtError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let cues = parse_srt(&text)?;
    tracing::info!(path = %path.display(), cues = cues.len(), "subtitles loaded");
    Ok(cues)
}

/// Parse SRT text into timeline entries sorted by start.
///
/// # Errors
///
/// The first malformed block, with its line number.
pub fn parse_srt(input: &str) -> Result<Vec<TimedCue>, SrtError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut cues = Vec::new();
    let mut block: Vec<(usize, &str)> = Vec::new();

    for (i, raw) in input.split('\n').enumerate() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if line.trim().is_empty() {
            if !block.is_empty() {
                cues.push(parse_block(&block)?);
                block.clear();
            }
        } else {
            block.push((i + 1, line));
        }
    }
    if !block.is_empty() {
        cues.push(parse_block(&block)?);
    }

    cues.sort_by_key(|c: &TimedCue| c.start);
    Ok(cues)
}

fn parse_block(block: &[(usize, &str)]) -> Result<TimedCue, SrtError> {
    let first_line = block[0].0;
    let timing_at = block
        .iter()
        .take(2)
        .position(|(_, l)| l.contains(ARROW))
        .ok_or(SrtError::MissingTiming { line: first_line })?;
    let (line, timing) = block[timing_at];

    let (start_text, rest) = timing
        .split_once(ARROW)
        .ok_or(SrtError::MissingTiming { line })?;
    let end_text = rest.split_whitespace().next().unwrap_or("");
    let start = parse_timestamp(start_text.trim(), line)?;
    let end = parse_timestamp(end_text, line)?;
    let duration = end
        .checked_sub(start)
        .ok_or(SrtError::EndBeforeStart { line })?;

    let text = block[timing_at + 1..]
        .iter()
        .map(|(_, l)| *l)
        .collect::<Vec<_>>()
        .join("\n");
    Ok(TimedCue::new(start, Cue::shared(text, duration)))
}

/// `HH:MM:SS,mmm` or `HH:MM:SS.mmm`. Hours may have any number of digits.
fn parse_timestamp(text: &str, line: usize) -> Result<Duration, SrtError> {
    let invalid = || SrtError::InvalidTimestamp {
        line,
        text: text.to_string(),
    };
    let (clock, millis) = text.split_once([',', '.']).ok_or_else(invalid)?;
    let mut parts = clock.split(':');
    let (Some(h), Some(m), Some(s), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };
    let field = |t: &str, max: u64| -> Option<u64> {
        if t.is_empty() || !t.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        t.parse::<u64>().ok().filter(|&v| v <= max)
    };
    let hours = field(h, u64::from(u32::MAX)).ok_or_else(invalid)?;
    let minutes = field(m, 59).ok_or_else(invalid)?;
    let seconds = field(s, 59).ok_or_else(invalid)?;
    if millis.len() > 3 {
        return Err(invalid());
    }
    // "5" after the separator means 500 ms.
    let millis = field(millis, 999).ok_or_else(invalid)? * 10u64.pow(3 - millis.len() as u32);

    let total_ms = ((hours * 60 + minutes) * 60 + seconds) * 1000 + millis;
    Ok(Duration::from_millis(total_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps() {
        assert_eq!(
            parse_timestamp("01:02:03,456", 1).unwrap(),
            Duration::from_millis(3_723_456)
        );
        assert_eq!(
            parse_timestamp("00:00:01.5", 1).unwrap(),
            Duration::from_millis(1500)
        );
        assert_eq!(
            parse_timestamp("100:00:00,000", 1).unwrap(),
            Duration::from_secs(360_000)
        );
    }

    #[test]
    fn bad_timestamps() {
        for bad in ["00:00:01", "00:61:00,000", "0:0:0:0,0", "aa:00:00,000", "00:00:00,1234", "00:00:00,"] {
            assert!(
                matches!(parse_timestamp(bad, 7), Err(SrtError::InvalidTimestamp { line: 7, .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn index_line_is_optional() {
        let cues = parse_srt("00:00:01,000 --> 00:00:02,000\nno index\n").unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].cue.text(), "no index");
    }

    #[test]
    fn position_hints_are_ignored() {
        let cues =
            parse_srt("1\n00:00:01,000 --> 00:00:02,500 X1:10 X2:20 Y1:5 Y2:6\nhi\n").unwrap();
        assert_eq!(cues[0].cue.duration(), Duration::from_millis(1500));
    }

    #[test]
    fn cue_without_text_is_kept() {
        let cues = parse_srt("1\n00:00:01,000 --> 00:00:02,000\n").unwrap();
        assert_eq!(cues[0].cue.text(), "");
    }
}
