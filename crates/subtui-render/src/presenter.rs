#![forbid(unsafe_code)]

//! Presenter: state-tracked ANSI emission.
//!
//! The presenter writes a whole [`Buffer`] to the terminal. Subtitle frames
//! change rarely and completely (a cue appears, a cue disappears), so every
//! present repaints the full grid; what the presenter does track is the
//! current style, so SGR sequences are only emitted when colors change.
//!
//! # Frame layout
//!
//! 1. Begin synchronized output (DEC 2026) if enabled
//! 2. For each row: `CUP row;1`, then the row's cells
//! 3. Reset style
//! 4. End synchronized output
//! 5. Flush once

use std::io::{self, BufWriter, Write};

use crate::buffer::Buffer;
use crate::cell::{Cell, PackedRgba};

/// Size of the internal write buffer (64KB).
const BUFFER_CAPACITY: usize = 64 * 1024;

const SGR_RESET: &[u8] = b"\x1b[0m";
const SYNC_BEGIN: &[u8] = b"\x1b[?2026h";
const SYNC_END: &[u8] = b"\x1b[?2026l";
const ERASE_DISPLAY: &[u8] = b"\x1b[2J";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellStyle {
    fg: PackedRgba,
    bg: PackedRgba,
}

impl CellStyle {
    fn from_cell(cell: &Cell) -> Self {
        Self {
            fg: cell.fg,
            bg: cell.bg,
        }
    }
}

/// State-tracked ANSI presenter.
#[derive(Debug)]
pub struct Presenter<W: Write> {
    writer: BufWriter<W>,
    current_style: Option<CellStyle>,
    sync_output: bool,
    frames: u64,
}

impl<W: Write> Presenter<W> {
    /// Create a presenter writing to `writer`.
    ///
    /// `sync_output` wraps each frame in DEC 2026 begin/end markers.
    pub fn new(writer: W, sync_output: bool) -> Self {
        Self {
            writer: BufWriter::with_capacity(BUFFER_CAPACITY, writer),
            current_style: None,
            sync_output,
            frames: 0,
        }
    }

    /// Number of frames presented so far.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Write the whole buffer and flush.
    pub fn present(&mut self, buffer: &Buffer) -> io::Result<()> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "present",
            width = buffer.width(),
            height = buffer.height()
        )
        .entered();

        if self.sync_output {
            self.writer.write_all(SYNC_BEGIN)?;
        }

        for (y, row) in buffer.rows().enumerate() {
            write!(self.writer, "\x1b[{};1H", y + 1)?;
            for cell in row {
                self.emit_cell(cell)?;
            }
        }

        self.writer.write_all(SGR_RESET)?;
        self.current_style = None;

        if self.sync_output {
            self.writer.write_all(SYNC_END)?;
        }
        self.frames += 1;

        #[cfg(feature = "tracing")]
        tracing::trace!(frame = self.frames, "frame presented");
        self.writer.flush()
    }

    /// Erase the whole display. Used after a resize, when the terminal may
    /// hold reflowed garbage outside the new grid.
    pub fn erase(&mut self) -> io::Result<()> {
        self.writer.write_all(SGR_RESET)?;
        self.writer.write_all(ERASE_DISPLAY)?;
        self.current_style = None;
        self.writer.flush()
    }

    /// Borrow the underlying writer.
    pub fn get_ref(&self) -> &W {
        self.writer.get_ref()
    }

    fn emit_cell(&mut self, cell: &Cell) -> io::Result<()> {
        if cell.is_continuation() {
            return Ok(());
        }
        self.emit_style_changes(cell)?;
        let mut buf = [0u8; 4];
        let ch = if cell.ch.is_control() { ' ' } else { cell.ch };
        self.writer.write_all(ch.encode_utf8(&mut buf).as_bytes())
    }

    fn emit_style_changes(&mut self, cell: &Cell) -> io::Result<()> {
        let new_style = CellStyle::from_cell(cell);
        if self.current_style == Some(new_style) {
            return Ok(());
        }
        // Reset + apply: simpler than tracking individual SGR deltas.
        self.writer.write_all(SGR_RESET)?;
        if new_style.fg.a() > 0 {
            let c = new_style.fg;
            write!(self.writer, "\x1b[38;2;{};{};{}m", c.r(), c.g(), c.b())?;
        }
        if new_style.bg.a() > 0 {
            let c = new_style.bg;
            write!(self.writer, "\x1b[48;2;{};{};{}m", c.r(), c.g(), c.b())?;
        }
        self.current_style = Some(new_style);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Point;
    use crate::image::GlyphImage;

    fn presented(buffer: &Buffer, sync: bool) -> String {
        let mut presenter = Presenter::new(Vec::new(), sync);
        presenter.present(buffer).unwrap();
        String::from_utf8(presenter.get_ref().clone()).unwrap()
    }

    #[test]
    fn every_row_is_positioned() {
        let buf = Buffer::new(2, 3);
        let out = presented(&buf, false);
        assert!(out.contains("\x1b[1;1H"));
        assert!(out.contains("\x1b[3;1H"));
        assert!(out.ends_with("\x1b[0m"));
    }

    #[test]
    fn sync_markers_wrap_the_frame() {
        let out = presented(&Buffer::new(1, 1), true);
        assert!(out.starts_with("\x1b[?2026h"));
        assert!(out.ends_with("\x1b[?2026l"));
    }

    #[test]
    fn style_is_emitted_once_per_run() {
        let mut buf = Buffer::new(4, 1);
        let cells = "abcd"
            .chars()
            .map(|c| Cell::from_char(c).with_fg(PackedRgba::rgb(1, 2, 3)))
            .collect();
        buf.blit(&GlyphImage::from_rows(vec![cells]), Point::ORIGIN);
        let out = presented(&buf, false);
        assert_eq!(out.matches("\x1b[38;2;1;2;3m").count(), 1);
        assert!(out.contains("abcd"));
    }

    #[test]
    fn continuation_cells_are_skipped() {
        let mut buf = Buffer::new(3, 1);
        let wide = Cell::from_char('漢').with_width(2);
        buf.blit(
            &GlyphImage::from_rows(vec![vec![wide, Cell::CONTINUATION]]),
            Point::ORIGIN,
        );
        let out = presented(&buf, false);
        assert_eq!(out.matches('漢').count(), 1);
        assert!(!out.contains('\0'));
    }

    #[test]
    fn frame_counter_advances() {
        let mut presenter = Presenter::new(Vec::new(), false);
        let buf = Buffer::new(1, 1);
        presenter.present(&buf).unwrap();
        presenter.present(&buf).unwrap();
        assert_eq!(presenter.frames(), 2);
    }
}
