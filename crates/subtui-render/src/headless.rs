#![forbid(unsafe_code)]

//! Headless surface for tests and dry runs.
//!
//! [`HeadlessSurface`] keeps the same cell buffer a terminal surface would,
//! but "presenting" snapshots the buffer as text rows instead of writing
//! escape sequences. Tests assert on the presented frames.

use std::io;

use crate::buffer::{Buffer, Point};
use crate::cell::PackedRgba;
use crate::image::GlyphImage;
use crate::surface::{RenderSurface, SurfaceError, validate_size};

/// A presented frame: one string per row, trailing blanks trimmed.
pub type FrameText = Vec<String>;

/// Counters of surface operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceOps {
    /// Successful resizes.
    pub resizes: u64,
    /// `clear` calls.
    pub clears: u64,
    /// `blit` calls.
    pub blits: u64,
    /// Successful presents.
    pub presents: u64,
}

/// In-memory surface that records presented frames.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    buffer: Buffer,
    frames: Vec<FrameText>,
    ops: SurfaceOps,
    max_size: (u16, u16),
    fail_presents: bool,
}

impl HeadlessSurface {
    /// Create a blank surface.
    ///
    /// # Panics
    ///
    /// Panics if width or height is 0.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            buffer: Buffer::new(width, height),
            frames: Vec::new(),
            ops: SurfaceOps::default(),
            max_size: (u16::MAX, u16::MAX),
            fail_presents: false,
        }
    }

    /// Reject resizes beyond `max_size`, like a display that only supports
    /// some modes.
    #[must_use]
    pub fn with_max_size(mut self, width: u16, height: u16) -> Self {
        self.max_size = (width, height);
        self
    }

    /// Make every subsequent present fail with an I/O error.
    pub fn set_fail_presents(&mut self, fail: bool) {
        self.fail_presents = fail;
    }

    /// All presented frames, oldest first.
    pub fn frames(&self) -> &[FrameText] {
        &self.frames
    }

    /// The most recently presented frame.
    pub fn last_frame(&self) -> Option<&FrameText> {
        self.frames.last()
    }

    /// Whether the last presented frame was blank (or nothing was presented).
    pub fn last_frame_is_blank(&self) -> bool {
        self.last_frame()
            .is_none_or(|frame| frame.iter().all(String::is_empty))
    }

    /// Text of the last presented frame with blank rows removed.
    pub fn visible_text(&self) -> Vec<String> {
        self.last_frame()
            .map(|frame| frame.iter().filter(|r| !r.is_empty()).cloned().collect())
            .unwrap_or_default()
    }

    /// Operation counters.
    pub fn ops(&self) -> SurfaceOps {
        self.ops
    }

    /// The live (not necessarily presented) buffer.
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    fn snapshot(&self) -> FrameText {
        (0..self.buffer.height())
            .map(|y| self.buffer.row_text(y))
            .collect()
    }
}

impl RenderSurface for HeadlessSurface {
    fn size(&self) -> (u16, u16) {
        (self.buffer.width(), self.buffer.height())
    }

    fn resize(&mut self, width: u16, height: u16) -> Result<(), SurfaceError> {
        validate_size(width, height)?;
        if width > self.max_size.0 || height > self.max_size.1 {
            return Err(SurfaceError::UnsupportedSize { width, height });
        }
        self.buffer = Buffer::new(width, height);
        self.ops.resizes += 1;
        Ok(())
    }

    fn clear(&mut self) {
        self.buffer.clear(PackedRgba::TRANSPARENT);
        self.ops.clears += 1;
    }

    fn blit(&mut self, image: &GlyphImage, at: Point) {
        self.buffer.blit(image, at);
        self.ops.blits += 1;
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        if self.fail_presents {
            return Err(SurfaceError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "headless present failure",
            )));
        }
        let frame = self.snapshot();
        self.frames.push(frame);
        self.ops.presents += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    fn text_image(text: &str) -> GlyphImage {
        GlyphImage::from_rows(vec![text.chars().map(Cell::from_char).collect()])
    }

    #[test]
    fn present_snapshots_rows() {
        let mut s = HeadlessSurface::new(8, 2);
        s.blit(&text_image("hi"), Point::new(1, 1));
        s.present().unwrap();
        assert_eq!(s.last_frame(), Some(&vec![String::new(), " hi".to_string()]));
        assert_eq!(s.visible_text(), vec![" hi".to_string()]);
    }

    #[test]
    fn nothing_presented_counts_as_blank() {
        let s = HeadlessSurface::new(2, 2);
        assert!(s.last_frame_is_blank());
        assert!(s.frames().is_empty());
    }

    #[test]
    fn max_size_rejects_without_changing_buffer() {
        let mut s = HeadlessSurface::new(4, 4).with_max_size(10, 10);
        assert!(matches!(
            s.resize(11, 5),
            Err(SurfaceError::UnsupportedSize { width: 11, height: 5 })
        ));
        assert_eq!(s.size(), (4, 4));
        s.resize(10, 10).unwrap();
        assert_eq!(s.ops().resizes, 1);
    }

    #[test]
    fn failing_presents_record_nothing() {
        let mut s = HeadlessSurface::new(2, 1);
        s.set_fail_presents(true);
        let err = s.present().unwrap_err();
        assert!(err.is_fatal());
        assert!(s.frames().is_empty());
    }
}
