#![forbid(unsafe_code)]

//! Render surfaces.
//!
//! A [`RenderSurface`] owns a cell buffer and knows how to show it. The
//! operations are deliberately coarse (clear, blit, present) and every one
//! of them is idempotent to repeat, so a caller that fails halfway through a
//! frame can simply redo the frame.
//!
//! Resizing allocates a fresh buffer. An unsupported size is rejected
//! without touching the current buffer: the surface stays valid and keeps
//! its old dimensions.

use std::fmt;
use std::io::{self, Write};

use crate::buffer::{Buffer, Point};
use crate::cell::PackedRgba;
use crate::image::GlyphImage;
use crate::presenter::Presenter;

/// Largest accepted width or height, in cells.
pub const MAX_SURFACE_DIMENSION: u16 = 4096;

/// Failure of a surface operation.
#[derive(Debug)]
pub enum SurfaceError {
    /// The requested dimensions cannot be used. Recoverable: the previous
    /// surface is still valid.
    UnsupportedSize {
        /// Requested width.
        width: u16,
        /// Requested height.
        height: u16,
    },
    /// Writing to the device failed.
    Io(io::Error),
}

impl SurfaceError {
    /// Whether the surface can no longer be trusted.
    ///
    /// Rejected resizes are not fatal; device I/O failures are.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, SurfaceError::Io(_))
    }
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceError::UnsupportedSize { width, height } => {
                write!(f, "unsupported surface size {width}x{height}")
            }
            SurfaceError::Io(e) => write!(f, "surface I/O error: {e}"),
        }
    }
}

impl std::error::Error for SurfaceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SurfaceError::Io(e) => Some(e),
            SurfaceError::UnsupportedSize { .. } => None,
        }
    }
}

impl From<io::Error> for SurfaceError {
    fn from(e: io::Error) -> Self {
        SurfaceError::Io(e)
    }
}

/// Check a requested size against the accepted range.
///
/// # Errors
///
/// [`SurfaceError::UnsupportedSize`] for zero or oversized dimensions.
pub fn validate_size(width: u16, height: u16) -> Result<(), SurfaceError> {
    if width == 0 || height == 0 || width > MAX_SURFACE_DIMENSION || height > MAX_SURFACE_DIMENSION
    {
        return Err(SurfaceError::UnsupportedSize { width, height });
    }
    Ok(())
}

/// A resizable target for rendered cues.
pub trait RenderSurface: Send {
    /// Current (width, height) in cells.
    fn size(&self) -> (u16, u16);

    /// Reallocate the surface at a new size. The new surface is blank.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::UnsupportedSize`] leaves the current surface intact.
    fn resize(&mut self, width: u16, height: u16) -> Result<(), SurfaceError>;

    /// Fill the surface with its background.
    fn clear(&mut self);

    /// Draw `image` with its top-left corner at `at`, clipped to the surface.
    fn blit(&mut self, image: &GlyphImage, at: Point);

    /// Make the current contents visible.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::Io`] if the device rejects the frame.
    fn present(&mut self) -> Result<(), SurfaceError>;
}

impl<S: RenderSurface + ?Sized> RenderSurface for Box<S> {
    fn size(&self) -> (u16, u16) {
        (**self).size()
    }

    fn resize(&mut self, width: u16, height: u16) -> Result<(), SurfaceError> {
        (**self).resize(width, height)
    }

    fn clear(&mut self) {
        (**self).clear();
    }

    fn blit(&mut self, image: &GlyphImage, at: Point) {
        (**self).blit(image, at);
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        (**self).present()
    }
}

/// Where an image sits on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Anchor {
    /// Top-left corner.
    #[default]
    TopLeft,
    /// Centered both ways.
    Center,
    /// Horizontally centered on the bottom rows.
    BottomCenter,
}

impl Anchor {
    /// Parse `top-left`, `center`, or `bottom` (case-insensitive).
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "top-left" | "topleft" | "top" => Some(Anchor::TopLeft),
            "center" | "centre" | "middle" => Some(Anchor::Center),
            "bottom" | "bottom-center" | "bottomcenter" => Some(Anchor::BottomCenter),
            _ => None,
        }
    }

    /// Top-left position of an image of `image` size on a surface of
    /// `surface` size. Images larger than the surface are pinned to the
    /// top-left edge of the overflowing axis.
    #[must_use]
    pub fn position(self, surface: (u16, u16), image: (u16, u16)) -> Point {
        let slack_x = surface.0.saturating_sub(image.0);
        let slack_y = surface.1.saturating_sub(image.1);
        match self {
            Anchor::TopLeft => Point::ORIGIN,
            Anchor::Center => Point::new(slack_x / 2, slack_y / 2),
            Anchor::BottomCenter => Point::new(slack_x / 2, slack_y),
        }
    }
}

/// Options for [`TerminalSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceOptions {
    /// Color used by `clear`. Transparent means the terminal default.
    pub background: PackedRgba,
    /// Wrap frames in DEC 2026 synchronized output markers.
    pub sync_output: bool,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            background: PackedRgba::TRANSPARENT,
            sync_output: true,
        }
    }
}

/// Surface that presents to a terminal through ANSI sequences.
#[derive(Debug)]
pub struct TerminalSurface<W: Write> {
    buffer: Buffer,
    presenter: Presenter<W>,
    background: PackedRgba,
    erase_pending: bool,
}

impl<W: Write + Send> TerminalSurface<W> {
    /// Create a surface of the given size.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::UnsupportedSize`] for invalid dimensions.
    pub fn new(
        writer: W,
        width: u16,
        height: u16,
        options: SurfaceOptions,
    ) -> Result<Self, SurfaceError> {
        validate_size(width, height)?;
        let mut buffer = Buffer::new(width, height);
        buffer.clear(options.background);
        Ok(Self {
            buffer,
            presenter: Presenter::new(writer, options.sync_output),
            background: options.background,
            erase_pending: true,
        })
    }

    /// The backing buffer.
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Borrow the output writer.
    pub fn writer(&self) -> &W {
        self.presenter.get_ref()
    }
}

impl<W: Write + Send> RenderSurface for TerminalSurface<W> {
    fn size(&self) -> (u16, u16) {
        (self.buffer.width(), self.buffer.height())
    }

    fn resize(&mut self, width: u16, height: u16) -> Result<(), SurfaceError> {
        validate_size(width, height)?;
        let mut buffer = Buffer::new(width, height);
        buffer.clear(self.background);
        self.buffer = buffer;
        self.erase_pending = true;
        Ok(())
    }

    fn clear(&mut self) {
        self.buffer.clear(self.background);
    }

    fn blit(&mut self, image: &GlyphImage, at: Point) {
        self.buffer.blit(image, at);
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        if self.erase_pending {
            self.presenter.erase()?;
            self.erase_pending = false;
        }
        self.presenter.present(&self.buffer)?;
        Ok(())
    }
}
