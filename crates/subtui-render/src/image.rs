#![forbid(unsafe_code)]

//! Rendered text images.
//!
//! A [`GlyphImage`] is what the glyph renderer hands to the surface: a
//! rectangular block of cells. An empty image (zero width or height) means
//! the text could not be shaped; callers skip the blit but otherwise carry
//! on.

use crate::cell::Cell;

/// A rectangular block of rendered cells.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GlyphImage {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl GlyphImage {
    /// The empty image.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            cells: Vec::new(),
        }
    }

    /// Build an image from rows of cells.
    ///
    /// Short rows are padded with blank cells to the width of the longest
    /// row. Rows or columns beyond `u16::MAX` are dropped.
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Self {
        let width = rows
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .min(u16::MAX as usize);
        let height = rows.len().min(u16::MAX as usize);
        if width == 0 || height == 0 {
            return Self::empty();
        }
        let mut cells = Vec::with_capacity(width * height);
        for mut row in rows.into_iter().take(height) {
            row.truncate(width);
            row.resize(width, Cell::default());
            cells.extend(row);
        }
        Self {
            width: width as u16,
            height: height as u16,
            cells,
        }
    }

    /// Width in cells.
    #[inline]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Height in cells.
    #[inline]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Whether there is nothing to blit.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Cell at (x, y), or `None` out of bounds.
    #[inline]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if x < self.width && y < self.height {
            self.cells.get(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }
}
