#![forbid(unsafe_code)]

//! Buffer grid storage.
//!
//! The [`Buffer`] is the backing store of a render surface: a 2D grid of
//! [`Cell`]s in row-major order (`index = y * width + x`).
//!
//! # Invariants
//!
//! 1. `cells.len() == width * height`
//! 2. Width and height are non-zero and never change after creation; a
//!    resize allocates a new buffer.
//! 3. A wide head cell is always followed by its continuation cells on the
//!    same row. Blits that would split a wide character write a blank
//!    instead.

use crate::cell::{Cell, PackedRgba};
use crate::image::GlyphImage;

/// A position on a surface, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Point {
    /// Column (0 = leftmost).
    pub x: u16,
    /// Row (0 = topmost).
    pub y: u16,
}

impl Point {
    /// The top-left corner.
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    /// Create a point.
    #[inline]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

/// A 2D grid of terminal cells.
///
/// ```
/// use subtui_render::buffer::Buffer;
/// use subtui_render::cell::{Cell, PackedRgba};
///
/// let mut buffer = Buffer::new(80, 24);
/// buffer.set(0, 0, Cell::from_char('H'));
/// buffer.clear(PackedRgba::BLACK);
/// assert_eq!(buffer.get(0, 0).map(|c| c.ch), Some(' '));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl Buffer {
    /// Create a buffer of blank cells.
    ///
    /// # Panics
    ///
    /// Panics if width or height is 0.
    pub fn new(width: u16, height: u16) -> Self {
        assert!(width > 0, "buffer width must be > 0");
        assert!(height > 0, "buffer height must be > 0");
        let size = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![Cell::default(); size],
        }
    }

    /// Buffer width in cells.
    #[inline]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Buffer height in cells.
    #[inline]
    pub const fn height(&self) -> u16 {
        self.height
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Get the cell at (x, y), or `None` when out of bounds.
    #[inline]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Set the cell at (x, y). Out-of-bounds writes are ignored.
    #[inline]
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = cell;
        }
    }

    /// Fill every cell with a blank of the given background.
    pub fn clear(&mut self, bg: PackedRgba) {
        self.cells.fill(Cell::blank(bg));
    }

    /// Copy `image` onto the buffer with its top-left corner at `at`.
    ///
    /// Cells falling outside the buffer are clipped. Blank image cells keep
    /// the image's background; transparent image backgrounds keep the
    /// buffer's.
    pub fn blit(&mut self, image: &GlyphImage, at: Point) {
        for iy in 0..image.height() {
            let Some(y) = at.y.checked_add(iy).filter(|&y| y < self.height) else {
                break;
            };
            let mut ix = 0;
            while ix < image.width() {
                let Some(x) = at.x.checked_add(ix).filter(|&x| x < self.width) else {
                    break;
                };
                let Some(src) = image.get(ix, iy).copied() else {
                    break;
                };
                if src.is_continuation() {
                    ix += 1;
                    continue;
                }
                let span = u16::from(src.width.max(1));
                let fits = x as u32 + span as u32 <= self.width as u32;
                let base_bg = self.get(x, y).map_or(PackedRgba::TRANSPARENT, |c| c.bg);
                let bg = if src.bg.a() == 0 { base_bg } else { src.bg };
                if fits {
                    self.set(x, y, src.with_bg(bg));
                    for dx in 1..span {
                        self.set(x + dx, y, Cell::CONTINUATION);
                    }
                } else {
                    self.set(x, y, Cell::blank(bg));
                }
                ix += span;
            }
        }
    }

    /// Text of row `y` with continuation cells removed and trailing blanks
    /// trimmed. Used by headless surfaces and tests.
    pub fn row_text(&self, y: u16) -> String {
        if y >= self.height {
            return String::new();
        }
        let start = y as usize * self.width as usize;
        let row = &self.cells[start..start + self.width as usize];
        let text: String = row
            .iter()
            .filter(|c| !c.is_continuation())
            .map(|c| c.ch)
            .collect();
        text.trim_end().to_string()
    }

    /// Whether every cell is a blank space.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.ch == ' ')
    }

    /// Iterate rows as slices.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.width as usize)
    }
}
