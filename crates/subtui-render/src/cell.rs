#![forbid(unsafe_code)]

//! Cell and color primitives.
//!
//! A [`Cell`] is one terminal column on one row. Wide characters occupy a
//! head cell followed by [`Cell::CONTINUATION`] cells that the presenter
//! skips.

/// A 32-bit RGBA color packed as `0xRRGGBBAA`.
///
/// Straight alpha. An alpha of zero means "terminal default color".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(transparent)]
pub struct PackedRgba(pub u32);

impl PackedRgba {
    /// Fully transparent (alpha = 0): use the terminal default.
    pub const TRANSPARENT: Self = Self(0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Create an opaque RGB color (alpha = 255).
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Create an RGBA color with explicit alpha.
    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | (a as u32))
    }

    /// Red channel.
    #[inline]
    pub const fn r(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Green channel.
    #[inline]
    pub const fn g(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// Blue channel.
    #[inline]
    pub const fn b(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Alpha channel.
    #[inline]
    pub const fn a(self) -> u8 {
        self.0 as u8
    }

    /// Parse `#rrggbb` or `rrggbb`.
    #[must_use]
    pub fn from_hex(text: &str) -> Option<Self> {
        let hex = text.strip_prefix('#').unwrap_or(text);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// One terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// Displayed character. `'\0'` marks a continuation cell.
    pub ch: char,
    /// Display width of `ch` in columns (0 for continuations).
    pub width: u8,
    /// Foreground color.
    pub fg: PackedRgba,
    /// Background color.
    pub bg: PackedRgba,
}

impl Cell {
    /// Placeholder for the trailing columns of a wide character.
    pub const CONTINUATION: Self = Self {
        ch: '\0',
        width: 0,
        fg: PackedRgba::TRANSPARENT,
        bg: PackedRgba::TRANSPARENT,
    };

    /// A blank (space) cell with the given background.
    #[inline]
    pub const fn blank(bg: PackedRgba) -> Self {
        Self {
            ch: ' ',
            width: 1,
            fg: PackedRgba::TRANSPARENT,
            bg,
        }
    }

    /// A narrow cell holding `ch`.
    #[inline]
    pub const fn from_char(ch: char) -> Self {
        Self {
            ch,
            width: 1,
            fg: PackedRgba::WHITE,
            bg: PackedRgba::TRANSPARENT,
        }
    }

    /// Set the display width.
    #[inline]
    #[must_use]
    pub const fn with_width(mut self, width: u8) -> Self {
        self.width = width;
        self
    }

    /// Set the foreground color.
    #[inline]
    #[must_use]
    pub const fn with_fg(mut self, fg: PackedRgba) -> Self {
        self.fg = fg;
        self
    }

    /// Set the background color.
    #[inline]
    #[must_use]
    pub const fn with_bg(mut self, bg: PackedRgba) -> Self {
        self.bg = bg;
        self
    }

    /// Whether this cell is the tail of a wide character.
    #[inline]
    pub const fn is_continuation(&self) -> bool {
        self.width == 0 && self.ch == '\0'
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::blank(PackedRgba::TRANSPARENT)
    }
}
