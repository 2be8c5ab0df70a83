#![forbid(unsafe_code)]

//! Font configuration and loading.
//!
//! The terminal draws glyphs itself, so "loading" a font means validating the
//! font file and deriving a line height. The line height is kept in pixels
//! and mapped to terminal rows through a nominal cell height.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Nominal pixel height of one terminal row.
pub const NOMINAL_CELL_HEIGHT_PX: u32 = 16;

const MAGIC_TRUETYPE: [u8; 4] = [0x00, 0x01, 0x00, 0x00];
const MAGIC_TRUETYPE_MAC: [u8; 4] = *b"true";
const MAGIC_OPENTYPE: [u8; 4] = *b"OTTO";
const MAGIC_COLLECTION: [u8; 4] = *b"ttcf";

/// A loaded font: where it came from, its size, and the derived line height.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontConfig {
    /// Font file path.
    pub path: PathBuf,
    /// Point size.
    pub size: u16,
    /// Line height in pixels.
    pub line_height: u32,
}

impl FontConfig {
    /// Build a config for `size`, deriving the line height.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, size: u16) -> Self {
        Self {
            path: path.into(),
            size,
            line_height: line_height_for(size),
        }
    }

    /// Terminal rows per text line.
    #[must_use]
    pub fn line_rows(&self) -> u16 {
        let rows = self.line_height.div_ceil(NOMINAL_CELL_HEIGHT_PX).max(1);
        u16::try_from(rows).unwrap_or(u16::MAX)
    }
}

/// `ceil(size * 1.2)`, in integer arithmetic.
#[must_use]
pub fn line_height_for(size: u16) -> u32 {
    (u32::from(size) * 6).div_ceil(5)
}

/// Failure to load a font.
#[derive(Debug)]
pub enum FontLoadError {
    /// No file at the path.
    NotFound(PathBuf),
    /// The file exists but could not be read.
    Io {
        /// Font path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// The file is not a TrueType/OpenType font.
    UnsupportedFormat(PathBuf),
    /// Zero point size.
    InvalidSize(u16),
}

impl fmt::Display for FontLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontLoadError::NotFound(path) => write!(f, "font not found: {}", path.display()),
            FontLoadError::Io { path, source } => {
                write!(f, "failed to read font {}: {source}", path.display())
            }
            FontLoadError::UnsupportedFormat(path) => {
                write!(f, "unsupported font format: {}", path.display())
            }
            FontLoadError::InvalidSize(size) => write!(f, "invalid font size: {size}"),
        }
    }
}

impl std::error::Error for FontLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FontLoadError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Opens fonts.
pub trait FontLoader: Send + Sync {
    /// Load the font at `path` with the given point size.
    ///
    /// # Errors
    ///
    /// [`FontLoadError`] if the file is missing, unreadable, not a font, or
    /// the size is zero.
    fn open_font(&self, path: &Path, size: u16) -> Result<FontConfig, FontLoadError>;
}

/// Loads fonts from the filesystem, checking the sfnt magic.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFontLoader;

impl FontLoader for FileFontLoader {
    fn open_font(&self, path: &Path, size: u16) -> Result<FontConfig, FontLoadError> {
        if size == 0 {
            return Err(FontLoadError::InvalidSize(size));
        }
        let bytes = fs::read(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => FontLoadError::NotFound(path.to_path_buf()),
            _ => FontLoadError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        if !has_font_magic(&bytes) {
            return Err(FontLoadError::UnsupportedFormat(path.to_path_buf()));
        }
        Ok(FontConfig::new(path, size))
    }
}

fn has_font_magic(bytes: &[u8]) -> bool {
    let Some(head) = bytes.first_chunk::<4>() else {
        return false;
    };
    [
        MAGIC_TRUETYPE,
        MAGIC_TRUETYPE_MAC,
        MAGIC_OPENTYPE,
        MAGIC_COLLECTION,
    ]
    .contains(head)
}
