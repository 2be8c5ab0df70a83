#![forbid(unsafe_code)]

//! Render kernel: cells, buffers, glyph images, fonts, and surfaces.

pub mod buffer;
pub mod cell;
pub mod font;
pub mod glyph;
pub mod headless;
pub mod image;
pub mod presenter;
pub mod surface;

pub use buffer::{Buffer, Point};
pub use cell::{Cell, PackedRgba};
pub use font::{FileFontLoader, FontConfig, FontLoadError, FontLoader};
pub use glyph::{CellGlyphRenderer, GlyphRenderer};
pub use headless::HeadlessSurface;
pub use image::GlyphImage;
pub use surface::{Anchor, RenderSurface, SurfaceError, SurfaceOptions, TerminalSurface};
