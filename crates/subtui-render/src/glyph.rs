#![forbid(unsafe_code)]

//! Text to [`GlyphImage`] rendering.
//!
//! [`CellGlyphRenderer`] places each `\n`-separated line on its own row,
//! spacing lines by the font's row stride. Graphemes are measured with
//! `unicode-width`; a wide grapheme gets a head cell plus continuation
//! cells. Cells hold one `char`, so combining marks after the base
//! character are dropped. No wrapping is performed.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::cell::{Cell, PackedRgba};
use crate::font::FontConfig;
use crate::image::GlyphImage;

/// Renders cue text into an image.
///
/// Renderers never fail: text that cannot be shaped yields an empty image.
pub trait GlyphRenderer: Send + Sync {
    /// Render `text` in `color` with `font`.
    fn render(&self, font: &FontConfig, text: &str, color: PackedRgba) -> GlyphImage;
}

/// Renders text straight into terminal cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct CellGlyphRenderer;

impl GlyphRenderer for CellGlyphRenderer {
    fn render(&self, font: &FontConfig, text: &str, color: PackedRgba) -> GlyphImage {
        let stride = usize::from(font.line_rows());
        let lines: Vec<Vec<Cell>> = text.split('\n').map(|line| line_cells(line, color)).collect();
        if lines.iter().all(Vec::is_empty) {
            return GlyphImage::empty();
        }

        let mut rows = Vec::with_capacity(lines.len() * stride);
        let last = lines.len() - 1;
        for (i, line) in lines.into_iter().enumerate() {
            rows.push(line);
            if i < last {
                rows.extend(std::iter::repeat_n(Vec::new(), stride - 1));
            }
        }
        GlyphImage::from_rows(rows)
    }
}

fn line_cells(line: &str, color: PackedRgba) -> Vec<Cell> {
    let mut cells = Vec::new();
    for grapheme in line.graphemes(true) {
        let Some(ch) = grapheme.chars().find(|c| !c.is_control()) else {
            continue;
        };
        let width = grapheme.width();
        if width == 0 {
            continue;
        }
        let width = u8::try_from(width).unwrap_or(u8::MAX);
        cells.push(Cell::from_char(ch).with_width(width).with_fg(color));
        cells.extend(std::iter::repeat_n(Cell::CONTINUATION, usize::from(width) - 1));
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font(size: u16) -> FontConfig {
        FontConfig::new("test.ttf", size)
    }

    fn row_text(image: &GlyphImage, y: u16) -> String {
        (0..image.width())
            .filter_map(|x| image.get(x, y))
            .filter(|c| !c.is_continuation())
            .map(|c| c.ch)
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    #[test]
    fn single_line() {
        let image = CellGlyphRenderer.render(&font(12), "Hello", PackedRgba::WHITE);
        assert_eq!((image.width(), image.height()), (5, 1));
        assert_eq!(row_text(&image, 0), "Hello");
    }

    #[test]
    fn lines_are_spaced_by_stride() {
        let image = CellGlyphRenderer.render(&font(24), "one\ntwo", PackedRgba::WHITE);
        assert_eq!(font(24).line_rows(), 2);
        assert_eq!(image.height(), 3);
        assert_eq!(row_text(&image, 0), "one");
        assert_eq!(row_text(&image, 1), "");
        assert_eq!(row_text(&image, 2), "two");
    }

    #[test]
    fn wide_graphemes_take_two_columns() {
        let image = CellGlyphRenderer.render(&font(12), "日本", PackedRgba::WHITE);
        assert_eq!(image.width(), 4);
        assert!(image.get(1, 0).is_some_and(Cell::is_continuation));
        assert_eq!(image.get(2, 0).map(|c| c.ch), Some('本'));
    }

    #[test]
    fn control_characters_are_stripped() {
        let image = CellGlyphRenderer.render(&font(12), "a\tb\r", PackedRgba::WHITE);
        assert_eq!(row_text(&image, 0), "ab");
    }

    #[test]
    fn invisible_text_renders_empty() {
        assert!(CellGlyphRenderer.render(&font(12), "", PackedRgba::WHITE).is_empty());
        assert!(CellGlyphRenderer.render(&font(12), "\n\u{7}\n", PackedRgba::WHITE).is_empty());
    }

    #[test]
    fn color_is_applied() {
        let red = PackedRgba::rgb(255, 0, 0);
        let image = CellGlyphRenderer.render(&font(12), "x", red);
        assert_eq!(image.get(0, 0).map(|c| c.fg), Some(red));
    }
}
