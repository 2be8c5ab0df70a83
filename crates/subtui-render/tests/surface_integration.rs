//! Integration tests for the render pipeline.
//!
//! - Text rendered through the cell renderer, anchored, blitted and presented
//! - Terminal and headless surfaces agree on buffer contents
//! - Property tests: blits never panic and never write outside the image

use proptest::prelude::*;
use subtui_render::buffer::{Buffer, Point};
use subtui_render::cell::PackedRgba;
use subtui_render::font::FontConfig;
use subtui_render::glyph::{CellGlyphRenderer, GlyphRenderer};
use subtui_render::headless::HeadlessSurface;
use subtui_render::surface::{Anchor, RenderSurface, SurfaceOptions, TerminalSurface};

fn draw<S: RenderSurface>(surface: &mut S, text: &str, anchor: Anchor) {
    let font = FontConfig::new("test.ttf", 12);
    let image = CellGlyphRenderer.render(&font, text, PackedRgba::WHITE);
    surface.clear();
    if !image.is_empty() {
        let at = anchor.position(surface.size(), (image.width(), image.height()));
        surface.blit(&image, at);
    }
    surface.present().unwrap();
}

// ============================================================================
// Pipeline
// ============================================================================

#[test]
fn bottom_anchored_two_line_cue() {
    let mut surface = HeadlessSurface::new(20, 6);
    draw(&mut surface, "Hello\nWorld!", Anchor::BottomCenter);
    let frame = surface.last_frame().unwrap();
    assert_eq!(frame[4], "       Hello");
    assert_eq!(frame[5], "       World!");
    assert!(frame[..4].iter().all(String::is_empty));
}

#[test]
fn terminal_and_headless_buffers_match() {
    let mut headless = HeadlessSurface::new(16, 3);
    let mut terminal =
        TerminalSurface::new(Vec::new(), 16, 3, SurfaceOptions::default()).unwrap();
    draw(&mut headless, "字幕 ok", Anchor::Center);
    draw(&mut terminal, "字幕 ok", Anchor::Center);
    for y in 0..3 {
        assert_eq!(headless.buffer().row_text(y), terminal.buffer().row_text(y));
    }
    let out = String::from_utf8_lossy(terminal.writer()).into_owned();
    assert!(out.contains("字幕 ok"));
}

#[test]
fn redraw_after_resize_uses_new_geometry() {
    let mut surface = HeadlessSurface::new(10, 2);
    draw(&mut surface, "cue", Anchor::Center);
    assert_eq!(surface.visible_text(), vec!["   cue".to_string()]);
    surface.resize(30, 4).unwrap();
    draw(&mut surface, "cue", Anchor::Center);
    assert_eq!(surface.size(), (30, 4));
    assert_eq!(surface.last_frame().unwrap()[1], format!("{}cue", " ".repeat(13)));
}

#[test]
fn empty_render_presents_blank_frame() {
    let mut surface = HeadlessSurface::new(10, 2);
    draw(&mut surface, "x", Anchor::TopLeft);
    draw(&mut surface, "", Anchor::TopLeft);
    assert!(surface.last_frame_is_blank());
    assert_eq!(surface.ops().blits, 1);
    assert_eq!(surface.ops().presents, 2);
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    #[test]
    fn blit_never_writes_outside_the_image(
        w in 1u16..40,
        h in 1u16..10,
        x in 0u16..60,
        y in 0u16..20,
        text in "[a-z日本 ]{0,30}",
    ) {
        let font = FontConfig::new("test.ttf", 12);
        let image = CellGlyphRenderer.render(&font, &text, PackedRgba::WHITE);
        let mut buffer = Buffer::new(w, h);
        buffer.blit(&image, Point::new(x, y));
        for by in 0..h {
            for bx in 0..w {
                let inside = bx >= x && by >= y
                    && bx - x < image.width() && by - y < image.height();
                if !inside {
                    prop_assert_eq!(buffer.get(bx, by).map(|c| c.ch), Some(' '));
                }
            }
        }
    }

    #[test]
    fn anchor_keeps_fitting_images_on_surface(
        sw in 1u16..200,
        sh in 1u16..60,
        iw in 1u16..200,
        ih in 1u16..60,
    ) {
        for anchor in [Anchor::TopLeft, Anchor::Center, Anchor::BottomCenter] {
            let at = anchor.position((sw, sh), (iw, ih));
            if iw <= sw {
                prop_assert!(at.x + iw <= sw);
            }
            if ih <= sh {
                prop_assert!(at.y + ih <= sh);
            }
        }
    }
}
