//! Text measurement and drawing for the poster composer.
//!
//! Two faces can back a poster: a loaded TTF/OTF font, or the built-in
//! stroke face from [`crate::strokes`]. The built-in face is always
//! available, which makes it the typed terminal of the font fallback
//! chain: a poster render can never fail for lack of a font file.
//!
//! Coordinates name the top-left corner of the text's em box, matching
//! how the composer lays out bands from the top of the canvas down.

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{Rgba, RgbaImage, imageops};
use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::map::pixmap_to_image;
use crate::strokes;
use crate::types::Rgb;

/// A face the composer can measure and draw with.
#[derive(Debug, Clone)]
pub enum Typeface {
    /// A loaded TTF/OTF font.
    Ttf(FontArc),
    /// The built-in stroke face.
    Builtin,
}

impl Default for Typeface {
    fn default() -> Self {
        Self::Builtin
    }
}

impl Typeface {
    /// Parse TTF/OTF bytes into a loaded face.
    ///
    /// Returns `None` when the bytes are not a parseable font, letting
    /// the caller move on to the next candidate in its fallback chain.
    #[must_use]
    pub fn from_ttf_bytes(bytes: Vec<u8>) -> Option<Self> {
        FontArc::try_from_vec(bytes).ok().map(Self::Ttf)
    }
}

/// The two faces a poster uses: `display` for the title and stat
/// values, `text` for dates, names, and labels.
#[derive(Debug, Clone, Default)]
pub struct FontSet {
    pub display: Typeface,
    pub text: Typeface,
}

impl FontSet {
    /// Use one face for both roles.
    #[must_use]
    pub fn uniform(face: Typeface) -> Self {
        Self {
            display: face.clone(),
            text: face,
        }
    }
}

/// Advance width of `text` at `size` pixels.
#[must_use]
pub fn measure_width(face: &Typeface, text: &str, size: f32) -> f32 {
    match face {
        Typeface::Ttf(font) => {
            let scaled = font.as_scaled(PxScale::from(size));
            let mut width = 0.0;
            let mut prev = None;
            for ch in text.chars() {
                let glyph = scaled.glyph_id(ch);
                if let Some(prev) = prev {
                    width += scaled.kern(prev, glyph);
                }
                width += scaled.h_advance(glyph);
                prev = Some(glyph);
            }
            width
        }
        Typeface::Builtin => builtin_width(text, size),
    }
}

#[allow(clippy::cast_precision_loss)]
fn builtin_width(text: &str, size: f32) -> f32 {
    let count = text.chars().count() as f32;
    count * strokes::ADVANCE / strokes::UNITS_PER_EM * size
}

/// Draw `text` with the top-left of its em box at `(x, y)`. Coordinates
/// may be negative or run past the edge; drawing clips to the canvas.
pub fn draw_text(
    canvas: &mut RgbaImage,
    color: Rgb,
    x: i32,
    y: i32,
    size: f32,
    face: &Typeface,
    text: &str,
) {
    match face {
        Typeface::Ttf(font) => {
            imageproc::drawing::draw_text_mut(
                canvas,
                Rgba([color.r, color.g, color.b, 255]),
                x,
                y,
                PxScale::from(size),
                font,
                text,
            );
        }
        Typeface::Builtin => draw_builtin(canvas, color, x, y, size, text),
    }
}

/// Rasterize the built-in face onto a transparent layer, then blend the
/// layer into the canvas.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn draw_builtin(canvas: &mut RgbaImage, color: Rgb, x: i32, y: i32, size: f32, text: &str) {
    let scale = size / strokes::UNITS_PER_EM;
    let width = builtin_width(text, size).ceil() as u32 + 2;
    let height = size.ceil() as u32 + 2;
    let Some(mut pixmap) = Pixmap::new(width, height) else {
        return;
    };

    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, 255);
    paint.anti_alias = true;
    let stroke = Stroke {
        width: strokes::LINE_WIDTH * scale,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    let mut pen_x = 0.0f32;
    for ch in text.chars() {
        for polyline in strokes_path(ch, pen_x, scale) {
            pixmap.stroke_path(&polyline, &paint, &stroke, Transform::identity(), None);
        }
        pen_x += strokes::ADVANCE * scale;
    }

    let layer = pixmap_to_image(&pixmap);
    imageops::overlay(canvas, &layer, i64::from(x), i64::from(y));
}

/// Paths for one glyph, offset to the pen position and scaled to pixels.
fn strokes_path(ch: char, pen_x: f32, scale: f32) -> Vec<tiny_skia::Path> {
    strokes::strokes_for(ch)
        .iter()
        .filter_map(|polyline| {
            let mut pb = PathBuilder::new();
            let (x0, y0) = polyline[0];
            pb.move_to(scale.mul_add(f32::from(x0), pen_x), f32::from(y0) * scale);
            for &(px, py) in &polyline[1..] {
                pb.line_to(scale.mul_add(f32::from(px), pen_x), f32::from(py) * scale);
            }
            pb.finish()
        })
        .collect()
}
