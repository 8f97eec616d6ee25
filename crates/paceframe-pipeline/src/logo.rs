//! The round runner mark drawn beside the athlete's name.
//!
//! A stroked ring with eight radial ticks and a stick runner inside,
//! drawn from a 200-unit design box and scaled to the requested pixel
//! size. Same rasterization path as the rest of the poster: tiny-skia
//! into a transparent layer, then blended onto the canvas.

use image::{RgbaImage, imageops};
use tiny_skia::{FillRule, LineCap, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::map::pixmap_to_image;
use crate::types::Rgb;

/// Edge length of the design box all coordinates below live in.
const BOX: f32 = 200.0;

/// Stroke width in design units.
const LINE: f32 = 5.0;

/// The indigo of the classic poster mark.
pub const DEFAULT_COLOR: Rgb = Rgb::new(33, 37, 99);

/// Draw the mark with its top-left at `(x, y)`, scaled to a `size` pixel
/// square. A zero size draws nothing.
pub fn draw_mark(canvas: &mut RgbaImage, x: i32, y: i32, size: u32, color: Rgb) {
    let Some(mut pixmap) = Pixmap::new(size, size) else {
        return;
    };
    #[allow(clippy::cast_precision_loss)]
    let scale = size as f32 / BOX;

    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, 255);
    paint.anti_alias = true;
    let stroke = Stroke {
        width: LINE * scale,
        line_cap: LineCap::Round,
        ..Stroke::default()
    };

    let line = |points: &[(f32, f32)], pixmap: &mut Pixmap| {
        let mut pb = PathBuilder::new();
        pb.move_to(points[0].0 * scale, points[0].1 * scale);
        for &(px, py) in &points[1..] {
            pb.line_to(px * scale, py * scale);
        }
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    };

    // Outer ring, radius 90.
    let mut pb = PathBuilder::new();
    pb.push_circle(100.0 * scale, 100.0 * scale, 90.0 * scale);
    if let Some(ring) = pb.finish() {
        pixmap.stroke_path(&ring, &paint, &stroke, Transform::identity(), None);
    }

    // Eight radial ticks just inside the ring.
    for i in 0u8..8 {
        let angle = f32::from(i) * std::f32::consts::FRAC_PI_4;
        let (sin, cos) = angle.sin_cos();
        line(
            &[
                (74.0f32.mul_add(cos, 100.0), 74.0f32.mul_add(sin, 100.0)),
                (86.0f32.mul_add(cos, 100.0), 86.0f32.mul_add(sin, 100.0)),
            ],
            &mut pixmap,
        );
    }

    // Stick runner: filled head, then body, arms, and legs.
    let mut pb = PathBuilder::new();
    pb.push_circle(100.0 * scale, 90.0 * scale, 15.0 * scale);
    if let Some(head) = pb.finish() {
        pixmap.fill_path(&head, &paint, FillRule::Winding, Transform::identity(), None);
    }
    line(&[(100.0, 105.0), (100.0, 150.0)], &mut pixmap);
    line(&[(70.0, 120.0), (130.0, 120.0)], &mut pixmap);
    line(&[(100.0, 150.0), (75.0, 180.0)], &mut pixmap);
    line(&[(100.0, 150.0), (125.0, 180.0)], &mut pixmap);

    let layer = pixmap_to_image(&pixmap);
    imageops::overlay(canvas, &layer, i64::from(x), i64::from(y));
}
