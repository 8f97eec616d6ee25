//! Route map rendering: the cleaned track drawn over a background.
//!
//! The map is a square raster. Background first (a basemap raster when a
//! source is supplied and delivers, the flat style color otherwise),
//! then the route polyline, then the start circle, then the end X on
//! top. A basemap failure is never fatal: it downgrades the background
//! and is reported through [`MapStats`].

use image::{Rgba, RgbaImage, imageops};
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::project::{self, Bounds, PlanePoint};
use crate::types::{PosterConfig, Rgb, StyleConfig, Track};

/// Why a basemap could not be produced. Carried as data and surfaced in
/// diagnostics; the render itself falls back to a flat background.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("basemap unavailable: {0}")]
pub struct BasemapError(pub String);

/// A provider of prerendered map backdrops.
///
/// The pipeline owns the fallback chain: when `fetch` fails, the poster
/// gets the flat theme color instead, and the error text travels through
/// [`MapStats::basemap_fallback`] rather than up the call stack.
pub trait BasemapSource {
    /// Produce a backdrop covering `bounds` (Mercator meters, already
    /// padded) at `size` by `size` pixels.
    ///
    /// # Errors
    ///
    /// Returns [`BasemapError`] when no backdrop can be produced; the
    /// caller downgrades to a flat background.
    fn fetch(&self, bounds: Bounds, size: u32) -> Result<RgbaImage, BasemapError>;
}

/// What the map renderer did, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapStats {
    /// Points plotted after projection.
    pub points_drawn: usize,
    /// True when a basemap source was consulted and delivered.
    pub basemap_used: bool,
    /// The failure message when a basemap was requested but the
    /// background fell back to the flat color.
    pub basemap_fallback: Option<String>,
}

/// Render the route map for a track.
///
/// Always returns an image of `config.map_size` square. A track with a
/// single point renders both markers and no line; an empty track renders
/// the background alone.
#[must_use]
pub fn render_route(
    track: &Track,
    config: &PosterConfig,
    basemap: Option<&dyn BasemapSource>,
) -> (RgbaImage, MapStats) {
    let size = config.map_size;
    let plane: Vec<PlanePoint> = track
        .points()
        .iter()
        .copied()
        .map(project::mercator)
        .collect();
    let bounds = Bounds::of(&plane).map(|b| b.padded(config.padding));

    let mut stats = MapStats {
        points_drawn: plane.len(),
        basemap_used: false,
        basemap_fallback: None,
    };

    let mut canvas = match (basemap, bounds) {
        (Some(source), Some(bounds)) => match source.fetch(bounds, size) {
            Ok(raster) => {
                stats.basemap_used = true;
                fit_background(raster, size)
            }
            Err(err) => {
                stats.basemap_fallback = Some(err.to_string());
                flat_background(config.style.background.color(), size)
            }
        },
        _ => flat_background(config.style.background.color(), size),
    };

    let Some(bounds) = bounds else {
        return (canvas, stats);
    };

    let viewport = project::Viewport::fit(bounds, size, size);
    let pixels: Vec<(f32, f32)> = plane.iter().map(|&p| viewport.to_pixel(p)).collect();

    if let Some(route) = draw_route_overlay(&pixels, &config.style, config, size) {
        imageops::overlay(&mut canvas, &route, 0, 0);
    }
    (canvas, stats)
}

fn flat_background(color: Rgb, size: u32) -> RgbaImage {
    RgbaImage::from_pixel(size, size, Rgba([color.r, color.g, color.b, 255]))
}

/// Force a delivered basemap raster to the render size. Sources are
/// asked for a square, so a well-behaved one passes through untouched.
fn fit_background(raster: RgbaImage, size: u32) -> RgbaImage {
    if raster.width() == size && raster.height() == size {
        raster
    } else {
        imageops::resize(&raster, size, size, imageops::FilterType::Triangle)
    }
}

/// Draw route line and markers on a transparent layer. Returns `None`
/// only when the layer cannot be allocated (zero size).
fn draw_route_overlay(
    pixels: &[(f32, f32)],
    style: &StyleConfig,
    config: &PosterConfig,
    size: u32,
) -> Option<RgbaImage> {
    let mut pixmap = Pixmap::new(size, size)?;

    if pixels.len() >= 2 {
        let mut pb = PathBuilder::new();
        let (x0, y0) = pixels[0];
        pb.move_to(x0, y0);
        for &(x, y) in &pixels[1..] {
            pb.line_to(x, y);
        }
        if let Some(path) = pb.finish() {
            let stroke = Stroke {
                width: config.route_width,
                line_cap: LineCap::Round,
                line_join: LineJoin::Round,
                ..Stroke::default()
            };
            pixmap.stroke_path(
                &path,
                &solid_paint(style.route_color),
                &stroke,
                Transform::identity(),
                None,
            );
        }
    }

    if let Some(&(x, y)) = pixels.first() {
        let mut pb = PathBuilder::new();
        pb.push_circle(x, y, config.marker_radius);
        if let Some(path) = pb.finish() {
            pixmap.fill_path(
                &path,
                &solid_paint(style.start_color),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }

    // The end X is drawn last so it stays legible over the route and,
    // on loop courses, over the start marker.
    if let Some(&(x, y)) = pixels.last() {
        let r = config.marker_radius;
        let mut pb = PathBuilder::new();
        pb.move_to(x - r, y - r);
        pb.line_to(x + r, y + r);
        pb.move_to(x - r, y + r);
        pb.line_to(x + r, y - r);
        if let Some(path) = pb.finish() {
            let stroke = Stroke {
                width: (r * 0.45).max(2.0),
                line_cap: LineCap::Round,
                ..Stroke::default()
            };
            pixmap.stroke_path(
                &path,
                &solid_paint(style.end_color),
                &stroke,
                Transform::identity(),
                None,
            );
        }
    }

    Some(pixmap_to_image(&pixmap))
}

fn solid_paint(color: Rgb) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, 255);
    paint.anti_alias = true;
    paint
}

/// Convert a premultiplied-alpha pixmap into a straight-alpha image
/// buffer.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn pixmap_to_image(pixmap: &Pixmap) -> RgbaImage {
    let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
    for (pixel, chunk) in image.pixels_mut().zip(pixmap.data().chunks_exact(4)) {
        let alpha = chunk[3];
        *pixel = if alpha == 0 {
            Rgba([0, 0, 0, 0])
        } else {
            let unpremultiply = |ch: u8| (u16::from(ch) * 255 / u16::from(alpha)) as u8;
            Rgba([
                unpremultiply(chunk[0]),
                unpremultiply(chunk[1]),
                unpremultiply(chunk[2]),
                alpha,
            ])
        };
    }
    image
}
