//! Geographic projection: from coordinates to canvas pixels.
//!
//! Routes are drawn on a Mercator-style plane so shapes look the way
//! they do on familiar web maps. The projected bounding box is padded,
//! then fitted into the target canvas with a single uniform scale so the
//! route never stretches, and flipped so north is up in image space.

use crate::types::{Track, TrackPoint};

/// Spherical radius used by the Web Mercator projection, in meters.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude cutoff beyond which the Mercator projection diverges.
pub const MAX_LATITUDE_DEG: f64 = 85.051_128_78;

/// A projected point on the Mercator plane, in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanePoint {
    pub x: f64,
    pub y: f64,
}

/// Project one coordinate onto the Mercator plane. Latitudes beyond the
/// projection's cutoff are clamped so the result stays finite.
#[must_use]
pub fn mercator(point: TrackPoint) -> PlanePoint {
    let lat = point
        .lat
        .clamp(-MAX_LATITUDE_DEG, MAX_LATITUDE_DEG)
        .to_radians();
    let lon = point.lon.to_radians();
    PlanePoint {
        x: EARTH_RADIUS_M * lon,
        y: EARTH_RADIUS_M * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln(),
    }
}

/// Axis-aligned bounds of a projected track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Bounds of a point set, or `None` when it is empty.
    #[must_use]
    pub fn of(points: &[PlanePoint]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for p in &points[1..] {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.max_y = bounds.max_y.max(p.y);
        }
        Some(bounds)
    }

    /// Grow every side by `fraction` of the matching extent, keeping the
    /// route clear of the canvas edge.
    #[must_use]
    pub fn padded(self, fraction: f64) -> Self {
        let dx = self.width() * fraction;
        let dy = self.height() * fraction;
        Self {
            min_x: self.min_x - dx,
            min_y: self.min_y - dy,
            max_x: self.max_x + dx,
            max_y: self.max_y + dy,
        }
    }

    #[must_use]
    pub fn width(self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(self) -> f64 {
        self.max_y - self.min_y
    }

    fn center(self) -> PlanePoint {
        PlanePoint {
            x: (self.min_x + self.max_x) / 2.0,
            y: (self.min_y + self.max_y) / 2.0,
        }
    }
}

/// Maps plane coordinates into a pixel canvas with one uniform scale on
/// both axes. Pixel y grows downward, so north ends up at the top.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    scale: f64,
    center: PlanePoint,
    width: f64,
    height: f64,
}

impl Viewport {
    /// Fit `bounds` inside a `width` by `height` canvas. A degenerate
    /// extent (single point, or all points identical) falls back to unit
    /// scale, which centers the track instead of dividing by zero.
    #[must_use]
    pub fn fit(bounds: Bounds, width: u32, height: u32) -> Self {
        let scale_x = f64::from(width) / bounds.width();
        let scale_y = f64::from(height) / bounds.height();
        let scale = scale_x.min(scale_y);
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        Self {
            scale,
            center: bounds.center(),
            width: f64::from(width),
            height: f64::from(height),
        }
    }

    /// Pixel position of a plane point. Points outside the fitted bounds
    /// map outside the canvas; callers clip by drawing, not by testing.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_pixel(&self, point: PlanePoint) -> (f32, f32) {
        let px = (point.x - self.center.x).mul_add(self.scale, self.width / 2.0);
        let py = (self.center.y - point.y).mul_add(self.scale, self.height / 2.0);
        (px as f32, py as f32)
    }
}

/// Project a whole track into pixel space: Mercator, padded bounds,
/// uniform fit. Output order matches input order; an empty track yields
/// an empty vector.
#[must_use]
pub fn project_track(track: &Track, width: u32, height: u32, padding: f64) -> Vec<(f32, f32)> {
    let plane: Vec<PlanePoint> = track.points().iter().copied().map(mercator).collect();
    let Some(bounds) = Bounds::of(&plane) else {
        return Vec::new();
    };
    let viewport = Viewport::fit(bounds.padded(padding), width, height);
    plane.into_iter().map(|p| viewport.to_pixel(p)).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mercator_maps_the_origin_to_the_origin() {
        let p = mercator(TrackPoint::new(0.0, 0.0));
        assert!(p.x.abs() < 1e-9);
        assert!(p.y.abs() < 1e-9);
    }

    #[test]
    fn mercator_is_symmetric_about_the_equator() {
        let north = mercator(TrackPoint::new(45.0, 10.0));
        let south = mercator(TrackPoint::new(-45.0, 10.0));
        assert!((north.y + south.y).abs() < 1e-6);
        assert!((north.x - south.x).abs() < 1e-9);
    }

    #[test]
    fn mercator_antimeridian_x() {
        let p = mercator(TrackPoint::new(0.0, 180.0));
        assert!((p.x - std::f64::consts::PI * EARTH_RADIUS_M).abs() < 1e-3);
    }

    #[test]
    fn mercator_clamps_polar_latitudes() {
        let pole = mercator(TrackPoint::new(90.0, 0.0));
        assert!(pole.y.is_finite());
        let clamped = mercator(TrackPoint::new(MAX_LATITUDE_DEG, 0.0));
        assert!((pole.y - clamped.y).abs() < 1e-9);
    }

    #[test]
    fn bounds_of_empty_set_is_none() {
        assert!(Bounds::of(&[]).is_none());
    }

    #[test]
    fn bounds_cover_all_points() {
        let points = [
            PlanePoint { x: 3.0, y: -1.0 },
            PlanePoint { x: -2.0, y: 4.0 },
            PlanePoint { x: 1.0, y: 0.0 },
        ];
        let bounds = Bounds::of(&points).unwrap();
        assert!((bounds.min_x - -2.0).abs() < 1e-12);
        assert!((bounds.max_x - 3.0).abs() < 1e-12);
        assert!((bounds.min_y - -1.0).abs() < 1e-12);
        assert!((bounds.max_y - 4.0).abs() < 1e-12);
    }

    #[test]
    fn padding_grows_each_side_by_the_fraction() {
        let bounds = Bounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 100.0,
            max_y: 40.0,
        };
        let padded = bounds.padded(0.15);
        assert!((padded.width() - 130.0).abs() < 1e-9);
        assert!((padded.height() - 52.0).abs() < 1e-9);
        assert!((padded.min_x - -15.0).abs() < 1e-9);
    }

    #[test]
    fn single_point_track_lands_at_the_canvas_center() {
        let track = Track::new(vec![TrackPoint::new(52.5, 13.4)]);
        let pixels = project_track(&track, 500, 500, 0.15);
        assert_eq!(pixels, vec![(250.0, 250.0)]);
    }

    #[test]
    fn fit_preserves_aspect_ratio() {
        // Two degrees of longitude by one of latitude at the equator is
        // almost exactly a 2:1 box on the Mercator plane.
        let track = Track::new(vec![
            TrackPoint::new(0.0, 10.0),
            TrackPoint::new(1.0, 12.0),
        ]);
        let pixels = project_track(&track, 1000, 1000, 0.0);
        let dx = (pixels[1].0 - pixels[0].0).abs();
        let dy = (pixels[1].1 - pixels[0].1).abs();
        assert!((dx - 1000.0).abs() < 0.5, "x span {dx}");
        assert!((dy - 500.0).abs() < 1.0, "y span {dy}");
    }

    #[test]
    fn north_maps_to_smaller_pixel_y() {
        let track = Track::new(vec![
            TrackPoint::new(52.50, 13.4),
            TrackPoint::new(52.51, 13.4),
        ]);
        let pixels = project_track(&track, 400, 400, 0.1);
        assert!(pixels[1].1 < pixels[0].1, "north is not up: {pixels:?}");
    }

    #[test]
    fn zero_width_bounds_still_fit_finitely() {
        // A track running due north has no longitude extent; the scale
        // must come from the latitude span alone.
        let track = Track::new(vec![
            TrackPoint::new(52.50, 13.4),
            TrackPoint::new(52.52, 13.4),
        ]);
        let pixels = project_track(&track, 400, 400, 0.1);
        for (x, y) in &pixels {
            assert!(x.is_finite() && y.is_finite());
            assert!((x - 200.0).abs() < 1e-3, "x should center: {x}");
            assert!(*y >= 0.0 && *y <= 400.0);
        }
    }

    #[test]
    fn projection_preserves_point_order_and_count() {
        let track = Track::new(vec![
            TrackPoint::new(52.500, 13.40),
            TrackPoint::new(52.505, 13.41),
            TrackPoint::new(52.510, 13.40),
        ]);
        let pixels = project_track(&track, 640, 640, 0.15);
        assert_eq!(pixels.len(), 3);
        // First and third share a longitude, so they share a pixel x.
        assert!((pixels[0].0 - pixels[2].0).abs() < 1e-3);
    }
}
