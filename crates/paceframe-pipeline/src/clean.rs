//! Track cleaning: smoothing plus outlier removal, the second pipeline
//! step.
//!
//! GPS recordings jitter. Cleaning convolves the latitude and longitude
//! sequences with a smoothing kernel, drops consecutive duplicate
//! coordinates the smoothing (or the recorder) produced, and, for the
//! Gaussian strategy, removes isolated spatial outliers with a 3-sigma
//! rule over nearest-neighbor step distances.
//!
//! Tracks shorter than [`MIN_TRACK_POINTS`] are returned unchanged: the
//! smoothing and outlier statistics are undefined below that size.

use serde::{Deserialize, Serialize};

use crate::types::{Track, TrackPoint};

/// Minimum track length for cleaning to apply. Below this the cleaner is
/// the identity function.
pub const MIN_TRACK_POINTS: usize = 3;

/// Which smoothing strategy the cleaner applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmootherKind {
    /// Gaussian convolution of the coordinate sequences, followed by a
    /// 3-sigma outlier pass. The smoothing strength is the kernel sigma.
    Gaussian,
    /// Centered moving average; boundary points within half a window of
    /// either end keep their original value. No outlier pass. The
    /// smoothing strength is the window size.
    MovingAverage,
}

impl Default for SmootherKind {
    fn default() -> Self {
        Self::Gaussian
    }
}

impl std::fmt::Display for SmootherKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gaussian => f.write_str("Gaussian"),
            Self::MovingAverage => f.write_str("MovingAverage"),
        }
    }
}

/// Counts describing what cleaning did, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanStats {
    /// Whether cleaning ran at all (`false` for tracks below
    /// [`MIN_TRACK_POINTS`], which pass through unchanged).
    pub applied: bool,
    /// Consecutive duplicate coordinate pairs removed after smoothing.
    pub duplicates_removed: usize,
    /// Points removed by the 3-sigma outlier pass.
    pub outliers_removed: usize,
}

/// Clean a track: smooth, drop consecutive duplicates, and (for the
/// Gaussian strategy) remove 3-sigma outliers.
///
/// The output is never longer than the input. Elevation and timestamps
/// ride along unchanged with their points; only coordinates are smoothed.
/// A track that cleans down to a single point is valid; downstream
/// stages treat it as distance 0 and draw markers with no line.
#[must_use]
pub fn clean(track: &Track, smoother: SmootherKind, smoothing: f64) -> (Track, CleanStats) {
    if track.len() < MIN_TRACK_POINTS {
        return (
            track.clone(),
            CleanStats {
                applied: false,
                duplicates_removed: 0,
                outliers_removed: 0,
            },
        );
    }

    let smoothed = match smoother {
        SmootherKind::Gaussian => gaussian_smooth(track.points(), smoothing),
        SmootherKind::MovingAverage => moving_average_smooth(track.points(), smoothing),
    };

    let (deduped, duplicates_removed) = dedup_consecutive(smoothed);
    let (kept, outliers_removed) = match smoother {
        SmootherKind::Gaussian => remove_outliers(deduped),
        SmootherKind::MovingAverage => (deduped, 0),
    };

    (
        Track::new(kept),
        CleanStats {
            applied: true,
            duplicates_removed,
            outliers_removed,
        },
    )
}

// ───────────────────────── Gaussian smoothing ─────────────────────────

/// Normalized Gaussian kernel with radius `floor(4 * sigma + 0.5)`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap, clippy::cast_precision_loss)]
fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (4.0f64.mul_add(sigma, 0.5)).max(0.0) as isize;
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|i| {
            let x = i as f64;
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = kernel.iter().sum();
    for weight in &mut kernel {
        *weight /= sum;
    }
    kernel
}

/// Convolve a sequence with a symmetric kernel, reflecting at the
/// boundaries (index -1 maps to 0, index `n` maps to `n - 1`, folds
/// repeat for kernels wider than the signal).
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn convolve_reflect(values: &[f64], kernel: &[f64]) -> Vec<f64> {
    let n = values.len() as isize;
    let radius = (kernel.len() / 2) as isize;
    (0..n)
        .map(|center| {
            kernel
                .iter()
                .enumerate()
                .map(|(k, weight)| {
                    let mut idx = center + k as isize - radius;
                    while idx < 0 || idx >= n {
                        if idx < 0 {
                            idx = -idx - 1;
                        } else {
                            idx = 2 * n - idx - 1;
                        }
                    }
                    weight * values[idx as usize]
                })
                .sum()
        })
        .collect()
}

/// Smooth coordinates with a Gaussian kernel of standard deviation
/// `sigma`. Point count is unchanged; a non-positive sigma smooths
/// nothing.
fn gaussian_smooth(points: &[TrackPoint], sigma: f64) -> Vec<TrackPoint> {
    if sigma <= 0.0 {
        return points.to_vec();
    }
    let lats: Vec<f64> = points.iter().map(|p| p.lat).collect();
    let lons: Vec<f64> = points.iter().map(|p| p.lon).collect();
    let kernel = gaussian_kernel(sigma);
    let smooth_lats = convolve_reflect(&lats, &kernel);
    let smooth_lons = convolve_reflect(&lons, &kernel);
    points
        .iter()
        .enumerate()
        .map(|(i, p)| TrackPoint {
            lat: smooth_lats[i],
            lon: smooth_lons[i],
            ..*p
        })
        .collect()
}

// ───────────────────────── Moving average ─────────────────────────────

/// Centered moving average with the window rounded to the nearest odd
/// size so the mean stays centered. Boundary points without a full
/// window keep their original value.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[allow(clippy::cast_precision_loss)]
fn moving_average_smooth(points: &[TrackPoint], window: f64) -> Vec<TrackPoint> {
    let window = window.round().max(1.0) as usize;
    let half = window / 2;
    let n = points.len();
    if half == 0 {
        return points.to_vec();
    }

    let mean_over = |extract: fn(&TrackPoint) -> f64, i: usize| -> f64 {
        let slice = &points[i - half..=i + half];
        slice.iter().map(extract).sum::<f64>() / slice.len() as f64
    };

    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            if i < half || i + half >= n {
                *p
            } else {
                TrackPoint {
                    lat: mean_over(|p| p.lat, i),
                    lon: mean_over(|p| p.lon, i),
                    ..*p
                }
            }
        })
        .collect()
}

// ───────────────────────── Filtering passes ───────────────────────────

/// Drop points whose coordinates exactly equal the previous retained
/// point's. Exact equality is deliberate: only true duplicates go, a
/// route crossing itself keeps its crossing.
#[allow(clippy::float_cmp)]
fn dedup_consecutive(points: Vec<TrackPoint>) -> (Vec<TrackPoint>, usize) {
    let before = points.len();
    let mut out: Vec<TrackPoint> = Vec::with_capacity(before);
    for p in points {
        if let Some(prev) = out.last()
            && prev.lat == p.lat
            && prev.lon == p.lon
        {
            continue;
        }
        out.push(p);
    }
    let removed = before - out.len();
    (out, removed)
}

/// Remove points whose step distance to the previous point exceeds
/// `mean + 3 * stddev` of all step distances (population stddev, degree
/// space). The first point's step is 0 and is never an outlier. Steps
/// are computed once against the pre-filter order, not re-derived as
/// points drop out.
#[allow(clippy::cast_precision_loss)]
fn remove_outliers(points: Vec<TrackPoint>) -> (Vec<TrackPoint>, usize) {
    if points.len() < MIN_TRACK_POINTS {
        return (points, 0);
    }

    let steps: Vec<f64> = std::iter::once(0.0)
        .chain(points.windows(2).map(|pair| {
            let d_lat = pair[1].lat - pair[0].lat;
            let d_lon = pair[1].lon - pair[0].lon;
            d_lat.hypot(d_lon)
        }))
        .collect();

    let n = steps.len() as f64;
    let mean = steps.iter().sum::<f64>() / n;
    let variance = steps.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
    let threshold = 3.0f64.mul_add(variance.sqrt(), mean);

    let before = points.len();
    let kept: Vec<TrackPoint> = points
        .into_iter()
        .zip(steps)
        .filter(|&(_, step)| step <= threshold)
        .map(|(p, _)| p)
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::metrics::{haversine_km, track_distance_km};

    fn track(coords: &[(f64, f64)]) -> Track {
        Track::new(
            coords
                .iter()
                .map(|&(lat, lon)| TrackPoint::new(lat, lon))
                .collect(),
        )
    }

    // --- identity threshold ---

    #[test]
    fn clean_is_identity_below_three_points() {
        for coords in [
            &[][..],
            &[(52.5, 13.4)][..],
            // Even an exact duplicate pair stays: no pass runs at all.
            &[(52.5, 13.4), (52.5, 13.4)][..],
        ] {
            let input = track(coords);
            let (output, stats) = clean(&input, SmootherKind::Gaussian, 5.0);
            assert_eq!(output, input);
            assert!(!stats.applied);
            assert_eq!(stats.duplicates_removed, 0);
            assert_eq!(stats.outliers_removed, 0);
        }
    }

    #[test]
    fn clean_never_grows_the_track() {
        let coords: Vec<(f64, f64)> = (0..50)
            .map(|i| {
                let t = f64::from(i) * 0.001;
                // A wiggly diagonal with some jitter.
                (52.5 + t + 0.0003 * f64::from(i % 3), 13.4 + t)
            })
            .collect();
        let input = track(&coords);
        for smoother in [SmootherKind::Gaussian, SmootherKind::MovingAverage] {
            let (output, _) = clean(&input, smoother, 5.0);
            assert!(output.len() <= input.len());
            assert!(!output.is_empty());
        }
    }

    // --- Gaussian smoothing ---

    #[test]
    fn gaussian_kernel_is_normalized_and_symmetric() {
        let kernel = gaussian_kernel(2.0);
        // radius = floor(4 * 2 + 0.5) = 8, so 17 taps.
        assert_eq!(kernel.len(), 17);
        let sum: f64 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        for i in 0..kernel.len() / 2 {
            assert!((kernel[i] - kernel[kernel.len() - 1 - i]).abs() < 1e-15);
        }
    }

    #[test]
    fn gaussian_preserves_constant_sequences() {
        let values = vec![7.25; 20];
        let smoothed = convolve_reflect(&values, &gaussian_kernel(3.0));
        for v in smoothed {
            assert!((v - 7.25).abs() < 1e-12);
        }
    }

    #[test]
    fn gaussian_collapses_a_constant_track_to_one_point() {
        // Constant coordinates smooth to themselves, then dedup to one.
        let input = track(&[(52.5, 13.4); 10]);
        let (output, stats) = clean(&input, SmootherKind::Gaussian, 2.0);
        assert_eq!(output.len(), 1);
        assert_eq!(stats.duplicates_removed, 9);
    }

    #[test]
    fn gaussian_pulls_jitter_toward_neighbors() {
        // Middle point offset from a straight line; smoothing must move
        // it toward the line without touching the point count.
        let mut coords = vec![(52.500, 13.40), (52.501, 13.40), (52.502, 13.40)];
        coords[1].1 = 13.41;
        let smoothed = gaussian_smooth(&track(&coords).into_points(), 1.0);
        assert_eq!(smoothed.len(), 3);
        assert!(smoothed[1].lon < 13.41 && smoothed[1].lon > 13.40);
        // Its neighbors absorb part of the offset in exchange.
        assert!(smoothed[0].lon > 13.40);
        assert!(smoothed[2].lon > 13.40);
    }

    #[test]
    fn smoothing_keeps_elevation_and_time_with_their_points() {
        let mut points: Vec<TrackPoint> = (0..5)
            .map(|i| TrackPoint::new(52.5 + f64::from(i) * 0.001, 13.4))
            .collect();
        points[2].elevation = Some(120.0);
        let (output, _) = clean(&Track::new(points), SmootherKind::Gaussian, 1.0);
        assert_eq!(output.points()[2].elevation, Some(120.0));
    }

    // --- moving average ---

    #[test]
    fn moving_average_boundary_points_keep_original_values() {
        let coords = [
            (52.500, 13.40),
            (52.510, 13.41),
            (52.520, 13.42),
            (52.530, 13.43),
            (52.540, 13.44),
        ];
        let smoothed = moving_average_smooth(&track(&coords).into_points(), 3.0);
        assert!((smoothed[0].lat - 52.500).abs() < 1e-12);
        assert!((smoothed[4].lat - 52.540).abs() < 1e-12);
        // Interior point is the mean of its window.
        let expected = (52.500 + 52.510 + 52.520) / 3.0;
        assert!((smoothed[1].lat - expected).abs() < 1e-12);
    }

    #[test]
    fn moving_average_window_one_changes_nothing() {
        let coords = [(52.5, 13.4), (52.5, 13.4), (52.6, 13.5)];
        let smoothed = moving_average_smooth(&track(&coords).into_points(), 1.0);
        assert_eq!(smoothed, track(&coords).into_points());
    }

    #[test]
    fn moving_average_has_no_outlier_pass() {
        // A wild jump survives MovingAverage cleaning with window 1.
        let mut coords: Vec<(f64, f64)> = (0..20)
            .map(|i| (50.0 + f64::from(i) * 0.001, 8.0))
            .collect();
        coords.push((51.0, 8.0));
        let input = track(&coords);
        let (output, stats) = clean(&input, SmootherKind::MovingAverage, 1.0);
        assert_eq!(output.len(), input.len());
        assert_eq!(stats.outliers_removed, 0);
    }

    // --- dedup ---

    #[test]
    fn dedup_removes_consecutive_duplicates_only() {
        // Window 1 makes smoothing the identity, so dedup sees raw
        // coordinates: the repeated middle collapses, the revisited
        // start does not.
        let input = track(&[
            (52.5, 13.4),
            (52.6, 13.5),
            (52.6, 13.5),
            (52.6, 13.5),
            (52.5, 13.4),
        ]);
        let (output, stats) = clean(&input, SmootherKind::MovingAverage, 1.0);
        assert_eq!(output.len(), 3);
        assert_eq!(stats.duplicates_removed, 2);
        assert_eq!(output.points()[0], output.points()[2]);
    }

    // --- outlier pass ---

    #[test]
    fn gaussian_outlier_pass_drops_an_isolated_jump() {
        // Sigma small enough that the kernel radius is zero, so the
        // outlier pass sees raw coordinates.
        let mut coords: Vec<(f64, f64)> = (0..11)
            .map(|i| (50.0 + f64::from(i) * 0.001, 8.0))
            .collect();
        coords.insert(6, (51.0, 8.0));
        let input = track(&coords);
        let (output, stats) = clean(&input, SmootherKind::Gaussian, 0.001);
        assert_eq!(stats.outliers_removed, 1);
        assert_eq!(output.len(), input.len() - 1);
        for p in output.points() {
            assert!(p.lat < 50.5, "outlier survived cleaning: {p:?}");
        }
    }

    #[test]
    fn uniform_steps_produce_no_outliers() {
        let coords: Vec<(f64, f64)> = (0..30)
            .map(|i| (50.0 + f64::from(i) * 0.001, 8.0))
            .collect();
        let (output, stats) = clean(&track(&coords), SmootherKind::Gaussian, 0.001);
        assert_eq!(stats.outliers_removed, 0);
        assert_eq!(output.len(), 30);
    }

    // --- distance over a cleaned straight line ---

    #[test]
    fn cleaned_straight_line_distance_is_the_segment_sum() {
        let input = track(&[(0.00, 10.0), (0.01, 10.0), (0.02, 10.0), (0.03, 10.0)]);
        let (output, _) = clean(&input, SmootherKind::Gaussian, 1.0);
        assert_eq!(output.len(), 4);

        let points = output.points();
        let by_hand = haversine_km(points[0], points[1])
            + haversine_km(points[1], points[2])
            + haversine_km(points[2], points[3]);
        let total = track_distance_km(&output);
        assert!(
            (total - by_hand).abs() / by_hand < 0.001,
            "summed {total} km, hand-computed {by_hand} km",
        );
        // Smoothing a 4-point line squeezes the ends inward, so the
        // distance shrinks but stays the same order of magnitude as the
        // raw 3.3 km span.
        assert!(total > 1.0 && total < 3.4, "implausible distance {total}");
    }

    // --- config plumbing ---

    #[test]
    fn default_smoother_is_gaussian() {
        assert_eq!(SmootherKind::default(), SmootherKind::Gaussian);
    }

    #[test]
    fn smoother_kind_serde_round_trip() {
        for kind in [SmootherKind::Gaussian, SmootherKind::MovingAverage] {
            let json = serde_json::to_string(&kind).unwrap();
            let back: SmootherKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn smoother_kind_display_names() {
        assert_eq!(SmootherKind::Gaussian.to_string(), "Gaussian");
        assert_eq!(SmootherKind::MovingAverage.to_string(), "MovingAverage");
    }
}
