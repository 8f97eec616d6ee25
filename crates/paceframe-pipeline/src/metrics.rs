//! Scalar performance metrics: distance, duration, and pace.
//!
//! Everything here is a pure function of its arguments. Distance comes
//! from summing haversine great-circle segments over a track; pace is
//! derived from distance plus the user-supplied duration string. Bad
//! duration strings are a defined degenerate input (zero seconds), never
//! an error, so the poster always renders with *something* in the stats
//! row.

use crate::types::{Track, TrackPoint};

/// Mean Earth radius in kilometers, as used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points in kilometers.
#[must_use]
pub fn haversine_km(a: TrackPoint, b: TrackPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();
    EARTH_RADIUS_KM * c
}

/// Total distance along a track in kilometers: the sum of haversine
/// distances between consecutive points. A track with fewer than two
/// points has distance 0.
#[must_use]
pub fn track_distance_km(track: &Track) -> f64 {
    track
        .points()
        .windows(2)
        .map(|pair| haversine_km(pair[0], pair[1]))
        .sum()
}

/// Parse a duration string into whole seconds.
///
/// Three colon-separated numeric parts are `hours:minutes:seconds`, two
/// are `minutes:seconds`. Any other shape (wrong part count, non-numeric
/// parts, empty string) yields 0 seconds. This is a defined degenerate
/// input, not a failure: the caller still gets a poster, just with a
/// zeroed time.
#[must_use]
pub fn parse_duration_secs(s: &str) -> u64 {
    let parts: Option<Vec<u64>> = s.split(':').map(|p| p.trim().parse().ok()).collect();
    match parts.as_deref() {
        Some([h, m, s]) => h * 3600 + m * 60 + s,
        Some([m, s]) => m * 60 + s,
        _ => 0,
    }
}

/// Pace in seconds per kilometer, formatted `MM:SS`.
///
/// Computed as `floor(duration_seconds / distance_km)` with seconds
/// carrying into minutes. A distance of zero or less yields `"00:00"`
/// for any duration.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[allow(clippy::cast_precision_loss)]
pub fn calculate_pace(distance_km: f64, duration: &str) -> String {
    if distance_km <= 0.0 {
        return "00:00".to_string();
    }
    let total_secs = parse_duration_secs(duration);
    let secs_per_km = (total_secs as f64 / distance_km).floor().max(0.0) as u64;
    format!("{:02}:{:02}", secs_per_km / 60, secs_per_km % 60)
}

/// Format whole seconds as `HH:MM:SS`, or `MM:SS` when under an hour.
#[must_use]
pub fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

/// Format a distance for the stats row with two decimals.
#[must_use]
pub fn format_km(distance_km: f64) -> String {
    format!("{distance_km:.2}")
}
