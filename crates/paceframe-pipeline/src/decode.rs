//! GPX decoding: the first pipeline step.
//!
//! Flattens every track, segment, and point of a GPX 1.0/1.1 document
//! into one ordered [`Track`], concatenated in document order. Points are
//! never merged, reordered, or deduplicated here; that is the cleaner's
//! job. Missing elevation or timestamp on a point stays absent, never
//! fabricated.

use time::OffsetDateTime;

use crate::types::{PosterError, Track, TrackPoint};

/// Decode GPX bytes into a flat ordered track.
///
/// Multi-track and multi-segment documents are concatenated in document
/// order. Waypoints and routes outside `<trk>` elements are ignored; a
/// run recording lives in its tracks.
///
/// # Errors
///
/// Returns [`PosterError::EmptyInput`] if `gpx_bytes` is empty,
/// [`PosterError::MalformedGpx`] if the document is not valid GPX XML,
/// and [`PosterError::NoTrackPoints`] if it parses but contains zero
/// track points, since downstream stages require at least one.
pub fn decode(gpx_bytes: &[u8]) -> Result<Track, PosterError> {
    if gpx_bytes.is_empty() {
        return Err(PosterError::EmptyInput);
    }

    let document = gpx::read(gpx_bytes)?;

    let mut points = Vec::new();
    for track in document.tracks {
        for segment in track.segments {
            for waypoint in segment.points {
                // geo points are (x, y) = (lon, lat).
                let position = waypoint.point();
                points.push(TrackPoint {
                    lat: position.y(),
                    lon: position.x(),
                    elevation: waypoint.elevation,
                    time: waypoint.time.map(OffsetDateTime::from),
                });
            }
        }
    }

    if points.is_empty() {
        return Err(PosterError::NoTrackPoints);
    }
    Ok(Track::new(points))
}
