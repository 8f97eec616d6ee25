//! Shared types for the paceframe poster pipeline.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::clean::SmootherKind;
use crate::poster::LayoutTemplate;

/// Re-export `RgbaImage` so downstream crates can reference rendered
/// output without depending on `image` directly.
pub use image::RgbaImage;

/// A single recorded GPS sample.
///
/// Sequence order is significant: a track's point order encodes the
/// chronological path of the run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    /// Latitude in degrees, negative south (`-90.0..=90.0`).
    pub lat: f64,
    /// Longitude in degrees, negative west (`-180.0..=180.0`).
    pub lon: f64,
    /// Elevation in meters above sea level, when the recorder provided one.
    pub elevation: Option<f64>,
    /// Timestamp of the sample, when the recorder provided one.
    pub time: Option<OffsetDateTime>,
}

impl TrackPoint {
    /// Create a point with no elevation or timestamp.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            elevation: None,
            time: None,
        }
    }
}

/// An ordered sequence of track points.
///
/// Used both for the raw parser output and for the cleaned track; the
/// pipeline stage types carry the distinction. A freshly parsed track may
/// contain duplicates, GPS jitter, and isolated outliers. A cleaned track
/// is never longer than its source and has no consecutive duplicate
/// coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Track(Vec<TrackPoint>);

impl Track {
    /// Create a new track from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<TrackPoint>) -> Self {
        Self(points)
    }

    /// Returns `true` if the track has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the track.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&TrackPoint> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&TrackPoint> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[TrackPoint] {
        &self.0
    }

    /// Consumes the track and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<TrackPoint> {
        self.0
    }
}

/// An opaque sRGB color.
///
/// Parses from CSS hex notation (`#rgb` or `#rrggbb`) and serializes back
/// to six-digit hex, matching what the style layer hands over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

/// A color string that is not valid CSS hex notation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid CSS hex color: {0:?}")]
pub struct ColorParseError(pub String);

impl Rgb {
    /// Create a color from channel values.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a CSS hex color: `#rgb`, `#rrggbb`, leading `#` optional.
    ///
    /// # Errors
    ///
    /// Returns [`ColorParseError`] when the string is not 3- or 6-digit
    /// hex.
    pub fn from_hex(s: &str) -> Result<Self, ColorParseError> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if !hex.is_ascii() {
            return Err(ColorParseError(s.to_string()));
        }
        let channel =
            |h: &str| u8::from_str_radix(h, 16).map_err(|_| ColorParseError(s.to_string()));
        match hex.len() {
            3 => {
                // Shorthand: each digit doubles, so 0xF expands to 0xFF.
                let r = channel(&hex[0..1])?;
                let g = channel(&hex[1..2])?;
                let b = channel(&hex[2..3])?;
                Ok(Self::new(r * 17, g * 17, b * 17))
            }
            6 => Ok(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            _ => Err(ColorParseError(s.to_string())),
        }
    }

    /// Format as six-digit CSS hex with a leading `#`.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Named map background theme.
///
/// Each theme resolves to a flat fill color approximating the tile style
/// it is named after; a basemap collaborator, when present, replaces the
/// fill with an actual map raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapTheme {
    /// Deep navy, the default poster look.
    DarkBlue,
    /// Near-white minimal style.
    Light,
    /// Warm beige terrain tone.
    Terrain,
    /// Soft paper watercolor tone.
    Watercolor,
    /// Plain white, for high-contrast black line work.
    Toner,
}

impl Default for MapTheme {
    fn default() -> Self {
        Self::DarkBlue
    }
}

impl MapTheme {
    /// The flat fill color used when no basemap raster is supplied.
    #[must_use]
    pub const fn flat_color(self) -> Rgb {
        match self {
            Self::DarkBlue => Rgb::new(16, 24, 40),
            Self::Light => Rgb::new(244, 243, 239),
            Self::Terrain => Rgb::new(221, 211, 188),
            Self::Watercolor => Rgb::new(242, 239, 233),
            Self::Toner => Rgb::new(255, 255, 255),
        }
    }
}

impl std::fmt::Display for MapTheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DarkBlue => f.write_str("DarkBlue"),
            Self::Light => f.write_str("Light"),
            Self::Terrain => f.write_str("Terrain"),
            Self::Watercolor => f.write_str("Watercolor"),
            Self::Toner => f.write_str("Toner"),
        }
    }
}

/// Map background: a named theme or an explicit flat color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BackgroundStyle {
    /// One of the named themes.
    Theme(MapTheme),
    /// An arbitrary flat fill color.
    Flat(Rgb),
}

impl Default for BackgroundStyle {
    fn default() -> Self {
        Self::Theme(MapTheme::default())
    }
}

impl BackgroundStyle {
    /// The flat fill color this background resolves to.
    #[must_use]
    pub const fn color(self) -> Rgb {
        match self {
            Self::Theme(theme) => theme.flat_color(),
            Self::Flat(color) => color,
        }
    }
}

/// Colors and background for the route map.
///
/// Pure value, supplied by whatever front end collects the user's
/// choices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleConfig {
    /// Map background behind the route.
    pub background: BackgroundStyle,
    /// Route polyline color.
    pub route_color: Rgb,
    /// Start marker (filled circle) color.
    pub start_color: Rgb,
    /// End marker (X) color.
    pub end_color: Rgb,
}

impl StyleConfig {
    /// Default route color (orange).
    pub const DEFAULT_ROUTE_COLOR: Rgb = Rgb::new(255, 165, 0);
    /// Default start marker color (gold).
    pub const DEFAULT_START_COLOR: Rgb = Rgb::new(255, 215, 0);
    /// Default end marker color (white).
    pub const DEFAULT_END_COLOR: Rgb = Rgb::new(255, 255, 255);
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            background: BackgroundStyle::default(),
            route_color: Self::DEFAULT_ROUTE_COLOR,
            start_color: Self::DEFAULT_START_COLOR,
            end_color: Self::DEFAULT_END_COLOR,
        }
    }
}

/// Event metadata drawn onto the poster.
///
/// All strings are display-ready: the date is already formatted, the
/// duration is `HH:MM:SS` or `MM:SS`. Pure value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventInfo {
    /// Event title, drawn uppercased across the top.
    pub title: String,
    /// Display-formatted event date.
    pub date: String,
    /// Athlete name.
    pub athlete: String,
    /// Bib number, drawn right-aligned with a `#` prefix.
    pub bib: String,
    /// Official distance in kilometers. Values `<= 0` fall back to the
    /// distance measured from the cleaned track.
    pub distance_km: f64,
    /// Finishing time as `HH:MM:SS` or `MM:SS`. Any other shape parses
    /// as zero seconds.
    pub duration: String,
    /// Pace as `MM:SS` per kilometer, or `None` to compute it from
    /// distance and duration.
    pub pace: Option<String>,
}

/// Configuration for a poster render.
///
/// All parameters have defaults matching the classic poster design.
/// Fields are public with no construction-time validation; the pipeline
/// runs [`Self::validate`] before touching the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosterConfig {
    /// Colors and background for the route map.
    pub style: StyleConfig,

    /// Which smoothing strategy the cleaner applies.
    pub smoother: SmootherKind,

    /// Smoothing strength. Gaussian kernel sigma, or the moving-average
    /// window size. Larger is smoother.
    pub smoothing: f64,

    /// Edge length in pixels of the square route map render.
    pub map_size: u32,

    /// Bounding-box padding as a fraction of route extent added on each
    /// side, so the route does not touch the frame.
    pub padding: f64,

    /// Route polyline stroke width in pixels at `map_size` resolution.
    pub route_width: f32,

    /// Start/end marker radius in pixels at `map_size` resolution.
    pub marker_radius: f32,

    /// Poster canvas width in pixels.
    pub canvas_width: u32,

    /// Poster canvas height in pixels.
    pub canvas_height: u32,

    /// Proportional poster layout.
    pub layout: LayoutTemplate,
}

impl PosterConfig {
    /// Default smoothing strength (the midpoint of the 1-10 range the
    /// original slider offered).
    pub const DEFAULT_SMOOTHING: f64 = 5.0;
    /// Default route map edge length in pixels.
    pub const DEFAULT_MAP_SIZE: u32 = 2000;
    /// Default bounding-box padding fraction.
    pub const DEFAULT_PADDING: f64 = 0.15;
    /// Default route stroke width in pixels.
    pub const DEFAULT_ROUTE_WIDTH: f32 = 10.0;
    /// Default marker radius in pixels.
    pub const DEFAULT_MARKER_RADIUS: f32 = 22.0;
    /// Default canvas width: A4 at 300 DPI.
    pub const DEFAULT_CANVAS_WIDTH: u32 = 2480;
    /// Default canvas height: A4 at 300 DPI.
    pub const DEFAULT_CANVAS_HEIGHT: u32 = 3508;

    /// Check that a render with this configuration can allocate its
    /// canvases and produce meaningful geometry.
    ///
    /// # Errors
    ///
    /// Returns [`PosterError::InvalidConfig`] naming the first problem
    /// found.
    pub fn validate(&self) -> Result<(), PosterError> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(PosterError::InvalidConfig(format!(
                "canvas is {}x{}",
                self.canvas_width, self.canvas_height,
            )));
        }
        if self.map_size == 0 {
            return Err(PosterError::InvalidConfig("map size is 0".to_string()));
        }
        if !self.smoothing.is_finite() || self.smoothing <= 0.0 {
            return Err(PosterError::InvalidConfig(format!(
                "smoothing strength {} is not positive",
                self.smoothing,
            )));
        }
        if !self.padding.is_finite() || self.padding < 0.0 {
            return Err(PosterError::InvalidConfig(format!(
                "padding {} is negative",
                self.padding,
            )));
        }
        if !self.route_width.is_finite() || self.route_width <= 0.0 {
            return Err(PosterError::InvalidConfig(format!(
                "route width {} is not positive",
                self.route_width,
            )));
        }
        if !self.marker_radius.is_finite() || self.marker_radius < 0.0 {
            return Err(PosterError::InvalidConfig(format!(
                "marker radius {} is negative",
                self.marker_radius,
            )));
        }
        Ok(())
    }
}

impl Default for PosterConfig {
    fn default() -> Self {
        Self {
            style: StyleConfig::default(),
            smoother: SmootherKind::default(),
            smoothing: Self::DEFAULT_SMOOTHING,
            map_size: Self::DEFAULT_MAP_SIZE,
            padding: Self::DEFAULT_PADDING,
            route_width: Self::DEFAULT_ROUTE_WIDTH,
            marker_radius: Self::DEFAULT_MARKER_RADIUS,
            canvas_width: Self::DEFAULT_CANVAS_WIDTH,
            canvas_height: Self::DEFAULT_CANVAS_HEIGHT,
            layout: LayoutTemplate::default(),
        }
    }
}

/// Everything one render call needs besides the GPX bytes.
///
/// Constructed once per render and passed by value through the pipeline;
/// there is no ambient mutable state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PosterRequest {
    /// Event metadata drawn onto the poster.
    pub event: EventInfo,
    /// Style, smoothing, and layout configuration.
    pub config: PosterConfig,
}

/// Performance metrics derived from the cleaned track and event info.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    /// Displayed distance in kilometers: the event's official distance,
    /// or the measured track distance when no official one was given.
    pub distance_km: f64,
    /// Distance measured from the cleaned track in kilometers.
    pub measured_km: f64,
    /// The duration string as displayed.
    pub duration: String,
    /// Parsed duration in seconds (0 for unparseable strings).
    pub duration_seconds: u64,
    /// Pace as `MM:SS` per kilometer.
    pub pace: String,
    /// Whether the cleaned track had fewer than 3 points, making the
    /// spatial statistics unreliable.
    pub degenerate: bool,
}

/// Errors that can occur while producing a poster.
///
/// Only malformed input is fatal; every other condition downstream of
/// parsing degrades to a defined default and still yields an image.
#[derive(Debug, thiserror::Error)]
pub enum PosterError {
    /// The input GPX bytes were empty.
    #[error("input GPX data is empty")]
    EmptyInput,

    /// The input was not a parseable GPX document.
    #[error("failed to parse GPX document: {0}")]
    MalformedGpx(#[from] gpx::errors::GpxError),

    /// The document parsed but contained no track points.
    #[error("GPX document contains no track points")]
    NoTrackPoints,

    /// Render configuration is unusable (e.g. a zero-sized canvas).
    #[error("invalid poster configuration: {0}")]
    InvalidConfig(String),
}
