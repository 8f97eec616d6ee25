//! paceframe-pipeline: Pure GPX-to-poster rendering pipeline (sans-IO).
//!
//! Converts a recorded GPS track into a printable race poster through:
//! parse -> clean -> measure -> render map -> compose.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and returns raster images plus structured statistics.
//! Filesystem, network, and terminal interaction live in the callers
//! (`paceframe-export` and the `paceframe` binary). Resources cross the
//! boundary through seams: basemap rasters through [`BasemapSource`],
//! fonts through [`FontSet`], wall-clock time through [`Clock`].

pub mod clean;
pub mod decode;
pub mod diagnostics;
pub mod logo;
pub mod map;
pub mod metrics;
pub mod pipeline;
pub mod poster;
pub mod project;
pub mod strokes;
pub mod text;
pub mod types;

pub use clean::SmootherKind;
pub use diagnostics::{Clock, PipelineDiagnostics, PosterSummary};
pub use map::{BasemapError, BasemapSource};
pub use pipeline::{Pipeline, PosterArtifacts, process, process_with_diagnostics};
pub use poster::LayoutTemplate;
pub use project::Bounds;
pub use text::{FontSet, Typeface};
pub use types::{
    BackgroundStyle, EventInfo, MapTheme, PosterConfig, PosterError, PosterRequest, Rgb,
    RgbaImage, RunStats, StyleConfig, Track, TrackPoint,
};
