//! The staged poster pipeline.
//!
//! Stages are typestates: each struct is a completed step that can only
//! advance, consuming itself, so a caller cannot compose a poster from
//! an uncleaned track or skip measurement. Fallible work happens where
//! the input enters ([`Pending::parse`]); every later stage degrades
//! instead of failing. [`process`] runs the chain end to end;
//! [`process_with_diagnostics`] additionally times each stage through an
//! injected [`Clock`].

use image::RgbaImage;

use crate::clean::{self, CleanStats, MIN_TRACK_POINTS};
use crate::decode;
use crate::diagnostics::{Clock, PipelineDiagnostics, StageDiagnostics, StageMetrics};
use crate::map::{self, BasemapSource, MapStats};
use crate::metrics;
use crate::poster;
use crate::text::FontSet;
use crate::types::{EventInfo, PosterError, PosterRequest, RunStats, Track};

/// Entry point for staged processing.
pub struct Pipeline;

impl Pipeline {
    /// Start a pipeline over raw GPX bytes.
    #[allow(clippy::new_ret_no_self)]
    #[must_use]
    pub const fn new(gpx_bytes: Vec<u8>, request: PosterRequest) -> Pending {
        Pending { gpx_bytes, request }
    }
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// A pipeline that has not parsed its input yet.
#[must_use = "pipeline stages are consumed by advancing; call .parse() to continue"]
pub struct Pending {
    gpx_bytes: Vec<u8>,
    request: PosterRequest,
}

impl Pending {
    /// Validate the configuration, then decode the GPX document.
    ///
    /// # Errors
    ///
    /// Returns [`PosterError::InvalidConfig`] for an unusable
    /// configuration, and the decode errors for empty input, a
    /// malformed document, or a document without track points.
    pub fn parse(self) -> Result<Parsed, PosterError> {
        self.request.config.validate()?;
        let raw = decode::decode(&self.gpx_bytes)?;
        Ok(Parsed {
            raw,
            request: self.request,
        })
    }
}

// ───────────────────────── Stage 1: Parsed ───────────────────────────

/// Holds the raw decoded track.
#[must_use = "pipeline stages are consumed by advancing; call .clean() to continue"]
pub struct Parsed {
    raw: Track,
    request: PosterRequest,
}

impl Parsed {
    /// The track exactly as decoded, before any cleaning.
    #[must_use]
    pub const fn raw_track(&self) -> &Track {
        &self.raw
    }

    /// Smooth the track and drop duplicates and outliers.
    pub fn clean(self) -> Cleaned {
        let (clean, clean_stats) = clean::clean(
            &self.raw,
            self.request.config.smoother,
            self.request.config.smoothing,
        );
        Cleaned {
            raw: self.raw,
            clean,
            clean_stats,
            request: self.request,
        }
    }
}

// ───────────────────────── Stage 2: Cleaned ──────────────────────────

/// Holds the raw and cleaned tracks.
#[must_use = "pipeline stages are consumed by advancing; call .measure() to continue"]
pub struct Cleaned {
    raw: Track,
    clean: Track,
    clean_stats: CleanStats,
    request: PosterRequest,
}

impl Cleaned {
    #[must_use]
    pub const fn raw_track(&self) -> &Track {
        &self.raw
    }

    #[must_use]
    pub const fn cleaned_track(&self) -> &Track {
        &self.clean
    }

    /// Counts describing what cleaning did.
    #[must_use]
    pub const fn clean_stats(&self) -> CleanStats {
        self.clean_stats
    }

    /// Derive distance, duration, and pace from the cleaned track and
    /// the event metadata.
    pub fn measure(self) -> Measured {
        let stats = derive_stats(&self.request.event, &self.clean);
        Measured {
            clean: self.clean,
            stats,
            request: self.request,
        }
    }
}

// ───────────────────────── Stage 3: Measured ─────────────────────────

/// Holds the cleaned track and the derived run statistics.
#[must_use = "pipeline stages are consumed by advancing; call .render_map() to continue"]
pub struct Measured {
    clean: Track,
    stats: RunStats,
    request: PosterRequest,
}

impl Measured {
    #[must_use]
    pub const fn cleaned_track(&self) -> &Track {
        &self.clean
    }

    #[must_use]
    pub const fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Render the route map, consulting `basemap` when one is supplied.
    /// A failing basemap downgrades the background and never fails the
    /// stage.
    pub fn render_map(self, basemap: Option<&dyn BasemapSource>) -> Rendered {
        let (route_map, map_stats) = map::render_route(&self.clean, &self.request.config, basemap);
        Rendered {
            clean: self.clean,
            stats: self.stats,
            route_map,
            map_stats,
            request: self.request,
        }
    }
}

// ───────────────────────── Stage 4: Rendered ─────────────────────────

/// Holds the rendered route map.
#[must_use = "pipeline stages are consumed by advancing; call .compose() to continue"]
pub struct Rendered {
    clean: Track,
    stats: RunStats,
    route_map: RgbaImage,
    map_stats: MapStats,
    request: PosterRequest,
}

impl Rendered {
    #[must_use]
    pub const fn route_map(&self) -> &RgbaImage {
        &self.route_map
    }

    #[must_use]
    pub const fn map_stats(&self) -> &MapStats {
        &self.map_stats
    }

    /// Compose the poster canvas with the given fonts.
    pub fn compose(self, fonts: &FontSet) -> Composed {
        let poster = poster::compose(
            &self.route_map,
            &self.request.event,
            &self.stats,
            &self.request.config,
            fonts,
        );
        Composed {
            clean: self.clean,
            stats: self.stats,
            route_map: self.route_map,
            poster,
        }
    }
}

// ───────────────────────── Stage 5: Composed ─────────────────────────

/// A finished render.
#[must_use = "call .into_artifacts() to take the rendered output"]
pub struct Composed {
    clean: Track,
    stats: RunStats,
    route_map: RgbaImage,
    poster: RgbaImage,
}

impl Composed {
    #[must_use]
    pub const fn poster(&self) -> &RgbaImage {
        &self.poster
    }

    /// Take ownership of everything the render produced.
    #[must_use]
    pub fn into_artifacts(self) -> PosterArtifacts {
        PosterArtifacts {
            poster: self.poster,
            route_map: self.route_map,
            stats: self.stats,
            cleaned_track: self.clean,
        }
    }
}

/// Everything one render produces.
#[derive(Debug, Clone)]
pub struct PosterArtifacts {
    /// The final poster canvas.
    pub poster: RgbaImage,
    /// The standalone route map, before fitting into the poster band.
    pub route_map: RgbaImage,
    /// Derived run statistics.
    pub stats: RunStats,
    /// The cleaned track the map and statistics came from.
    pub cleaned_track: Track,
}

/// Build the displayed statistics. The official event distance wins
/// when given; otherwise the measured track distance is displayed. An
/// explicit pace wins over the computed one.
fn derive_stats(event: &EventInfo, clean: &Track) -> RunStats {
    let measured_km = metrics::track_distance_km(clean);
    let distance_km = if event.distance_km > 0.0 {
        event.distance_km
    } else {
        measured_km
    };
    let pace = match &event.pace {
        Some(pace) if !pace.is_empty() => pace.clone(),
        _ => metrics::calculate_pace(distance_km, &event.duration),
    };
    RunStats {
        distance_km,
        measured_km,
        duration: event.duration.clone(),
        duration_seconds: metrics::parse_duration_secs(&event.duration),
        pace,
        degenerate: clean.len() < MIN_TRACK_POINTS,
    }
}

/// Run the whole pipeline in one call.
///
/// A missing or failing basemap and a degenerate track degrade the
/// poster without failing it; only unusable configuration and input
/// errors surface here.
///
/// # Errors
///
/// See [`Pending::parse`].
pub fn process(
    gpx_bytes: &[u8],
    request: &PosterRequest,
    basemap: Option<&dyn BasemapSource>,
    fonts: &FontSet,
) -> Result<PosterArtifacts, PosterError> {
    Ok(Pipeline::new(gpx_bytes.to_vec(), request.clone())
        .parse()?
        .clean()
        .measure()
        .render_map(basemap)
        .compose(fonts)
        .into_artifacts())
}

/// Run the pipeline and record per-stage timings through `clock`.
///
/// # Errors
///
/// See [`Pending::parse`].
pub fn process_with_diagnostics<C: Clock>(
    gpx_bytes: &[u8],
    request: &PosterRequest,
    basemap: Option<&dyn BasemapSource>,
    fonts: &FontSet,
    clock: &C,
) -> Result<(PosterArtifacts, PipelineDiagnostics), PosterError> {
    let run_start = clock.now();
    let mut stages = Vec::with_capacity(5);

    let start = clock.now();
    let parsed = Pipeline::new(gpx_bytes.to_vec(), request.clone()).parse()?;
    stages.push(StageDiagnostics {
        name: "parse".to_string(),
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Parse {
            points: parsed.raw_track().len(),
        },
    });

    let start = clock.now();
    let cleaned = parsed.clean();
    let clean_stats = cleaned.clean_stats();
    stages.push(StageDiagnostics {
        name: "clean".to_string(),
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Clean {
            points_before: cleaned.raw_track().len(),
            points_after: cleaned.cleaned_track().len(),
            duplicates_removed: clean_stats.duplicates_removed,
            outliers_removed: clean_stats.outliers_removed,
            applied: clean_stats.applied,
        },
    });

    let start = clock.now();
    let measured = cleaned.measure();
    stages.push(StageDiagnostics {
        name: "measure".to_string(),
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Measure {
            distance_km: measured.stats().distance_km,
            measured_km: measured.stats().measured_km,
            duration_seconds: measured.stats().duration_seconds,
            degenerate: measured.stats().degenerate,
        },
    });

    let start = clock.now();
    let rendered = measured.render_map(basemap);
    stages.push(StageDiagnostics {
        name: "render".to_string(),
        duration: clock.elapsed(&start),
        metrics: StageMetrics::RenderMap {
            size: request.config.map_size,
            points_drawn: rendered.map_stats().points_drawn,
            basemap_used: rendered.map_stats().basemap_used,
            basemap_fallback: rendered.map_stats().basemap_fallback.is_some(),
        },
    });

    let start = clock.now();
    let composed = rendered.compose(fonts);
    stages.push(StageDiagnostics {
        name: "compose".to_string(),
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Compose {
            width: composed.poster().width(),
            height: composed.poster().height(),
        },
    });

    let diagnostics = PipelineDiagnostics {
        stages,
        total: clock.elapsed(&run_start),
    };
    Ok((composed.into_artifacts(), diagnostics))
}
