//! paceframe: render a GPX run recording into a printable race poster.
//!
//! Reads a GPX file, runs the poster pipeline with configurable event
//! metadata and styling, writes the poster as a PNG, and prints
//! per-stage diagnostics. Useful for:
//!
//! - Producing a finished poster from a watch or phone export
//! - Comparing smoothing strategies (`gaussian` vs `moving-average`)
//! - Checking what a theme or color override looks like on paper
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin paceframe -- [OPTIONS] <GPX_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use paceframe_pipeline::{
    BackgroundStyle, BasemapError, BasemapSource, Bounds, Clock, EventInfo, FontSet, MapTheme,
    PosterConfig, PosterRequest, Rgb, RgbaImage, SmootherKind, StyleConfig, Typeface,
};

/// Render a GPX run recording into a printable race poster.
///
/// Event metadata flags fill the text blocks of the poster; style and
/// processing flags control the route map. Every flag has a sensible
/// default, so `paceframe run.gpx` alone produces a poster.
#[derive(Parser)]
#[command(name = "paceframe", version)]
struct Cli {
    /// Path to the GPX recording.
    gpx_path: PathBuf,

    /// Output PNG path.
    #[arg(short, long, default_value = "poster.png")]
    output: PathBuf,

    /// Event title, drawn uppercased across the top.
    #[arg(long, default_value = "")]
    title: String,

    /// Event date line, drawn under the title.
    #[arg(long, default_value = "")]
    date: String,

    /// Athlete name for the info row.
    #[arg(long, default_value = "")]
    athlete: String,

    /// Bib number, drawn right-aligned as "#N". Empty hides it.
    #[arg(long, default_value = "")]
    bib: String,

    /// Official event distance in kilometers. 0 displays the measured
    /// track distance instead.
    #[arg(long, default_value_t = 0.0)]
    distance: f64,

    /// Finish time as "HH:MM:SS" or "MM:SS".
    #[arg(long, default_value = "")]
    duration: String,

    /// Pace override as "MM:SS" per kilometer; computed from distance
    /// and duration when omitted.
    #[arg(long)]
    pace: Option<String>,

    /// Map background theme.
    #[arg(long, value_enum, default_value_t = Theme::DarkBlue)]
    theme: Theme,

    /// Flat map background as a CSS hex color, overriding --theme.
    #[arg(long, value_name = "HEX")]
    background: Option<String>,

    /// Route line color as CSS hex.
    #[arg(long, value_name = "HEX")]
    route_color: Option<String>,

    /// Start marker color as CSS hex.
    #[arg(long, value_name = "HEX")]
    start_color: Option<String>,

    /// Finish marker color as CSS hex.
    #[arg(long, value_name = "HEX")]
    end_color: Option<String>,

    /// Track smoothing strategy.
    #[arg(long, value_enum, default_value_t = Smoother::Gaussian)]
    smoother: Smoother,

    /// Smoothing strength: Gaussian sigma, or moving-average window.
    #[arg(long, default_value_t = PosterConfig::DEFAULT_SMOOTHING)]
    smoothing: f64,

    /// Route map edge length in pixels.
    #[arg(long, default_value_t = PosterConfig::DEFAULT_MAP_SIZE)]
    map_size: u32,

    /// Padding around the route as a fraction of its extent.
    #[arg(long, default_value_t = PosterConfig::DEFAULT_PADDING)]
    padding: f64,

    /// TTF/OTF font file; repeat to give fallbacks tried in order.
    #[arg(long, value_name = "PATH")]
    font: Vec<PathBuf>,

    /// Pre-rendered basemap raster covering the padded route bounds.
    #[arg(long, value_name = "PATH")]
    basemap: Option<PathBuf>,

    /// Print diagnostics as JSON instead of the human-readable report.
    #[arg(long)]
    json: bool,
}

/// Map background theme selection.
#[derive(Clone, Copy, ValueEnum)]
enum Theme {
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

/// Maps the local CLI [`Theme`] to the pipeline enum.
const fn theme_to_pipeline(theme: Theme) -> MapTheme {
    match theme {
        Theme::DarkBlue => MapTheme::DarkBlue,
        Theme::Light => MapTheme::Light,
        Theme::Terrain => MapTheme::Terrain,
        Theme::Watercolor => MapTheme::Watercolor,
        Theme::Toner => MapTheme::Toner,
    }
}

/// Track smoothing strategy selection.
#[derive(Clone, Copy, ValueEnum)]
enum Smoother {
    /// Gaussian kernel smoothing with outlier removal.
    Gaussian,
    /// Centered moving average, boundary points passed through.
    MovingAverage,
}

/// Maps the local CLI [`Smoother`] to the pipeline enum.
const fn smoother_to_pipeline(smoother: Smoother) -> SmootherKind {
    match smoother {
        Smoother::Gaussian => SmootherKind::Gaussian,
        Smoother::MovingAverage => SmootherKind::MovingAverage,
    }
}

/// Build a [`PosterRequest`] from CLI arguments.
fn request_from_cli(cli: &Cli) -> Result<PosterRequest, String> {
    let parse_color = |flag: &str, value: &Option<String>| -> Result<Option<Rgb>, String> {
        value
            .as_ref()
            .map(|hex| Rgb::from_hex(hex).map_err(|e| format!("--{flag}: {e}")))
            .transpose()
    };

    let defaults = StyleConfig::default();
    let style = StyleConfig {
        background: match &cli.background {
            Some(hex) => {
                BackgroundStyle::Flat(Rgb::from_hex(hex).map_err(|e| format!("--background: {e}"))?)
            }
            None => BackgroundStyle::Theme(theme_to_pipeline(cli.theme)),
        },
        route_color: parse_color("route-color", &cli.route_color)?.unwrap_or(defaults.route_color),
        start_color: parse_color("start-color", &cli.start_color)?.unwrap_or(defaults.start_color),
        end_color: parse_color("end-color", &cli.end_color)?.unwrap_or(defaults.end_color),
    };

    Ok(PosterRequest {
        event: EventInfo {
            title: cli.title.clone(),
            date: cli.date.clone(),
            athlete: cli.athlete.clone(),
            bib: cli.bib.clone(),
            distance_km: cli.distance,
            duration: cli.duration.clone(),
            pace: cli.pace.clone(),
        },
        config: PosterConfig {
            style,
            smoother: smoother_to_pipeline(cli.smoother),
            smoothing: cli.smoothing,
            map_size: cli.map_size,
            padding: cli.padding,
            ..PosterConfig::default()
        },
    })
}

/// Well-known font locations tried after the `--font` flags.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Resolve the poster fonts: `--font` paths in order, then the
/// well-known system locations, then the built-in stroke face. The
/// first candidate that parses wins.
fn resolve_fonts(requested: &[PathBuf]) -> FontSet {
    for path in requested {
        match load_typeface(path) {
            Ok(face) => {
                eprintln!("Font: {}", path.display());
                return FontSet::uniform(face);
            }
            Err(msg) => eprintln!("Warning: skipping font {}: {msg}", path.display()),
        }
    }
    // Missing system candidates are the normal case; skip them quietly.
    for path in SYSTEM_FONTS {
        if let Ok(face) = load_typeface(Path::new(path)) {
            eprintln!("Font: {path}");
            return FontSet::uniform(face);
        }
    }
    eprintln!("Font: builtin stroke face (no usable font file found)");
    FontSet::default()
}

fn load_typeface(path: &Path) -> Result<Typeface, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    Typeface::from_ttf_bytes(bytes).ok_or_else(|| "not a parseable TTF/OTF font".to_string())
}

/// A basemap raster loaded from disk up front. It is assumed to already
/// cover the padded route bounds; the renderer scales it to the map
/// square.
struct FileBasemap {
    image: RgbaImage,
}

impl BasemapSource for FileBasemap {
    fn fetch(&self, _bounds: Bounds, _size: u32) -> Result<RgbaImage, BasemapError> {
        Ok(self.image.clone())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let request = match request_from_cli(&cli) {
        Ok(request) => request,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let gpx_bytes = match std::fs::read(&cli.gpx_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.gpx_path.display());
            return ExitCode::FAILURE;
        }
    };
    eprintln!("Track: {} ({} bytes)", cli.gpx_path.display(), gpx_bytes.len());

    let fonts = resolve_fonts(&cli.font);

    let basemap = cli.basemap.as_ref().and_then(|path| match image::open(path) {
        Ok(img) => {
            eprintln!("Basemap: {}", path.display());
            Some(FileBasemap {
                image: img.to_rgba8(),
            })
        }
        Err(e) => {
            eprintln!(
                "Warning: could not read basemap {}: {e}; using the flat background",
                path.display(),
            );
            None
        }
    });
    let basemap_source = basemap.as_ref().map(|b| b as &dyn BasemapSource);

    eprintln!("Rendering poster...");
    let (artifacts, diagnostics) = match paceframe_pipeline::process_with_diagnostics(
        &gpx_bytes,
        &request,
        basemap_source,
        &fonts,
        &StdClock,
    ) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("Pipeline error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&diagnostics) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing diagnostics: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}", diagnostics.report());
    }

    let summary = diagnostics.summary();
    if summary.degenerate {
        eprintln!("Warning: too few track points for spatial statistics; distance and pace are 0");
    }
    if summary.basemap_fallback {
        eprintln!("Warning: basemap unavailable; poster uses the flat background");
    }

    let png = match paceframe_export::to_png(&artifacts.poster) {
        Ok(png) => png,
        Err(e) => {
            eprintln!("Error encoding PNG: {e}");
            return ExitCode::FAILURE;
        }
    };

    match std::fs::write(&cli.output, &png) {
        Ok(()) => {
            eprintln!(
                "Poster written to {} ({} bytes, {}x{})",
                cli.output.display(),
                png.len(),
                artifacts.poster.width(),
                artifacts.poster.height(),
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error writing {}: {e}", cli.output.display());
            ExitCode::FAILURE
        }
    }
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}
