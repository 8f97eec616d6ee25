//! Timing and per-stage metrics for poster renders.
//!
//! The pipeline is sans-IO and never reads a wall clock itself; callers
//! inject a [`Clock`] and get back a [`PipelineDiagnostics`] alongside
//! the artifacts. The record serializes to JSON for tooling and formats
//! as a human-readable table via [`PipelineDiagnostics::report`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A time source the pipeline can be instrumented with.
///
/// Production callers wrap `std::time::Instant`; tests substitute a
/// deterministic fake.
pub trait Clock {
    /// An opaque moment in time.
    type Instant;

    /// The current moment.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serialize a `Duration` as fractional seconds, the shape the JSON
/// consumers expect.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs)
            .map_err(|_| serde::de::Error::custom(format!("invalid duration seconds: {secs}")))
    }
}

/// What a single stage accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// GPX decoding.
    Parse {
        /// Track points extracted from the document.
        points: usize,
    },
    /// Smoothing and filtering.
    Clean {
        points_before: usize,
        points_after: usize,
        duplicates_removed: usize,
        outliers_removed: usize,
        /// False when the track was too short to clean.
        applied: bool,
    },
    /// Distance, duration, and pace derivation.
    Measure {
        /// Displayed distance (official, or measured as fallback).
        distance_km: f64,
        /// Distance measured from the cleaned track.
        measured_km: f64,
        duration_seconds: u64,
        degenerate: bool,
    },
    /// Route map rendering.
    RenderMap {
        size: u32,
        points_drawn: usize,
        basemap_used: bool,
        /// True when a requested basemap failed and the background fell
        /// back to the flat color.
        basemap_fallback: bool,
    },
    /// Poster composition.
    Compose { width: u32, height: u32 },
}

/// Timing and metrics for one pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Stage name, stable across releases.
    pub name: String,
    /// Wall time the stage took.
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// What the stage accomplished.
    pub metrics: StageMetrics,
}

/// Full diagnostics for one render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Per-stage records in execution order.
    pub stages: Vec<StageDiagnostics>,
    /// End-to-end wall time.
    #[serde(with = "duration_serde")]
    pub total: Duration,
}

/// The numbers a caller usually wants, rolled up from the stage
/// records.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PosterSummary {
    pub points_parsed: usize,
    pub points_cleaned: usize,
    pub duplicates_removed: usize,
    pub outliers_removed: usize,
    pub distance_km: f64,
    pub degenerate: bool,
    pub basemap_fallback: bool,
    pub total_ms: f64,
}

impl PipelineDiagnostics {
    /// Roll the stage records up into a [`PosterSummary`].
    #[must_use]
    pub fn summary(&self) -> PosterSummary {
        let mut summary = PosterSummary {
            total_ms: duration_ms(self.total),
            ..PosterSummary::default()
        };
        for stage in &self.stages {
            match stage.metrics {
                StageMetrics::Parse { points } => summary.points_parsed = points,
                StageMetrics::Clean {
                    points_after,
                    duplicates_removed,
                    outliers_removed,
                    ..
                } => {
                    summary.points_cleaned = points_after;
                    summary.duplicates_removed = duplicates_removed;
                    summary.outliers_removed = outliers_removed;
                }
                StageMetrics::Measure {
                    distance_km,
                    degenerate,
                    ..
                } => {
                    summary.distance_km = distance_km;
                    summary.degenerate = degenerate;
                }
                StageMetrics::RenderMap {
                    basemap_fallback, ..
                } => summary.basemap_fallback = basemap_fallback,
                StageMetrics::Compose { .. } => {}
            }
        }
        summary
    }

    /// Format a human-readable table of stage timings and metrics.
    #[must_use]
    pub fn report(&self) -> String {
        let total = duration_ms(self.total);
        let mut lines = Vec::with_capacity(self.stages.len() + 4);
        lines.push("Poster render diagnostics".to_string());
        lines.push("=".repeat(60));
        for stage in &self.stages {
            let ms = duration_ms(stage.duration);
            let share = if total > 0.0 { ms / total * 100.0 } else { 0.0 };
            lines.push(format!(
                "{:<10} {:>9.1} ms {:>6.1}%  {}",
                stage.name,
                ms,
                share,
                format_metrics(&stage.metrics),
            ));
        }
        lines.push("=".repeat(60));
        lines.push(format!("{:<10} {:>9.1} ms", "total", total));
        lines.join("\n")
    }
}

fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

fn format_metrics(metrics: &StageMetrics) -> String {
    match *metrics {
        StageMetrics::Parse { points } => format!("{points} points"),
        StageMetrics::Clean {
            points_before,
            points_after,
            duplicates_removed,
            outliers_removed,
            applied,
        } => {
            if applied {
                format!(
                    "{points_before} -> {points_after} points ({duplicates_removed} dup, {outliers_removed} outliers)",
                )
            } else {
                format!("{points_before} points, too short to clean")
            }
        }
        StageMetrics::Measure {
            distance_km,
            duration_seconds,
            degenerate,
            ..
        } => {
            if degenerate {
                format!("{distance_km:.2} km, {duration_seconds} s, degenerate track")
            } else {
                format!("{distance_km:.2} km, {duration_seconds} s")
            }
        }
        StageMetrics::RenderMap {
            size,
            points_drawn,
            basemap_used,
            basemap_fallback,
        } => {
            let background = if basemap_used {
                "basemap"
            } else if basemap_fallback {
                "flat (basemap fallback)"
            } else {
                "flat"
            };
            format!("{size} px, {points_drawn} points, {background}")
        }
        StageMetrics::Compose { width, height } => format!("{width}x{height}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> PipelineDiagnostics {
        PipelineDiagnostics {
            stages: vec![
                StageDiagnostics {
                    name: "parse".to_string(),
                    duration: Duration::from_millis(12),
                    metrics: StageMetrics::Parse { points: 5000 },
                },
                StageDiagnostics {
                    name: "clean".to_string(),
                    duration: Duration::from_millis(3),
                    metrics: StageMetrics::Clean {
                        points_before: 5000,
                        points_after: 4980,
                        duplicates_removed: 17,
                        outliers_removed: 3,
                        applied: true,
                    },
                },
                StageDiagnostics {
                    name: "measure".to_string(),
                    duration: Duration::from_millis(1),
                    metrics: StageMetrics::Measure {
                        distance_km: 42.195,
                        measured_km: 41.9,
                        duration_seconds: 15_120,
                        degenerate: false,
                    },
                },
                StageDiagnostics {
                    name: "render".to_string(),
                    duration: Duration::from_millis(80),
                    metrics: StageMetrics::RenderMap {
                        size: 2000,
                        points_drawn: 4980,
                        basemap_used: false,
                        basemap_fallback: true,
                    },
                },
                StageDiagnostics {
                    name: "compose".to_string(),
                    duration: Duration::from_millis(40),
                    metrics: StageMetrics::Compose {
                        width: 2480,
                        height: 3508,
                    },
                },
            ],
            total: Duration::from_millis(136),
        }
    }

    #[test]
    fn serde_round_trip_with_durations_as_seconds() {
        let diagnostics = sample();
        let json = serde_json::to_string(&diagnostics).unwrap();
        assert!(json.contains("\"total\":0.136"));
        let back: PipelineDiagnostics = serde_json::from_str(&json).unwrap();
        assert_eq!(back, diagnostics);
    }

    #[test]
    fn deserialize_rejects_negative_durations() {
        let result: Result<PipelineDiagnostics, _> =
            serde_json::from_str(r#"{"stages":[],"total":-1.0}"#);
        assert!(result.is_err());
    }

    #[test]
    fn summary_rolls_up_the_stage_records() {
        let summary = sample().summary();
        assert_eq!(summary.points_parsed, 5000);
        assert_eq!(summary.points_cleaned, 4980);
        assert_eq!(summary.duplicates_removed, 17);
        assert_eq!(summary.outliers_removed, 3);
        assert!((summary.distance_km - 42.195).abs() < f64::EPSILON);
        assert!(!summary.degenerate);
        assert!(summary.basemap_fallback);
        assert!((summary.total_ms - 136.0).abs() < 1e-9);
    }

    #[test]
    fn report_lists_every_stage() {
        let report = sample().report();
        for name in ["parse", "clean", "measure", "render", "compose", "total"] {
            assert!(report.contains(name), "missing {name} in:\n{report}");
        }
        assert!(report.contains('='));
        assert!(report.contains("basemap fallback"));
        assert!(report.contains("42.19 km"));
    }

    #[test]
    fn report_handles_a_zero_total_without_dividing_by_zero() {
        let diagnostics = PipelineDiagnostics {
            stages: vec![],
            total: Duration::ZERO,
        };
        let report = diagnostics.report();
        assert!(report.contains("total"));
    }
}
