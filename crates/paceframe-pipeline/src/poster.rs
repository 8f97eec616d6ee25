//! Poster composition: the final A4 canvas.
//!
//! Black on white, top to bottom: uppercased title, date, the route map
//! band, then an info row with the runner mark, athlete name and bib, a
//! rule, and three stat columns (distance, time, pace). All positions
//! come from a [`LayoutTemplate`], so print and preview resolutions
//! share one composer.

use image::{Rgba, RgbaImage, imageops};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

use crate::logo;
use crate::metrics;
use crate::text::{self, FontSet, Typeface};
use crate::types::{EventInfo, PosterConfig, Rgb, RunStats};

/// Proportional poster layout.
///
/// Horizontal lengths are fractions of the canvas width; vertical
/// lengths and font sizes are fractions of the canvas height. Offsets
/// named `*_offset` are relative to the top of the info row, which
/// itself sits [`info_gap`](Self::info_gap) below the map band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutTemplate {
    /// Side margin.
    pub margin_x: f32,
    /// Title top offset from the canvas top.
    pub title_y: f32,
    /// Title font size.
    pub title_size: f32,
    /// Date top offset from the canvas top.
    pub date_y: f32,
    /// Date font size.
    pub date_size: f32,
    /// Map band top offset from the canvas top.
    pub map_top: f32,
    /// Map band width.
    pub map_width: f32,
    /// Map band height.
    pub map_height: f32,
    /// Gap between the map band and the info row.
    pub info_gap: f32,
    /// Edge length of the runner mark.
    pub mark_size: f32,
    /// Gap between the mark and the athlete name.
    pub mark_gap: f32,
    /// Athlete name and bib font size.
    pub name_size: f32,
    /// Name top offset.
    pub name_offset: f32,
    /// Rule top offset.
    pub rule_offset: f32,
    /// Rule thickness.
    pub rule_height: f32,
    /// Stat value top offset.
    pub stats_offset: f32,
    /// Stat value font size.
    pub value_size: f32,
    /// Stat label font size.
    pub label_size: f32,
    /// Label offset below the stat value.
    pub label_offset: f32,
}

impl LayoutTemplate {
    /// The classic layout, expressed as fractions of the 2480 by 3508
    /// pixel canvas it was designed on (A4 at 300 DPI).
    #[must_use]
    pub const fn classic() -> Self {
        Self {
            margin_x: 100.0 / 2480.0,
            title_y: 100.0 / 3508.0,
            title_size: 150.0 / 3508.0,
            date_y: 250.0 / 3508.0,
            date_size: 80.0 / 3508.0,
            map_top: 300.0 / 3508.0,
            map_width: 0.9,
            map_height: 0.6,
            info_gap: 100.0 / 3508.0,
            mark_size: 200.0 / 3508.0,
            mark_gap: 100.0 / 2480.0,
            name_size: 100.0 / 3508.0,
            name_offset: 50.0 / 3508.0,
            rule_offset: 150.0 / 3508.0,
            rule_height: 3.0 / 3508.0,
            stats_offset: 200.0 / 3508.0,
            value_size: 100.0 / 3508.0,
            label_size: 60.0 / 3508.0,
            label_offset: 100.0 / 3508.0,
        }
    }
}

impl Default for LayoutTemplate {
    fn default() -> Self {
        Self::classic()
    }
}

/// Ink color for all poster text and rules.
const INK: Rgb = Rgb::new(0, 0, 0);

/// Paper color.
const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Compose the poster from a rendered route map, event metadata, and
/// run statistics.
///
/// The output is always `config.canvas_width` by `config.canvas_height`
/// pixels. Text that outgrows its band overflows instead of failing;
/// proportions are the template's responsibility.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[allow(clippy::cast_precision_loss)]
pub fn compose(
    route_map: &RgbaImage,
    event: &EventInfo,
    stats: &RunStats,
    config: &PosterConfig,
    fonts: &FontSet,
) -> RgbaImage {
    let layout = &config.layout;
    let wf = config.canvas_width as f32;
    let hf = config.canvas_height as f32;
    let mut canvas = RgbaImage::from_pixel(config.canvas_width, config.canvas_height, PAPER);

    // Header, centered: uppercased title, then the date.
    let title = event.title.to_uppercase();
    draw_centered(
        &mut canvas,
        &fonts.display,
        &title,
        layout.title_size * hf,
        layout.title_y * hf,
        wf,
    );
    draw_centered(
        &mut canvas,
        &fonts.text,
        &event.date,
        layout.date_size * hf,
        layout.date_y * hf,
        wf,
    );

    // Map band: aspect-preserving fit, centered both ways inside the
    // band.
    let band_w = (layout.map_width * wf) as u32;
    let band_h = (layout.map_height * hf) as u32;
    let band_top = layout.map_top * hf;
    let fitted = fit_into_band(route_map, band_w, band_h);
    let map_x = (wf - fitted.width() as f32) / 2.0;
    let map_y = band_top + (band_h as f32 - fitted.height() as f32) / 2.0;
    imageops::overlay(&mut canvas, &fitted, map_x as i64, map_y as i64);

    // The info row hangs off the band bottom, not the letterboxed map,
    // so its position does not depend on the route's aspect ratio.
    let info_y = band_top + band_h as f32 + layout.info_gap * hf;
    let margin = layout.margin_x * wf;
    let mark = (layout.mark_size * hf) as u32;
    logo::draw_mark(
        &mut canvas,
        margin as i32,
        info_y as i32,
        mark,
        logo::DEFAULT_COLOR,
    );

    let info_x = margin + mark as f32 + layout.mark_gap * wf;
    let name_size = layout.name_size * hf;
    let name_y = layout.name_offset.mul_add(hf, info_y);
    text::draw_text(
        &mut canvas,
        INK,
        info_x as i32,
        name_y as i32,
        name_size,
        &fonts.text,
        &event.athlete,
    );

    if !event.bib.is_empty() {
        let bib = format!("#{}", event.bib);
        let bib_w = text::measure_width(&fonts.text, &bib, name_size);
        text::draw_text(
            &mut canvas,
            INK,
            (wf - margin - bib_w) as i32,
            name_y as i32,
            name_size,
            &fonts.text,
            &bib,
        );
    }

    let rule_y = layout.rule_offset.mul_add(hf, info_y);
    let rule_h = (layout.rule_height * hf).max(1.0) as u32;
    let rule_w = (wf - margin - info_x).max(1.0) as u32;
    draw_filled_rect_mut(
        &mut canvas,
        Rect::at(info_x as i32, rule_y as i32).of_size(rule_w, rule_h),
        Rgba([INK.r, INK.g, INK.b, 255]),
    );

    // Three stat columns: distance, time, pace.
    let stats_y = layout.stats_offset.mul_add(hf, info_y);
    let label_y = layout.label_offset.mul_add(hf, stats_y);
    let col_w = (wf - info_x - margin) / 3.0;
    let distance = metrics::format_km(stats.distance_km);
    let columns = [
        (distance.as_str(), "KM"),
        (stats.duration.as_str(), "TIME"),
        (stats.pace.as_str(), "/KM"),
    ];
    for (i, (value, label)) in columns.iter().enumerate() {
        let col_x = (i as f32).mul_add(col_w, info_x);
        draw_in_column(
            &mut canvas,
            &fonts.display,
            value,
            layout.value_size * hf,
            col_x,
            col_w,
            stats_y,
        );
        draw_in_column(
            &mut canvas,
            &fonts.text,
            label,
            layout.label_size * hf,
            col_x,
            col_w,
            label_y,
        );
    }

    canvas
}

/// Scale the route map to fit inside the band without distortion.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[allow(clippy::cast_precision_loss)]
fn fit_into_band(map: &RgbaImage, band_w: u32, band_h: u32) -> RgbaImage {
    if map.width() == 0 || map.height() == 0 || band_w == 0 || band_h == 0 {
        return map.clone();
    }
    let scale = (band_w as f32 / map.width() as f32).min(band_h as f32 / map.height() as f32);
    let w = ((map.width() as f32 * scale) as u32).max(1);
    let h = ((map.height() as f32 * scale) as u32).max(1);
    if (w, h) == map.dimensions() {
        map.clone()
    } else {
        imageops::resize(map, w, h, imageops::FilterType::CatmullRom)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn draw_centered(
    canvas: &mut RgbaImage,
    face: &Typeface,
    content: &str,
    size: f32,
    y: f32,
    total_width: f32,
) {
    if content.is_empty() {
        return;
    }
    let text_w = text::measure_width(face, content, size);
    let x = (total_width - text_w) / 2.0;
    text::draw_text(canvas, INK, x as i32, y as i32, size, face, content);
}

#[allow(clippy::cast_possible_truncation)]
fn draw_in_column(
    canvas: &mut RgbaImage,
    face: &Typeface,
    content: &str,
    size: f32,
    col_x: f32,
    col_w: f32,
    y: f32,
) {
    let text_w = text::measure_width(face, content, size);
    let x = (col_w - text_w).mul_add(0.5, col_x);
    text::draw_text(canvas, INK, x as i32, y as i32, size, face, content);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const NAVY: Rgba<u8> = Rgba([16, 24, 40, 255]);

    fn small_config() -> PosterConfig {
        PosterConfig {
            canvas_width: 496,
            canvas_height: 701,
            ..PosterConfig::default()
        }
    }

    fn sample_event() -> EventInfo {
        EventInfo {
            title: "Berlin Marathon".to_string(),
            date: "28 September 2025".to_string(),
            athlete: "Ada Lovelace".to_string(),
            bib: "1815".to_string(),
            distance_km: 42.195,
            duration: "04:12:00".to_string(),
            pace: None,
        }
    }

    fn sample_stats() -> RunStats {
        RunStats {
            distance_km: 42.195,
            measured_km: 41.87,
            duration: "04:12:00".to_string(),
            duration_seconds: 15_120,
            pace: "05:58".to_string(),
            degenerate: false,
        }
    }

    fn navy_map(size: u32) -> RgbaImage {
        RgbaImage::from_pixel(size, size, NAVY)
    }

    fn is_dark(px: &Rgba<u8>) -> bool {
        px[3] == 255 && px[0] < 100 && px[1] < 100 && px[2] < 100
    }

    fn region_has_ink(image: &RgbaImage, x0: u32, x1: u32, y0: u32, y1: u32) -> bool {
        (y0..y1).any(|y| (x0..x1).any(|x| is_dark(image.get_pixel(x, y))))
    }

    #[test]
    fn classic_fractions_reproduce_the_reference_absolutes() {
        let layout = LayoutTemplate::classic();
        assert!((layout.margin_x * 2480.0 - 100.0).abs() < 0.01);
        assert!((layout.title_size * 3508.0 - 150.0).abs() < 0.01);
        assert!((layout.date_y * 3508.0 - 250.0).abs() < 0.01);
        assert!((layout.map_width * 2480.0 - 2232.0).abs() < 0.01);
        assert!((layout.map_height * 3508.0 - 2104.8).abs() < 0.1);
        assert!((layout.stats_offset * 3508.0 - 200.0).abs() < 0.01);
    }

    #[test]
    fn default_layout_is_the_classic_template() {
        assert_eq!(LayoutTemplate::default(), LayoutTemplate::classic());
    }

    #[test]
    fn poster_has_configured_dimensions_and_white_paper() {
        let poster = compose(
            &navy_map(100),
            &sample_event(),
            &sample_stats(),
            &small_config(),
            &FontSet::default(),
        );
        assert_eq!(poster.dimensions(), (496, 701));
        assert_eq!(*poster.get_pixel(2, 2), PAPER);
        assert_eq!(*poster.get_pixel(493, 698), PAPER);
    }

    #[test]
    fn map_band_is_centered_and_aspect_preserving() {
        let poster = compose(
            &navy_map(100),
            &sample_event(),
            &sample_stats(),
            &small_config(),
            &FontSet::default(),
        );
        // A square map in the 446 x 420 band fits to 420 x 420, centered
        // at x = 38..458.
        assert_eq!(*poster.get_pixel(248, 270), NAVY);
        assert_eq!(*poster.get_pixel(50, 270), NAVY);
        assert_eq!(*poster.get_pixel(20, 270), PAPER);
        assert_eq!(*poster.get_pixel(475, 270), PAPER);
    }

    #[test]
    fn title_and_date_leave_ink_in_the_header() {
        let poster = compose(
            &navy_map(64),
            &sample_event(),
            &sample_stats(),
            &small_config(),
            &FontSet::default(),
        );
        // Title band
        assert!(region_has_ink(&poster, 0, 496, 19, 51));
        // Date band
        assert!(region_has_ink(&poster, 0, 496, 49, 67));
    }

    #[test]
    fn empty_title_draws_no_header_ink() {
        let event = EventInfo {
            title: String::new(),
            date: String::new(),
            ..sample_event()
        };
        let poster = compose(
            &navy_map(64),
            &event,
            &sample_stats(),
            &small_config(),
            &FontSet::default(),
        );
        assert!(!region_has_ink(&poster, 0, 496, 0, 58));
    }

    #[test]
    fn bib_is_right_aligned_and_optional() {
        let config = small_config();
        let with_bib = compose(
            &navy_map(64),
            &sample_event(),
            &sample_stats(),
            &config,
            &FontSet::default(),
        );
        // Name row sits near y = 510..528; the bib occupies the right
        // quarter of it.
        assert!(region_has_ink(&with_bib, 380, 490, 508, 529));

        let event = EventInfo {
            bib: String::new(),
            ..sample_event()
        };
        let without_bib = compose(
            &navy_map(64),
            &event,
            &sample_stats(),
            &config,
            &FontSet::default(),
        );
        assert!(!region_has_ink(&without_bib, 380, 490, 508, 529));
    }

    #[test]
    fn rule_and_stats_rows_are_inked() {
        let poster = compose(
            &navy_map(64),
            &sample_event(),
            &sample_stats(),
            &small_config(),
            &FontSet::default(),
        );
        // Rule: a solid dark run at y = 529 starting from the info
        // column.
        assert!(is_dark(poster.get_pixel(200, 529)));
        assert!(is_dark(poster.get_pixel(400, 529)));
        // Stat values row and label row.
        assert!(region_has_ink(&poster, 80, 476, 539, 561));
        assert!(region_has_ink(&poster, 80, 476, 559, 577));
    }

    #[test]
    fn composition_is_deterministic() {
        let first = compose(
            &navy_map(100),
            &sample_event(),
            &sample_stats(),
            &small_config(),
            &FontSet::default(),
        );
        let second = compose(
            &navy_map(100),
            &sample_event(),
            &sample_stats(),
            &small_config(),
            &FontSet::default(),
        );
        assert_eq!(first.as_raw(), second.as_raw());
    }
}
