//! Built-in stroke glyphs, used when no TTF font is supplied.
//!
//! A small monoline face covering uppercase letters, digits, and the
//! punctuation that appears on posters. Each glyph is a set of polylines
//! in design units, 100 per em, with the cap top at y = 8 and the
//! baseline at y = 76 (y grows downward, matching image space). The face
//! is monospaced: every glyph advances [`ADVANCE`] units.
//!
//! Lowercase input maps to uppercase. Characters outside the set render
//! as a hollow box so missing coverage shows up on the poster instead of
//! disappearing.

/// Design units per em. A font size of `s` pixels scales units by
/// `s / UNITS_PER_EM`.
pub const UNITS_PER_EM: f32 = 100.0;

/// Horizontal advance per glyph, in design units.
pub const ADVANCE: f32 = 60.0;

/// Suggested stroke width, in design units.
pub const LINE_WIDTH: f32 = 7.0;

/// One polyline of a glyph, in design units.
pub type Stroke = &'static [(i16, i16)];

/// Hollow box shown for characters the face does not cover.
const MISSING: &[Stroke] = &[&[(12, 12), (48, 12), (48, 72), (12, 72), (12, 12)]];

/// Stroke set for a character. Space returns an empty set (advance
/// only); anything not covered returns the missing-glyph box.
#[allow(clippy::too_many_lines)]
#[must_use]
pub fn strokes_for(ch: char) -> &'static [Stroke] {
    match ch.to_ascii_uppercase() {
        ' ' => &[],
        'A' => &[&[(8, 76), (30, 8), (52, 76)], &[(17, 50), (43, 50)]],
        'B' => &[
            &[(8, 8), (8, 76)],
            &[(8, 8), (42, 8), (48, 14), (48, 34), (42, 40), (8, 40)],
            &[(8, 40), (44, 40), (52, 48), (52, 68), (44, 76), (8, 76)],
        ],
        'C' => &[&[
            (52, 16),
            (42, 8),
            (18, 8),
            (8, 18),
            (8, 66),
            (18, 76),
            (42, 76),
            (52, 68),
        ]],
        'D' => &[
            &[(8, 8), (8, 76)],
            &[(8, 8), (38, 8), (52, 22), (52, 62), (38, 76), (8, 76)],
        ],
        'E' => &[&[(52, 8), (8, 8), (8, 76), (52, 76)], &[(8, 42), (40, 42)]],
        'F' => &[&[(52, 8), (8, 8), (8, 76)], &[(8, 42), (38, 42)]],
        'G' => &[&[
            (52, 16),
            (42, 8),
            (18, 8),
            (8, 18),
            (8, 66),
            (18, 76),
            (44, 76),
            (52, 68),
            (52, 46),
            (32, 46),
        ]],
        'H' => &[
            &[(8, 8), (8, 76)],
            &[(52, 8), (52, 76)],
            &[(8, 42), (52, 42)],
        ],
        'I' => &[
            &[(30, 8), (30, 76)],
            &[(18, 8), (42, 8)],
            &[(18, 76), (42, 76)],
        ],
        'J' => &[&[(44, 8), (44, 64), (36, 76), (18, 76), (8, 66)]],
        'K' => &[
            &[(8, 8), (8, 76)],
            &[(52, 8), (8, 44)],
            &[(20, 35), (52, 76)],
        ],
        'L' => &[&[(8, 8), (8, 76), (52, 76)]],
        'M' => &[&[(8, 76), (8, 8), (30, 40), (52, 8), (52, 76)]],
        'N' => &[&[(8, 76), (8, 8), (52, 76), (52, 8)]],
        'O' => &[&[
            (18, 8),
            (42, 8),
            (52, 18),
            (52, 66),
            (42, 76),
            (18, 76),
            (8, 66),
            (8, 18),
            (18, 8),
        ]],
        'P' => &[&[
            (8, 76),
            (8, 8),
            (42, 8),
            (52, 16),
            (52, 34),
            (42, 42),
            (8, 42),
        ]],
        'Q' => &[
            &[
                (18, 8),
                (42, 8),
                (52, 18),
                (52, 66),
                (42, 76),
                (18, 76),
                (8, 66),
                (8, 18),
                (18, 8),
            ],
            &[(38, 60), (54, 80)],
        ],
        'R' => &[
            &[
                (8, 76),
                (8, 8),
                (42, 8),
                (52, 16),
                (52, 34),
                (42, 42),
                (8, 42),
            ],
            &[(30, 42), (52, 76)],
        ],
        'S' => &[&[
            (52, 16),
            (42, 8),
            (18, 8),
            (8, 16),
            (8, 34),
            (16, 42),
            (44, 42),
            (52, 50),
            (52, 68),
            (42, 76),
            (18, 76),
            (8, 68),
        ]],
        'T' => &[&[(8, 8), (52, 8)], &[(30, 8), (30, 76)]],
        'U' => &[&[(8, 8), (8, 66), (18, 76), (42, 76), (52, 66), (52, 8)]],
        'V' => &[&[(8, 8), (30, 76), (52, 8)]],
        'W' => &[&[(8, 8), (18, 76), (30, 44), (42, 76), (52, 8)]],
        'X' => &[&[(8, 8), (52, 76)], &[(52, 8), (8, 76)]],
        'Y' => &[&[(8, 8), (30, 38), (52, 8)], &[(30, 38), (30, 76)]],
        'Z' => &[&[(8, 8), (52, 8), (8, 76), (52, 76)]],
        '0' => &[
            &[
                (18, 8),
                (42, 8),
                (52, 18),
                (52, 66),
                (42, 76),
                (18, 76),
                (8, 66),
                (8, 18),
                (18, 8),
            ],
            &[(38, 28), (22, 56)],
        ],
        '1' => &[&[(20, 20), (30, 8), (30, 76)], &[(18, 76), (42, 76)]],
        '2' => &[&[
            (8, 18),
            (18, 8),
            (42, 8),
            (52, 18),
            (52, 32),
            (8, 76),
            (52, 76),
        ]],
        '3' => &[
            &[(8, 16), (18, 8), (42, 8), (50, 16), (50, 32), (42, 40), (24, 40)],
            &[(42, 40), (52, 48), (52, 66), (42, 76), (18, 76), (8, 68)],
        ],
        '4' => &[&[(40, 76), (40, 8), (8, 54), (52, 54)]],
        '5' => &[&[
            (50, 8),
            (10, 8),
            (10, 38),
            (38, 38),
            (50, 48),
            (50, 64),
            (40, 76),
            (18, 76),
            (8, 68),
        ]],
        '6' => &[&[
            (48, 12),
            (36, 8),
            (20, 8),
            (8, 24),
            (8, 62),
            (18, 76),
            (40, 76),
            (50, 66),
            (50, 50),
            (40, 42),
            (18, 42),
            (8, 52),
        ]],
        '7' => &[&[(8, 8), (52, 8), (22, 76)]],
        '8' => &[
            &[
                (20, 8),
                (40, 8),
                (48, 15),
                (48, 32),
                (40, 39),
                (20, 39),
                (12, 32),
                (12, 15),
                (20, 8),
            ],
            &[
                (20, 39),
                (40, 39),
                (50, 47),
                (50, 67),
                (40, 76),
                (20, 76),
                (10, 67),
                (10, 47),
                (20, 39),
            ],
        ],
        '9' => &[&[
            (12, 72),
            (24, 76),
            (40, 76),
            (52, 60),
            (52, 22),
            (42, 8),
            (20, 8),
            (10, 18),
            (10, 34),
            (20, 42),
            (42, 42),
            (52, 32),
        ]],
        ':' => &[&[(30, 28), (30, 32)], &[(30, 58), (30, 62)]],
        '.' => &[&[(30, 72), (30, 76)]],
        ',' => &[&[(32, 70), (28, 84)]],
        '-' => &[&[(14, 42), (46, 42)]],
        '/' => &[&[(46, 8), (14, 76)]],
        '\'' => &[&[(30, 8), (28, 22)]],
        '#' => &[
            &[(22, 20), (16, 64)],
            &[(42, 20), (36, 64)],
            &[(12, 34), (48, 34)],
            &[(10, 52), (46, 52)],
        ],
        _ => MISSING,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COVERED: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789:.,-/'#";

    #[test]
    fn covered_characters_are_not_the_missing_box() {
        for ch in COVERED.chars() {
            assert_ne!(strokes_for(ch), MISSING, "no glyph for {ch:?}");
        }
    }

    #[test]
    fn lowercase_maps_to_uppercase() {
        for (lower, upper) in ('a'..='z').zip('A'..='Z') {
            assert_eq!(strokes_for(lower), strokes_for(upper));
        }
    }

    #[test]
    fn space_is_advance_only() {
        assert!(strokes_for(' ').is_empty());
    }

    #[test]
    fn unknown_characters_fall_back_to_the_box() {
        assert_eq!(strokes_for('\u{20AC}'), MISSING);
        assert_eq!(strokes_for('('), MISSING);
    }

    #[test]
    fn every_stroke_is_drawable_and_inside_the_cell() {
        for ch in COVERED.chars() {
            for stroke in strokes_for(ch) {
                assert!(stroke.len() >= 2, "degenerate stroke in {ch:?}");
                for &(x, y) in *stroke {
                    assert!((0..=60).contains(&x), "{ch:?} x out of cell: {x}");
                    assert!((0..=90).contains(&y), "{ch:?} y out of cell: {y}");
                }
            }
        }
    }
}
