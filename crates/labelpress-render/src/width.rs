//! Geometry to character-budget conversion.

use crate::text::{HeuristicTextMeasurer, TextMeasurer, TextStyle};

/// Smallest budget ever handed to the wrapper; below this every glyph would be hard-broken.
pub const MIN_MAX_CHARS: usize = 8;

/// Characters that fit between `element_x` and `right_boundary_x - padding_px`, assuming the
/// heuristic average glyph width.
pub fn estimate_max_chars(
    element_x: f64,
    font_size: f64,
    right_boundary_x: f64,
    padding_px: f64,
    letter_spacing_em: f64,
) -> usize {
    estimate_max_chars_with(
        &HeuristicTextMeasurer::default(),
        element_x,
        &TextStyle::new(font_size, letter_spacing_em),
        right_boundary_x,
        padding_px,
    )
}

/// Like [`estimate_max_chars`], with the average glyph width taken from `measurer`.
///
/// The glyph width is clamped to at least one unit and the result to at least
/// [`MIN_MAX_CHARS`]. Non-finite geometry yields the minimum.
pub fn estimate_max_chars_with(
    measurer: &dyn TextMeasurer,
    element_x: f64,
    style: &TextStyle,
    right_boundary_x: f64,
    padding_px: f64,
) -> usize {
    let available = (right_boundary_x - padding_px - element_x).max(0.0);
    let glyph = measurer.average_glyph_width(style).max(1.0);
    let chars = (available / glyph).floor();
    if !chars.is_finite() {
        return MIN_MAX_CHARS;
    }
    (chars as usize).max(MIN_MAX_CHARS)
}
