//! Text measurement and wrapping.
//!
//! Labels are laid out without shaping real glyphs. Widths come from a [`TextMeasurer`]; the
//! default [`HeuristicTextMeasurer`] assumes every glyph is `0.60em` wide (plus letter spacing),
//! which is close enough for the condensed uppercase faces labels tend to use. A measurer backed
//! by real font metrics can be swapped in without touching the wrapping or layout code.

mod wrap;

pub use wrap::{ELLIPSIS, wrap_text};

/// Average glyph advance assumed by the heuristic measurer, in em.
pub const AVERAGE_GLYPH_WIDTH_EM: f64 = 0.60;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: f64,
    /// Extra advance per glyph, in em (`letter-spacing: 0.05em` → `0.05`).
    pub letter_spacing_em: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            letter_spacing_em: 0.0,
        }
    }
}

impl TextStyle {
    pub fn new(font_size: f64, letter_spacing_em: f64) -> Self {
        Self {
            font_size,
            letter_spacing_em,
        }
    }
}

pub trait TextMeasurer {
    /// Rendered width of a single line of `text`, in user units.
    fn measure_width(&self, text: &str, style: &TextStyle) -> f64;

    /// Width of a typical glyph, used to turn geometric space into a character budget.
    fn average_glyph_width(&self, style: &TextStyle) -> f64 {
        const SAMPLE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
        self.measure_width(SAMPLE, style) / SAMPLE.len() as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicTextMeasurer {
    pub glyph_width_em: f64,
}

impl Default for HeuristicTextMeasurer {
    fn default() -> Self {
        Self {
            glyph_width_em: AVERAGE_GLYPH_WIDTH_EM,
        }
    }
}

impl TextMeasurer for HeuristicTextMeasurer {
    fn measure_width(&self, text: &str, style: &TextStyle) -> f64 {
        text.chars().count() as f64 * self.average_glyph_width(style)
    }

    fn average_glyph_width(&self, style: &TextStyle) -> f64 {
        style.font_size * (self.glyph_width_em + style.letter_spacing_em)
    }
}
