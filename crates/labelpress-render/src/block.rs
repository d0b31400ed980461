//! Flowed multi-line text blocks.
//!
//! A block is an optional header followed by wrapped list items, stacked at a fixed line advance
//! below (or centered on) an anchor point. Positions are always derived from the anchor, so a
//! block re-rendered with a different line count never drifts.

use crate::document::{SvgElement, SvgNode};
use crate::text::wrap_text;

/// Inputs of one block layout.
#[derive(Debug, Clone, Copy)]
pub struct BlockSpec<'a> {
    pub anchor_x: f64,
    pub anchor_y: f64,
    pub font_size: f64,
    pub header: Option<&'a str>,
    pub items: &'a [String],
    pub max_chars: usize,
    pub max_lines_total: usize,
    /// Per-item line cap; overflowing items end in an ellipsis.
    pub max_lines_per_item: Option<usize>,
    pub center_vertically: bool,
    /// Baseline advance as a multiple of `font_size`.
    pub line_advance_factor: f64,
}

impl<'a> BlockSpec<'a> {
    pub fn new(anchor_x: f64, anchor_y: f64, font_size: f64, items: &'a [String]) -> Self {
        Self {
            anchor_x,
            anchor_y,
            font_size,
            header: None,
            items,
            max_chars: 18,
            max_lines_total: 10,
            max_lines_per_item: None,
            center_vertically: false,
            line_advance_factor: 1.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Baseline {
    /// Absolute `y` of the first line.
    Absolute(f64),
    /// `dy` relative to the previous line.
    Relative(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineFragment {
    pub x: f64,
    pub baseline: Baseline,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockLayout {
    pub fragments: Vec<LineFragment>,
    pub line_count: usize,
    pub first_baseline: f64,
    pub advance: f64,
}

impl BlockLayout {
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.fragments.iter().map(|f| f.text.as_str())
    }

    /// Absolute baseline of every line, top to bottom.
    pub fn baselines(&self) -> Vec<f64> {
        (0..self.line_count)
            .map(|i| self.first_baseline + i as f64 * self.advance)
            .collect()
    }
}

/// Wraps the header and every item, caps the result at `max_lines_total` and positions it.
///
/// Only per-item truncation adds an ellipsis; the block-level cap simply drops the overflow.
pub fn layout_block(spec: &BlockSpec<'_>) -> BlockLayout {
    let mut lines = Vec::new();
    if let Some(header) = spec.header {
        lines.extend(wrap_text(header, spec.max_chars, None));
    }
    for item in spec.items {
        lines.extend(wrap_text(item, spec.max_chars, spec.max_lines_per_item));
    }
    if lines.len() > spec.max_lines_total {
        tracing::debug!(
            lines = lines.len(),
            max_lines_total = spec.max_lines_total,
            "block truncated"
        );
        lines.truncate(spec.max_lines_total);
    }

    let line_count = lines.len();
    let advance = spec.font_size * spec.line_advance_factor;
    let first_baseline = if spec.center_vertically && line_count > 1 {
        spec.anchor_y - (line_count - 1) as f64 * advance / 2.0
    } else {
        spec.anchor_y
    };

    let fragments = lines
        .into_iter()
        .enumerate()
        .map(|(i, text)| LineFragment {
            x: spec.anchor_x,
            baseline: if i == 0 {
                Baseline::Absolute(first_baseline)
            } else {
                Baseline::Relative(advance)
            },
            text,
        })
        .collect();

    BlockLayout {
        fragments,
        line_count,
        first_baseline,
        advance,
    }
}

/// Replaces `el`'s children with one `<tspan>` per line and records the line count in
/// `data-line-count`. The element's own `x`/`y` are left alone.
pub fn apply_block(el: &mut SvgElement, layout: &BlockLayout) {
    let tspan_name = match el.name.rsplit_once(':') {
        Some((prefix, _)) => format!("{prefix}:tspan"),
        None => "tspan".to_string(),
    };

    el.children.clear();
    for fragment in &layout.fragments {
        let mut tspan = SvgElement::new(tspan_name.as_str());
        tspan.set_attr("x", fmt_coord(fragment.x));
        match fragment.baseline {
            Baseline::Absolute(y) => tspan.set_attr("y", fmt_coord(y)),
            Baseline::Relative(dy) => tspan.set_attr("dy", fmt_coord(dy)),
        }
        if !fragment.text.is_empty() {
            tspan.children.push(SvgNode::Text(fragment.text.clone()));
        }
        el.push_child(tspan);
    }
    el.set_attr("data-line-count", layout.line_count.to_string());
}

/// Coordinates rounded to three decimals, without trailing zeros or `-0`.
fn fmt_coord(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let mut v = (v * 1000.0).round() / 1000.0;
    if v == 0.0 {
        v = 0.0;
    }
    format!("{v}")
}
