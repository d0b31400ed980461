#![forbid(unsafe_code)]

//! Headless label layout for `labelpress`.
//!
//! Takes a parsed SVG template and a release record and produces the finished document: field
//! text resolved and set, track columns wrapped and positioned, style variables patched and fonts
//! embedded. No glyphs are shaped; widths come from a pluggable [`text::TextMeasurer`].

pub mod block;
pub mod document;
pub mod font;
pub mod label;
pub mod style;
pub mod text;
pub mod width;

pub use block::{Baseline, BlockLayout, BlockSpec, LineFragment, apply_block, layout_block};
pub use document::{SvgDocument, SvgElement, SvgNode};
pub use font::{FontFace, embed_face, font_face_rule, mime_type_for_path};
pub use label::{ColumnReport, RenderReport, render_label};
pub use style::{StyleVariableTable, set_variable};
pub use text::{HeuristicTextMeasurer, TextMeasurer, TextStyle, wrap_text};
pub use width::{MIN_MAX_CHARS, estimate_max_chars, estimate_max_chars_with};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] labelpress_core::Error),
    #[error("template is not well-formed SVG: {message}")]
    TemplateParse { message: String },
    #[error("element id='{element_id}' has an unusable {attribute}={value:?}")]
    InvalidGeometry {
        element_id: String,
        attribute: String,
        value: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
