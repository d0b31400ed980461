#![forbid(unsafe_code)]

//! Release records, template defaults and value resolution for `labelpress` (headless).
//!
//! This crate owns the data side of a label render: what a field's final text is, given a
//! release record, the defaults embedded in a template and a fallback. It performs no I/O and
//! knows nothing about SVG.

pub mod config;
pub mod defaults;
pub mod error;
pub mod record;
pub mod resolve;
pub mod value_template;

pub use config::{
    ColumnConfig, FieldBinding, FontFaceConfig, LabelConfig, StyleVariableBinding, WidthBudget,
};
pub use defaults::TemplateDefaults;
pub use error::{Error, Result};
pub use record::ReleaseRecord;
pub use resolve::Resolver;
pub use value_template::ValueTemplate;

#[cfg(test)]
mod tests;
