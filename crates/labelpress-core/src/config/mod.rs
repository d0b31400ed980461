//! Label layout configuration.
//!
//! Everything that ties the engine to one particular template design (element ids, geometric
//! boundaries, header strings, line budgets) lives here rather than in code. `LabelConfig::default()`
//! matches the stock `label.template.svg`.

use crate::value_template::ValueTemplate;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LabelConfig {
    /// Id of the `<style>` element holding the label's custom properties.
    pub style_element_id: String,
    /// Id of the element holding `KEY=VALUE` template defaults.
    pub defaults_element_id: String,
    /// Font size assumed for elements that declare none.
    pub default_font_size: f64,
    /// Baseline-to-baseline advance, as a multiple of the font size.
    pub line_advance_factor: f64,
    pub fields: Vec<FieldBinding>,
    pub style_variables: Vec<StyleVariableBinding>,
    pub columns: Vec<ColumnConfig>,
    pub fonts: Vec<FontFaceConfig>,
}

impl Default for LabelConfig {
    fn default() -> Self {
        let field = |element_id: &str, value: &str| FieldBinding {
            element_id: element_id.to_string(),
            value: ValueTemplate::parse(value).expect("stock value templates are well-formed"),
            required: true,
        };

        Self {
            style_element_id: "label-style".to_string(),
            defaults_element_id: "label-defaults".to_string(),
            default_font_size: 16.0,
            line_advance_factor: 1.1,
            fields: vec![
                field("t_label", "{label|IMMUTABLE}"),
                field("t_coord_lat", "{coords.lat}"),
                field("t_coord_lon", "{coords.lon}"),
                field("t_serial", "SERIAL: {serial}"),
                field("t_idx", "IDX: {idx}"),
                field("t_code", "CODE: {code}"),
                field("t_sector", "SECTOR: {sector}"),
                field("t_bottom", "{catalog} • {speed|33⅓} • {genre|HARDGROOVE}"),
            ],
            style_variables: vec![
                StyleVariableBinding {
                    name: "neon-bg".to_string(),
                    value: ValueTemplate::field("colors.bg", "#B7E718"),
                },
                StyleVariableBinding {
                    name: "neon-ink".to_string(),
                    value: ValueTemplate::field("colors.ink", "#0A3DBB"),
                },
            ],
            columns: vec![
                ColumnConfig {
                    element_id: "t_tracks_a".to_string(),
                    side: "a".to_string(),
                    header: Some("SIDE A".to_string()),
                    budget: WidthBudget::Boundary {
                        element_id: "spindle".to_string(),
                        padding_px: 24.0,
                    },
                    ..ColumnConfig::default()
                },
                ColumnConfig {
                    element_id: "t_tracks_b".to_string(),
                    side: "b".to_string(),
                    header: Some("SIDE B".to_string()),
                    budget: WidthBudget::MaxChars(18),
                    ..ColumnConfig::default()
                },
            ],
            fonts: Vec::new(),
        }
    }
}

impl LabelConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text).map_err(|e| Error::InvalidConfig {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).map_err(|e| Error::InvalidConfig {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(Error::InvalidConfig { message });

        if self.style_element_id.trim().is_empty() {
            return invalid("style_element_id must not be empty".to_string());
        }
        if !(self.default_font_size.is_finite() && self.default_font_size > 0.0) {
            return invalid(format!(
                "default_font_size must be positive, got {}",
                self.default_font_size
            ));
        }
        if !(self.line_advance_factor.is_finite() && self.line_advance_factor > 0.0) {
            return invalid(format!(
                "line_advance_factor must be positive, got {}",
                self.line_advance_factor
            ));
        }
        for binding in &self.fields {
            if binding.element_id.trim().is_empty() {
                return invalid("field binding with empty element_id".to_string());
            }
        }
        for binding in &self.style_variables {
            let name = binding.name.trim_start_matches("--");
            if name.is_empty() || name.contains(|c: char| c.is_whitespace() || c == ':' || c == ';')
            {
                return invalid(format!("invalid style variable name {:?}", binding.name));
            }
        }
        for column in &self.columns {
            if column.element_id.trim().is_empty() {
                return invalid("column with empty element_id".to_string());
            }
            if column.max_lines_total == 0 {
                return invalid(format!(
                    "column '{}': max_lines_total must be at least 1",
                    column.element_id
                ));
            }
            if column.max_lines_per_item == Some(0) {
                return invalid(format!(
                    "column '{}': max_lines_per_item must be at least 1",
                    column.element_id
                ));
            }
            if let WidthBudget::MaxChars(0) = column.budget {
                return invalid(format!(
                    "column '{}': max_chars must be at least 1",
                    column.element_id
                ));
            }
        }
        for font in &self.fonts {
            if font.family.trim().is_empty() {
                return invalid(format!("font {} has an empty family", font.path.display()));
            }
        }
        Ok(())
    }
}

/// Sets an element's text from a value template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldBinding {
    pub element_id: String,
    pub value: ValueTemplate,
    /// When false, a template without this element is tolerated and the binding is skipped.
    #[serde(default = "default_true")]
    pub required: bool,
}

/// Sets a `--name` custom property in the style block from a value template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StyleVariableBinding {
    pub name: String,
    pub value: ValueTemplate,
}

/// One flowed list column (a side of the track listing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnConfig {
    /// The `<text>` element that anchors the column.
    pub element_id: String,
    /// Record group holding the lists (`tracks`).
    pub list_group: String,
    /// List member within the group (`a` for `tracks.a` / `tracks_a`).
    pub side: String,
    pub header: Option<String>,
    pub budget: WidthBudget,
    pub letter_spacing_em: f64,
    pub max_lines_total: usize,
    /// Per-item line cap (ellipsis on the last kept line); unlimited by default.
    pub max_lines_per_item: Option<usize>,
    pub center_vertically: bool,
    /// Prefix items with `<SIDE><n>. `.
    pub numbered: bool,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            element_id: String::new(),
            list_group: "tracks".to_string(),
            side: String::new(),
            header: None,
            budget: WidthBudget::MaxChars(18),
            letter_spacing_em: 0.0,
            max_lines_total: 10,
            max_lines_per_item: None,
            center_vertically: false,
            numbered: false,
        }
    }
}

/// How a column's maximum characters-per-line is derived.
///
/// In configuration files this is a flat mapping with exactly one of `boundary`, `right_x` or
/// `max_chars`, plus an optional `padding_px`:
///
/// ```yaml
/// budget:
///   boundary: spindle
///   padding_px: 24
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BudgetRepr", into = "BudgetRepr")]
pub enum WidthBudget {
    /// The right boundary is the left edge of another template element.
    Boundary { element_id: String, padding_px: f64 },
    /// The right boundary is a fixed x coordinate.
    RightX { x: f64, padding_px: f64 },
    /// A fixed, conservative character budget.
    MaxChars(usize),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct BudgetRepr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    boundary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    right_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_chars: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    padding_px: Option<f64>,
}

impl TryFrom<BudgetRepr> for WidthBudget {
    type Error = String;

    fn try_from(repr: BudgetRepr) -> std::result::Result<Self, Self::Error> {
        let padding_px = repr.padding_px.unwrap_or(0.0);
        match (repr.boundary, repr.right_x, repr.max_chars) {
            (Some(element_id), None, None) => Ok(Self::Boundary {
                element_id,
                padding_px,
            }),
            (None, Some(x), None) => Ok(Self::RightX { x, padding_px }),
            (None, None, Some(n)) if repr.padding_px.is_none() => Ok(Self::MaxChars(n)),
            (None, None, Some(_)) => Err("padding_px has no effect with max_chars".to_string()),
            _ => Err("budget needs exactly one of boundary, right_x or max_chars".to_string()),
        }
    }
}

impl From<WidthBudget> for BudgetRepr {
    fn from(budget: WidthBudget) -> Self {
        match budget {
            WidthBudget::Boundary {
                element_id,
                padding_px,
            } => Self {
                boundary: Some(element_id),
                padding_px: Some(padding_px),
                ..Self::default()
            },
            WidthBudget::RightX { x, padding_px } => Self {
                right_x: Some(x),
                padding_px: Some(padding_px),
                ..Self::default()
            },
            WidthBudget::MaxChars(n) => Self {
                max_chars: Some(n),
                ..Self::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FontFaceConfig {
    pub family: String,
    pub path: PathBuf,
    #[serde(default = "default_font_weight")]
    pub weight: String,
    #[serde(default = "default_font_style")]
    pub style: String,
}

fn default_true() -> bool {
    true
}

fn default_font_weight() -> String {
    "400".to_string()
}

fn default_font_style() -> String {
    "normal".to_string()
}
