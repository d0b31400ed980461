//! The single-record render pass.

use crate::block::{BlockSpec, apply_block, layout_block};
use crate::document::{SvgDocument, SvgElement};
use crate::font::FontFace;
use crate::style::StyleVariableTable;
use crate::text::{TextMeasurer, TextStyle};
use crate::width::estimate_max_chars_with;
use crate::{Error, Result};
use labelpress_core::{
    ColumnConfig, LabelConfig, ReleaseRecord, Resolver, TemplateDefaults, WidthBudget,
};

/// What a render pass did, for logging and batch summaries.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    /// Resolved `catalog` field; empty when neither the record nor the defaults provide one.
    pub catalog: String,
    pub fields_set: usize,
    pub columns: Vec<ColumnReport>,
    pub style_variables_set: usize,
    pub fonts_embedded: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnReport {
    pub element_id: String,
    pub max_chars: usize,
    pub line_count: usize,
}

/// Applies `config` to `doc` for one release record.
///
/// In order: template defaults are read, field bindings set, track columns laid out, style
/// variables patched and fonts embedded; the style block is written back last. Any missing
/// required element or style block aborts the pass, leaving `doc` partially updated.
pub fn render_label(
    doc: &mut SvgDocument,
    record: &ReleaseRecord,
    config: &LabelConfig,
    fonts: &[FontFace],
    measurer: &dyn TextMeasurer,
) -> Result<RenderReport> {
    let mut style = StyleVariableTable::from_document(doc, &config.style_element_id)?;

    let defaults = template_defaults(doc, &config.defaults_element_id);
    let resolver = Resolver::new(record, &defaults);
    let catalog = resolver.resolve("catalog", "");

    let mut fields_set = 0;
    for binding in &config.fields {
        let text = binding.value.render(&resolver);
        if binding.required {
            doc.set_text(&binding.element_id, text)?;
        } else if let Some(el) = doc.element_by_id_mut(&binding.element_id) {
            el.set_text(text);
        } else {
            tracing::debug!(element_id = %binding.element_id, "optional field element absent");
            continue;
        }
        fields_set += 1;
    }

    let mut columns = Vec::with_capacity(config.columns.len());
    for column in &config.columns {
        columns.push(render_column(doc, &resolver, config, column, measurer)?);
    }

    for binding in &config.style_variables {
        style.set(&binding.name, &binding.value.render(&resolver));
    }
    for face in fonts {
        tracing::debug!(family = %face.family, bytes = face.bytes.len(), "embedding font face");
        style.embed_font_face(face);
    }
    style.commit(doc, &config.style_element_id)?;

    Ok(RenderReport {
        catalog,
        fields_set,
        columns,
        style_variables_set: config.style_variables.len(),
        fonts_embedded: fonts.len(),
    })
}

fn template_defaults(doc: &SvgDocument, element_id: &str) -> TemplateDefaults {
    match doc.element_by_id(element_id) {
        Some(el) => TemplateDefaults::parse(&el.text_content()),
        None => {
            tracing::warn!(element_id, "template has no defaults container; using none");
            TemplateDefaults::new()
        }
    }
}

fn render_column(
    doc: &mut SvgDocument,
    resolver: &Resolver<'_>,
    config: &LabelConfig,
    column: &ColumnConfig,
    measurer: &dyn TextMeasurer,
) -> Result<ColumnReport> {
    let mut items = resolver.resolve_list(&column.list_group, &column.side);
    if column.numbered {
        let side = column.side.to_uppercase();
        for (i, item) in items.iter_mut().enumerate() {
            *item = format!("{side}{}. {item}", i + 1);
        }
    }

    let el = doc.require_element(&column.element_id)?;
    let anchor_x = required_number(el, &column.element_id, "x")?;
    let anchor_y = required_number(el, &column.element_id, "y")?;
    let font_size = el.font_size().unwrap_or_else(|| {
        tracing::warn!(
            element_id = %column.element_id,
            font_size = config.default_font_size,
            "column element declares no font size; using the default"
        );
        config.default_font_size
    });
    let text_style = TextStyle::new(font_size, column.letter_spacing_em);

    let max_chars = match &column.budget {
        WidthBudget::MaxChars(n) => *n,
        WidthBudget::RightX { x, padding_px } => {
            estimate_max_chars_with(measurer, anchor_x, &text_style, *x, *padding_px)
        }
        WidthBudget::Boundary {
            element_id,
            padding_px,
        } => {
            let right = left_edge(doc.require_element(element_id)?, element_id)?;
            estimate_max_chars_with(measurer, anchor_x, &text_style, right, *padding_px)
        }
    };

    let layout = layout_block(&BlockSpec {
        anchor_x,
        anchor_y,
        font_size,
        header: column.header.as_deref(),
        items: &items,
        max_chars,
        max_lines_total: column.max_lines_total,
        max_lines_per_item: column.max_lines_per_item,
        center_vertically: column.center_vertically,
        line_advance_factor: config.line_advance_factor,
    });
    tracing::debug!(
        element_id = %column.element_id,
        items = items.len(),
        max_chars,
        lines = layout.line_count,
        "column laid out"
    );

    apply_block(doc.require_element_mut(&column.element_id)?, &layout);
    Ok(ColumnReport {
        element_id: column.element_id.clone(),
        max_chars,
        line_count: layout.line_count,
    })
}

/// Leftmost x of a boundary element: `cx - r` for circles, `cx - rx` for ellipses, `x` otherwise.
fn left_edge(el: &SvgElement, element_id: &str) -> Result<f64> {
    match el.local_name() {
        "circle" => Ok(required_number(el, element_id, "cx")? - required_number(el, element_id, "r")?),
        "ellipse" => {
            Ok(required_number(el, element_id, "cx")? - required_number(el, element_id, "rx")?)
        }
        _ => required_number(el, element_id, "x"),
    }
}

fn required_number(el: &SvgElement, element_id: &str, attribute: &str) -> Result<f64> {
    el.numeric_attr(attribute).ok_or_else(|| Error::InvalidGeometry {
        element_id: element_id.to_string(),
        attribute: attribute.to_string(),
        value: el.attr(attribute).unwrap_or_default().to_string(),
    })
}
