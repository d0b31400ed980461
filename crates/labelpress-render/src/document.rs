//! Owned, mutable SVG template tree.
//!
//! Templates are parsed with `roxmltree` (read-only) and copied into a small owned tree that the
//! render pass can edit: look up elements by `id`, replace text, rewrite attributes and children.
//! Serialization writes the tree back out with its namespace prefixes and declarations intact.

use crate::{Error, Result};
use rustc_hash::FxHashSet;
use std::fmt::Write as _;

const NS_XML_URI: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Debug, Clone, PartialEq)]
pub enum SvgNode {
    Element(SvgElement),
    Text(String),
    Comment(String),
    ProcessingInstruction { target: String, value: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SvgElement {
    /// Qualified name as written in the template (`text`, `svg:text`, `sodipodi:namedview`).
    pub name: String,
    /// Namespace declarations made on this element: `(prefix, uri)`, `None` for the default.
    pub namespaces: Vec<(Option<String>, String)>,
    /// Attributes in document order, by qualified name.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<SvgNode>,
}

impl SvgElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Name without namespace prefix.
    pub fn local_name(&self) -> &str {
        match self.name.rsplit_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Sets an attribute, keeping its position when it already exists.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self.attributes.iter().position(|(k, _)| k == name)?;
        Some(self.attributes.remove(idx).1)
    }

    /// Parses the first number of an attribute (`x="120"`, `x="120px"`, `x="120 140"`).
    pub fn numeric_attr(&self, name: &str) -> Option<f64> {
        parse_leading_number(self.attr(name)?)
    }

    /// Reads an inline `style="prop: value"` declaration.
    pub fn style_property(&self, property: &str) -> Option<&str> {
        let style = self.attr("style")?;
        style.split(';').find_map(|decl| {
            let (k, v) = decl.split_once(':')?;
            (k.trim() == property).then(|| v.trim())
        })
    }

    /// Declared font size: inline style wins over the presentation attribute, as in CSS.
    pub fn font_size(&self) -> Option<f64> {
        self.style_property("font-size")
            .and_then(parse_leading_number)
            .or_else(|| self.numeric_attr("font-size"))
            .filter(|v| v.is_finite() && *v > 0.0)
    }

    /// Replaces all children with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.clear();
        self.children.push(SvgNode::Text(text.into()));
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    pub fn push_child(&mut self, child: SvgElement) {
        self.children.push(SvgNode::Element(child));
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &SvgElement> {
        self.children.iter().filter_map(|c| match c {
            SvgNode::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn find_by_id(&self, id: &str) -> Option<&SvgElement> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.child_elements().find_map(|c| c.find_by_id(id))
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut SvgElement> {
        if self.id() == Some(id) {
            return Some(self);
        }
        for child in self.children.iter_mut() {
            if let SvgNode::Element(e) = child {
                if let Some(found) = e.find_by_id_mut(id) {
                    return Some(found);
                }
            }
        }
        None
    }
}

fn collect_text(el: &SvgElement, out: &mut String) {
    for child in &el.children {
        match child {
            SvgNode::Text(t) => out.push_str(t),
            SvgNode::Element(e) => collect_text(e, out),
            SvgNode::Comment(_) | SvgNode::ProcessingInstruction { .. } => {}
        }
    }
}

fn parse_leading_number(raw: &str) -> Option<f64> {
    let token = raw
        .split(|c: char| c.is_whitespace() || c == ',')
        .find(|t| !t.is_empty())?;
    let end = token
        .char_indices()
        .find(|&(i, c)| {
            !(c.is_ascii_digit()
                || c == '.'
                || ((c == '-' || c == '+') && (i == 0 || token[..i].ends_with(['e', 'E'])))
                || ((c == 'e' || c == 'E') && i > 0))
        })
        .map(|(i, _)| i)
        .unwrap_or(token.len());
    // `12em` stops after the `e`; drop it again.
    token[..end]
        .trim_end_matches(['e', 'E'])
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// A parsed template document.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgDocument {
    /// Comments and processing instructions that precede the root element.
    prolog: Vec<SvgNode>,
    root: SvgElement,
}

impl SvgDocument {
    pub fn parse(text: &str) -> Result<Self> {
        let opts = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..roxmltree::ParsingOptions::default()
        };
        let doc = roxmltree::Document::parse_with_options(text, opts).map_err(|e| {
            Error::TemplateParse {
                message: e.to_string(),
            }
        })?;

        let mut prolog = Vec::new();
        for node in doc.root().children() {
            if node.is_element() {
                break;
            }
            if let Some(n) = build_node(node) {
                prolog.push(n);
            }
        }
        let root = build_element(doc.root_element());

        let out = Self { prolog, root };
        for id in out.duplicate_ids() {
            tracing::warn!(id, "template declares duplicate element id; the first one is used");
        }
        Ok(out)
    }

    pub fn root(&self) -> &SvgElement {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut SvgElement {
        &mut self.root
    }

    pub fn element_by_id(&self, id: &str) -> Option<&SvgElement> {
        self.root.find_by_id(id)
    }

    pub fn element_by_id_mut(&mut self, id: &str) -> Option<&mut SvgElement> {
        self.root.find_by_id_mut(id)
    }

    /// Like [`Self::element_by_id_mut`], but a missing element is a fatal render error.
    pub fn require_element_mut(&mut self, id: &str) -> Result<&mut SvgElement> {
        self.root.find_by_id_mut(id).ok_or_else(|| {
            labelpress_core::Error::MissingRequiredElement {
                element_id: id.to_string(),
            }
            .into()
        })
    }

    pub fn require_element(&self, id: &str) -> Result<&SvgElement> {
        self.root.find_by_id(id).ok_or_else(|| {
            labelpress_core::Error::MissingRequiredElement {
                element_id: id.to_string(),
            }
            .into()
        })
    }

    /// Sets the text of the element with the given id.
    pub fn set_text(&mut self, id: &str, text: impl Into<String>) -> Result<()> {
        self.require_element_mut(id)?.set_text(text);
        Ok(())
    }

    fn duplicate_ids(&self) -> Vec<String> {
        fn walk<'a>(
            el: &'a SvgElement,
            seen: &mut FxHashSet<&'a str>,
            dups: &mut Vec<String>,
        ) {
            if let Some(id) = el.id() {
                if !seen.insert(id) {
                    dups.push(id.to_string());
                }
            }
            for c in el.child_elements() {
                walk(c, seen, dups);
            }
        }
        let mut seen = FxHashSet::default();
        let mut dups = Vec::new();
        walk(&self.root, &mut seen, &mut dups);
        dups
    }

    /// Serializes the document, prefixed with an XML declaration.
    pub fn to_svg_string(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        for node in &self.prolog {
            write_node(&mut out, node, false);
            out.push('\n');
        }
        write_element(&mut out, &self.root);
        out.push('\n');
        out
    }
}

impl std::fmt::Display for SvgDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_svg_string())
    }
}

impl std::str::FromStr for SvgDocument {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn build_node(node: roxmltree::Node<'_, '_>) -> Option<SvgNode> {
    if node.is_element() {
        return Some(SvgNode::Element(build_element(node)));
    }
    if node.is_text() {
        return Some(SvgNode::Text(node.text().unwrap_or_default().to_string()));
    }
    if node.is_comment() {
        return Some(SvgNode::Comment(node.text().unwrap_or_default().to_string()));
    }
    if let Some(pi) = node.pi() {
        return Some(SvgNode::ProcessingInstruction {
            target: pi.target.to_string(),
            value: pi.value.map(str::to_string),
        });
    }
    None
}

fn qualified(node: roxmltree::Node<'_, '_>, namespace: Option<&str>, local: &str) -> String {
    let prefix = match namespace {
        Some(NS_XML_URI) => Some("xml"),
        Some(uri) => node.lookup_prefix(uri),
        None => None,
    };
    match prefix {
        Some(p) if !p.is_empty() => format!("{p}:{local}"),
        _ => local.to_string(),
    }
}

fn build_element(node: roxmltree::Node<'_, '_>) -> SvgElement {
    let tag = node.tag_name();
    let name = qualified(node, tag.namespace(), tag.name());

    let inherited: Vec<(Option<&str>, &str)> = node
        .parent_element()
        .map(|p| p.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();
    let namespaces = node
        .namespaces()
        .filter(|ns| ns.uri() != NS_XML_URI)
        .filter(|ns| !inherited.contains(&(ns.name(), ns.uri())))
        .map(|ns| (ns.name().map(str::to_string), ns.uri().to_string()))
        .collect();

    let attributes = node
        .attributes()
        .map(|a| (qualified(node, a.namespace(), a.name()), a.value().to_string()))
        .collect();

    let children = node.children().filter_map(build_node).collect();

    SvgElement {
        name,
        namespaces,
        attributes,
        children,
    }
}

fn write_node(out: &mut String, node: &SvgNode, cdata: bool) {
    match node {
        SvgNode::Element(e) => write_element(out, e),
        SvgNode::Text(t) if cdata && !t.trim().is_empty() => {
            out.push_str("<![CDATA[");
            out.push_str(&t.replace("]]>", "]]]]><![CDATA[>"));
            out.push_str("]]>");
        }
        SvgNode::Text(t) => escape_xml_into(out, t),
        SvgNode::Comment(c) => {
            let _ = write!(out, "<!--{c}-->");
        }
        SvgNode::ProcessingInstruction { target, value } => match value {
            Some(v) => {
                let _ = write!(out, "<?{target} {v}?>");
            }
            None => {
                let _ = write!(out, "<?{target}?>");
            }
        },
    }
}

fn write_element(out: &mut String, el: &SvgElement) {
    out.push('<');
    out.push_str(&el.name);
    for (prefix, uri) in &el.namespaces {
        match prefix {
            Some(p) => {
                let _ = write!(out, " xmlns:{p}=\"");
            }
            None => out.push_str(" xmlns=\""),
        }
        escape_xml_into(out, uri);
        out.push('"');
    }
    for (k, v) in &el.attributes {
        let _ = write!(out, " {k}=\"");
        escape_xml_into(out, v);
        out.push('"');
    }
    if el.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    let cdata = matches!(el.local_name(), "style" | "script");
    for child in &el.children {
        write_node(out, child, cdata);
    }
    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
}

pub(crate) fn escape_xml_into(out: &mut String, text: &str) {
    let mut start = 0usize;
    for (i, b) in text.bytes().enumerate() {
        let esc = match b {
            b'&' => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            b'"' => "&quot;",
            _ => continue,
        };
        if start < i {
            out.push_str(&text[start..i]);
        }
        out.push_str(esc);
        start = i + 1;
    }
    if start < text.len() {
        out.push_str(&text[start..]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<!-- stock label -->
<svg xmlns="http://www.w3.org/2000/svg" xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape" viewBox="0 0 100 100">
  <style id="css"><![CDATA[:root { --ink: #000; } .a > b { fill: var(--ink); }]]></style>
  <g inkscape:label="Layer 1">
    <text id="t_label" x="10" y="20" style="font-size: 12px; fill: red">OLD <tspan>CHILD</tspan></text>
    <circle id="hole" cx="50" cy="50" r="4"/>
  </g>
</svg>
"##;

    #[test]
    fn lookup_and_set_text() {
        let mut doc = SvgDocument::parse(TEMPLATE).unwrap();
        assert_eq!(doc.element_by_id("t_label").unwrap().text_content(), "OLD CHILD");
        doc.set_text("t_label", "A & B").unwrap();
        let el = doc.element_by_id("t_label").unwrap();
        assert_eq!(el.children, vec![SvgNode::Text("A & B".to_string())]);
        assert!(doc.to_svg_string().contains(">A &amp; B</text>"));
    }

    #[test]
    fn missing_element_is_a_required_element_error() {
        let mut doc = SvgDocument::parse(TEMPLATE).unwrap();
        let err = doc.set_text("t_nope", "x").unwrap_err();
        assert!(matches!(
            err,
            Error::Core(labelpress_core::Error::MissingRequiredElement { ref element_id })
                if element_id == "t_nope"
        ));
    }

    #[test]
    fn serialization_keeps_prefixes_declarations_and_cdata() {
        let doc = SvgDocument::parse(TEMPLATE).unwrap();
        let out = doc.to_svg_string();
        assert!(out.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!-- stock label -->\n"));
        assert!(out.contains(r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape" viewBox="0 0 100 100">"#));
        assert!(out.contains(r#"<g inkscape:label="Layer 1">"#));
        assert!(out.contains("<![CDATA[:root { --ink: #000; } .a > b { fill: var(--ink); }]]>"));
        assert!(out.contains(r#"<circle id="hole" cx="50" cy="50" r="4"/>"#));

        let reparsed = SvgDocument::parse(&out).unwrap();
        assert_eq!(reparsed, doc);
    }

    #[test]
    fn font_size_prefers_inline_style() {
        let doc = SvgDocument::parse(TEMPLATE).unwrap();
        assert_eq!(doc.element_by_id("t_label").unwrap().font_size(), Some(12.0));

        let mut el = SvgElement::new("text");
        el.set_attr("font-size", "22px");
        assert_eq!(el.font_size(), Some(22.0));
        el.set_attr("font-size", "large");
        assert_eq!(el.font_size(), None);
    }

    #[test]
    fn leading_numbers_tolerate_units_and_lists() {
        assert_eq!(parse_leading_number("120"), Some(120.0));
        assert_eq!(parse_leading_number(" 12.5px"), Some(12.5));
        assert_eq!(parse_leading_number("10 20 30"), Some(10.0));
        assert_eq!(parse_leading_number("-4,2"), Some(-4.0));
        assert_eq!(parse_leading_number("1e2"), Some(100.0));
        assert_eq!(parse_leading_number("auto"), None);
    }

    #[test]
    fn set_attr_keeps_attribute_order() {
        let mut el = SvgElement::new("text");
        el.set_attr("x", "1");
        el.set_attr("y", "2");
        el.set_attr("x", "3");
        assert_eq!(
            el.attributes,
            vec![("x".to_string(), "3".to_string()), ("y".to_string(), "2".to_string())]
        );
        assert_eq!(el.remove_attr("x").as_deref(), Some("3"));
        assert_eq!(el.attr("x"), None);
    }

    #[test]
    fn malformed_template_is_a_parse_error() {
        let err = SvgDocument::parse("<svg><text></svg>").unwrap_err();
        assert!(matches!(err, Error::TemplateParse { .. }));
    }
}
