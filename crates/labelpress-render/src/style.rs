//! Surgical edits of the template's style block.
//!
//! The style block is never parsed into a stylesheet. Custom properties (`--name: value;`) are
//! located with a targeted pattern and rewritten in place, so everything else in the block
//! (selectors, comments, formatting, declaration order) survives untouched.

use crate::document::SvgDocument;
use crate::font::FontFace;
use crate::Result;
use regex::Regex;
use std::ops::Range;

/// The `--name` custom properties of one style block.
///
/// Every operation re-scans the current text; nothing is cached between calls. Changes stay in
/// this value until [`Self::commit`] writes the text back into a document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyleVariableTable {
    text: String,
}

impl StyleVariableTable {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Reads the text of the style container `element_id`.
    ///
    /// A template without it cannot be rendered: fails with `MissingStyleBlock`.
    pub fn from_document(doc: &SvgDocument, element_id: &str) -> Result<Self> {
        let el = doc.element_by_id(element_id).ok_or_else(|| {
            labelpress_core::Error::MissingStyleBlock {
                element_id: element_id.to_string(),
            }
        })?;
        Ok(Self::new(el.text_content()))
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// Current value of `--name`, trimmed. Accepts `name` with or without the leading `--`.
    pub fn get(&self, name: &str) -> Option<&str> {
        let span = find_declaration(&self.text, name)?;
        Some(self.text[span.value_start..span.value_end].trim())
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.text = set_variable(&self.text, name, value);
    }

    /// Appends a complete rule at the end of the block, separated by a blank line.
    pub fn append_rule(&mut self, rule: &str) {
        let mut out = self.text.trim_end().to_string();
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(rule.trim());
        out.push('\n');
        self.text = out;
    }

    pub fn embed_font_face(&mut self, face: &FontFace) {
        self.append_rule(&face.to_css_rule());
    }

    /// Writes the text back into the style container.
    pub fn commit(self, doc: &mut SvgDocument, element_id: &str) -> Result<()> {
        let el = doc.element_by_id_mut(element_id).ok_or_else(|| {
            labelpress_core::Error::MissingStyleBlock {
                element_id: element_id.to_string(),
            }
        })?;
        el.set_text(self.text);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct DeclarationSpan {
    value_start: usize,
    /// End of the value, excluding whitespace before the terminating `;`.
    value_end: usize,
}

fn normalize_name(name: &str) -> &str {
    name.trim().trim_start_matches("--")
}

fn declaration_re(name: &str) -> Regex {
    let escaped = regex::escape(&format!("--{}", normalize_name(name)));
    // The leading group keeps `--x-neon-bg` from matching `--neon-bg`; the trailing `\s*:` keeps
    // `--neon-bg-alt` from matching.
    Regex::new(&format!(r"(?:^|[\s;{{]){escaped}\s*:\s*")).unwrap()
}

fn find_declaration(text: &str, name: &str) -> Option<DeclarationSpan> {
    let comments = comment_spans(text);
    let m = declaration_re(name)
        .find_iter(text)
        .find(|m| !comments.iter().any(|c| c.contains(&(m.end() - 1))))?;
    let value_start = m.end();
    let rest = &text[value_start..];
    let len = rest.find([';', '}']).unwrap_or(rest.len());
    let value_end = value_start + rest[..len].trim_end().len();
    Some(DeclarationSpan {
        value_start,
        value_end,
    })
}

/// Byte ranges of `/* ... */` comments outside quoted strings. An unterminated comment runs to
/// the end of the text.
fn comment_spans(text: &str) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = text[i + 2..]
                    .find("*/")
                    .map(|p| i + 2 + p + 2)
                    .unwrap_or(bytes.len());
                out.push(i..end);
                i = end;
                continue;
            }
            b'"' | b'\'' => {
                let quote = bytes[i];
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    out
}

/// Cuts `value` at the first character that would end the declaration or the rule around it
/// (`;`, `{`, `}`) or open a comment.
fn declaration_value<'a>(name: &str, value: &'a str) -> &'a str {
    let value = value.trim();
    let cut = [value.find([';', '{', '}']), value.find("/*")]
        .into_iter()
        .flatten()
        .min();
    match cut {
        Some(at) => {
            tracing::warn!(name, value, "style variable value cut at a CSS delimiter");
            value[..at].trim_end()
        }
        None => value,
    }
}

/// Sets `--name` to `value` in a style block's text.
///
/// When a declaration exists, only its value is replaced (the first one outside comments, if the
/// block declares the name more than once). Otherwise one declaration is inserted right after the
/// opening brace of the first root-level rule that is not an at-rule; a block with no such rule
/// gets a new `:root` rule appended.
///
/// `value` is kept to a single declaration: anything from the first `;`, `{`, `}` or `/*` on is
/// dropped.
pub fn set_variable(style_text: &str, name: &str, value: &str) -> String {
    let name = normalize_name(name);
    let value = declaration_value(name, value);

    if let Some(span) = find_declaration(style_text, name) {
        let mut out = String::with_capacity(style_text.len() + value.len());
        out.push_str(&style_text[..span.value_start]);
        out.push_str(value);
        out.push_str(&style_text[span.value_end..]);
        return out;
    }

    let decl = format!("--{name}: {value};");
    match first_rule_body_start(style_text) {
        Some(at) => {
            let mut out = String::with_capacity(style_text.len() + decl.len() + 3);
            out.push_str(&style_text[..at]);
            out.push_str("\n  ");
            out.push_str(&decl);
            out.push_str(&style_text[at..]);
            out
        }
        None => {
            tracing::debug!(name, "style block has no rule; appending :root");
            let mut out = style_text.trim_end().to_string();
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(":root {\n  ");
            out.push_str(&decl);
            out.push_str("\n}\n");
            out
        }
    }
}

/// Byte offset just past the `{` of the first root-level, non-at-rule block.
fn first_rule_body_start(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut prelude_start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let close = text[i + 2..].find("*/").map(|p| i + 2 + p + 2);
                i = close.unwrap_or(bytes.len());
                if depth == 0 {
                    prelude_start = i;
                }
                continue;
            }
            b'"' | b'\'' => {
                let quote = bytes[i];
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'{' => {
                if depth == 0 && !text[prelude_start..i].trim().starts_with('@') {
                    return Some(i + 1);
                }
                depth += 1;
            }
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    prelude_start = i + 1;
                }
            }
            b';' if depth == 0 => prelude_start = i + 1,
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSS: &str = ":root {\n  --neon-bg:#B7E718;\n  --neon-ink: #0A3DBB ;\n}\n.bg { fill: var(--neon-bg); }\n";

    #[test]
    fn replaces_only_the_value_segment() {
        let out = set_variable(CSS, "neon-bg", "#FF0000");
        assert_eq!(
            out,
            ":root {\n  --neon-bg:#FF0000;\n  --neon-ink: #0A3DBB ;\n}\n.bg { fill: var(--neon-bg); }\n"
        );
        let out = set_variable(&out, "--neon-ink", "#123456");
        assert!(out.contains("--neon-ink: #123456 ;"));
    }

    #[test]
    fn repatching_never_duplicates() {
        let mut table = StyleVariableTable::new(CSS);
        table.set("neon-bg", "#FF0000");
        table.set("neon-bg", "#00FF00");
        assert_eq!(table.as_str().matches("--neon-bg:").count(), 1);
        assert_eq!(table.get("neon-bg"), Some("#00FF00"));
    }

    #[test]
    fn missing_variable_is_inserted_once_after_first_rule_brace() {
        let mut table = StyleVariableTable::new(CSS);
        table.set("label-accent", "#FFFFFF");
        assert!(table.as_str().starts_with(":root {\n  --label-accent: #FFFFFF;\n  --neon-bg:"));
        table.set("label-accent", "#000000");
        assert_eq!(table.as_str().matches("--label-accent").count(), 1);
        assert_eq!(table.get("label-accent"), Some("#000000"));
    }

    #[test]
    fn similar_names_are_not_confused() {
        let css = ":root { --x-neon-bg: 1; --neon-bg-alt: 2; }";
        assert_eq!(StyleVariableTable::new(css).get("neon-bg"), None);
        let out = set_variable(css, "neon-bg", "3");
        assert_eq!(out, ":root {\n  --neon-bg: 3; --x-neon-bg: 1; --neon-bg-alt: 2; }");
    }

    #[test]
    fn names_are_matched_literally() {
        let css = ":root { --a.b: 1; --aXb: 2; }";
        let table = StyleVariableTable::new(css);
        assert_eq!(table.get("a.b"), Some("1"));
        assert_eq!(table.get("aXb"), Some("2"));
    }

    #[test]
    fn insertion_skips_at_rules_and_comments() {
        let css = "/* { not a rule } */\n@font-face { font-family: \"A{\"; }\n.label { fill: red; }";
        let out = set_variable(css, "ink", "blue");
        assert!(out.contains(".label {\n  --ink: blue; fill: red; }"), "{out}");
        assert!(out.contains("@font-face { font-family: \"A{\"; }"));
    }

    #[test]
    fn block_without_rules_gets_a_root_rule() {
        assert_eq!(set_variable("", "ink", "blue"), ":root {\n  --ink: blue;\n}\n");
        assert_eq!(
            set_variable("/* empty */", "ink", "blue"),
            "/* empty */\n:root {\n  --ink: blue;\n}\n"
        );
    }

    #[test]
    fn last_declaration_without_semicolon_is_replaced() {
        let out = set_variable(":root { --ink: red }", "ink", "blue");
        assert_eq!(out, ":root { --ink: blue }");
    }

    #[test]
    fn values_cannot_close_the_declaration_or_rule() {
        let out = set_variable(
            CSS,
            "neon-bg",
            "red; --neon-bg: blue; } svg { display: none",
        );
        assert_eq!(
            out,
            ":root {\n  --neon-bg:red;\n  --neon-ink: #0A3DBB ;\n}\n.bg { fill: var(--neon-bg); }\n"
        );
        assert_eq!(out.matches("--neon-bg:").count(), 1);

        let out = set_variable(":root { --ink: red; }", "ink", "blue /* } */");
        assert_eq!(out, ":root { --ink: blue; }");

        let out = set_variable(":root { --bg: red; }", "ink", "x}y");
        assert_eq!(out, ":root {\n  --ink: x; --bg: red; }");
    }

    #[test]
    fn declarations_inside_comments_are_ignored() {
        let css = "/* --neon-bg: old; */\n:root { --neon-bg:#B7E718; }\n";
        let table = StyleVariableTable::new(css);
        assert_eq!(table.get("neon-bg"), Some("#B7E718"));

        let out = set_variable(css, "neon-bg", "#FF0000");
        assert_eq!(out, "/* --neon-bg: old; */\n:root { --neon-bg:#FF0000; }\n");

        let only_commented = ":root { /* --ink: red; */ fill: none; }";
        assert_eq!(StyleVariableTable::new(only_commented).get("ink"), None);
        let out = set_variable(only_commented, "ink", "blue");
        assert_eq!(out, ":root {\n  --ink: blue; /* --ink: red; */ fill: none; }");
    }

    #[test]
    fn append_rule_separates_with_a_blank_line() {
        let mut table = StyleVariableTable::new(".a { fill: red; }\n\n");
        table.append_rule("@font-face { font-family: \"X\"; }");
        assert_eq!(
            table.as_str(),
            ".a { fill: red; }\n\n@font-face { font-family: \"X\"; }\n"
        );
    }
}
