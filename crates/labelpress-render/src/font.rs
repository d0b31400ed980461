//! Self-contained `@font-face` rules with the font inlined as a base64 data URI.

use base64::Engine as _;
use std::path::Path;

/// A font asset ready to be embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFace {
    pub family: String,
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub weight: String,
    pub style: String,
}

impl FontFace {
    /// Builds a face whose MIME type is derived from `path`'s extension.
    pub fn from_bytes(
        family: impl Into<String>,
        path: &Path,
        bytes: Vec<u8>,
        weight: impl Into<String>,
        style: impl Into<String>,
    ) -> Self {
        Self {
            family: family.into(),
            bytes,
            mime_type: mime_type_for_path(path).to_string(),
            weight: weight.into(),
            style: style.into(),
        }
    }

    pub fn to_css_rule(&self) -> String {
        font_face_rule(
            &self.family,
            &self.bytes,
            &self.mime_type,
            &self.weight,
            &self.style,
        )
    }
}

/// `.woff2` → `font/woff2`, `.woff` → `font/woff`, `.otf` → `font/otf`, anything else `font/ttf`.
pub fn mime_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("woff2") => "font/woff2",
        Some("woff") => "font/woff",
        Some("otf") => "font/otf",
        _ => "font/ttf",
    }
}

fn format_hint(mime_type: &str) -> &'static str {
    match mime_type {
        "font/woff2" => "woff2",
        "font/woff" => "woff",
        "font/otf" => "opentype",
        _ => "truetype",
    }
}

pub fn font_face_rule(
    family: &str,
    font_bytes: &[u8],
    mime_type: &str,
    weight: &str,
    style_keyword: &str,
) -> String {
    let payload = base64::engine::general_purpose::STANDARD.encode(font_bytes);
    let family = family.replace('\\', "\\\\").replace('"', "\\\"");
    format!(
        "@font-face {{\n  font-family: \"{family}\";\n  src: url(data:{mime_type};base64,{payload}) format(\"{hint}\");\n  font-weight: {weight};\n  font-style: {style_keyword};\n  font-display: swap;\n}}",
        hint = format_hint(mime_type),
    )
}

/// Appends a face rule to the end of `style_text`, separated by a blank line.
///
/// Faces are never deduplicated: embedding the same family twice yields two rules.
pub fn embed_face(
    style_text: &str,
    family: &str,
    font_bytes: &[u8],
    mime_type: &str,
    weight: &str,
    style_keyword: &str,
) -> String {
    let mut table = crate::style::StyleVariableTable::new(style_text);
    table.append_rule(&font_face_rule(
        family,
        font_bytes,
        mime_type,
        weight,
        style_keyword,
    ));
    table.into_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_type_follows_extension() {
        assert_eq!(mime_type_for_path(Path::new("a/Label-Bold.woff2")), "font/woff2");
        assert_eq!(mime_type_for_path(Path::new("Label.WOFF")), "font/woff");
        assert_eq!(mime_type_for_path(Path::new("Label.otf")), "font/otf");
        assert_eq!(mime_type_for_path(Path::new("Label.ttf")), "font/ttf");
        assert_eq!(mime_type_for_path(Path::new("Label")), "font/ttf");
    }

    #[test]
    fn rule_inlines_base64_payload() {
        let rule = font_face_rule("Label Sans", b"abc", "font/woff2", "700", "italic");
        assert_eq!(
            rule,
            "@font-face {\n  font-family: \"Label Sans\";\n  src: url(data:font/woff2;base64,YWJj) format(\"woff2\");\n  font-weight: 700;\n  font-style: italic;\n  font-display: swap;\n}"
        );
    }

    #[test]
    fn embedding_appends_without_deduplicating() {
        let css = ":root { --ink: #000; }";
        let once = embed_face(css, "Mono", b"x", "font/ttf", "400", "normal");
        assert!(once.starts_with(":root { --ink: #000; }\n\n@font-face {"));
        let twice = embed_face(&once, "Mono", b"x", "font/ttf", "400", "normal");
        assert_eq!(twice.matches("font-family: \"Mono\"").count(), 2);
    }

    #[test]
    fn family_quotes_are_escaped() {
        let rule = font_face_rule("A \"B\"", b"", "font/otf", "400", "normal");
        assert!(rule.contains(r#"font-family: "A \"B\"";"#));
        assert!(rule.contains(r#"format("opentype")"#));
    }
}
