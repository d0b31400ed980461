use indexmap::IndexMap;

/// Fallback values embedded in the template's metadata container.
///
/// The container holds one `KEY=VALUE` pair per line. Blank lines, `#` comment lines and any line
/// without `=` (typically a header such as `LABEL DEFAULTS`) are ignored. Keys are upper-cased;
/// values keep interior whitespace but are trimmed at both ends. A repeated key keeps the last
/// value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateDefaults {
    values: IndexMap<String, String>,
}

impl TemplateDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Self {
        let mut values = IndexMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            values.insert(key.to_ascii_uppercase(), value.trim().to_string());
        }
        Self { values }
    }

    /// Looks up `key` after upper-casing it.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(&key.to_ascii_uppercase())
            .map(String::as_str)
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_ascii_uppercase(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for TemplateDefaults {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut out = Self::default();
        for (k, v) in iter {
            out.insert(k.as_ref(), v);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_header_comments_and_blank_lines() {
        let d = TemplateDefaults::parse(
            "LABEL DEFAULTS\n\n# generated\ncatalog = NX000\nGENRE=HARD GROOVE \n=orphan\n",
        );
        assert_eq!(d.len(), 2);
        assert_eq!(d.get("CATALOG"), Some("NX000"));
        assert_eq!(d.get("genre"), Some("HARD GROOVE"));
    }

    #[test]
    fn parse_keeps_equals_signs_inside_values() {
        let d = TemplateDefaults::parse("SERIAL=A=B");
        assert_eq!(d.get("SERIAL"), Some("A=B"));
    }

    #[test]
    fn later_keys_override_earlier_ones() {
        let d = TemplateDefaults::parse("SPEED=45\nSPEED=33");
        assert_eq!(d.get("SPEED"), Some("33"));
        assert_eq!(d.len(), 1);
    }
}
