//! `{path|fallback}` placeholder strings used by field and style bindings.

use crate::resolve::Resolver;
use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

fn re_field_path() -> &'static Regex {
    static ONCE: OnceLock<Regex> = OnceLock::new();
    ONCE.get_or_init(|| Regex::new(r"^[a-z0-9_]+(?:\.[a-z0-9_]+)*$").unwrap())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field { path: String, fallback: String },
}

/// A parsed value template.
///
/// Placeholders are `{path}` or `{path|fallback}`; `{{` and `}}` produce literal braces. Paths are
/// dotted, case-insensitive field names (`catalog`, `coords.lat`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ValueTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl ValueTemplate {
    pub fn parse(source: &str) -> Result<Self> {
        let invalid = |message: &str| Error::InvalidValueTemplate {
            template: source.to_string(),
            message: message.to_string(),
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(invalid("unmatched '}'")),
                '{' => {
                    let mut body = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        body.push(c);
                    }
                    if !closed {
                        return Err(invalid("unclosed '{'"));
                    }
                    let (path, fallback) = match body.split_once('|') {
                        Some((p, f)) => (p, f),
                        None => (body.as_str(), ""),
                    };
                    let path = path.trim().to_ascii_lowercase();
                    if path.is_empty() {
                        return Err(invalid("empty placeholder"));
                    }
                    if !re_field_path().is_match(&path) {
                        return Err(invalid(&format!("invalid field path {path:?}")));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field {
                        path,
                        fallback: fallback.to_string(),
                    });
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// A template consisting of a single placeholder.
    pub fn field(path: &str, fallback: &str) -> Self {
        Self {
            source: if fallback.is_empty() {
                format!("{{{path}}}")
            } else {
                format!("{{{path}|{fallback}}}")
            },
            segments: vec![Segment::Field {
                path: path.to_ascii_lowercase(),
                fallback: fallback.to_string(),
            }],
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Field paths referenced by this template, in order of appearance.
    pub fn field_paths(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Field { path, .. } => Some(path.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn render(&self, resolver: &Resolver<'_>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Field { path, fallback } => {
                    out.push_str(&resolver.resolve_path(path, fallback))
                }
            }
        }
        out
    }
}

impl TryFrom<String> for ValueTemplate {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ValueTemplate> for String {
    fn from(value: ValueTemplate) -> Self {
        value.source
    }
}

impl std::fmt::Display for ValueTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for ValueTemplate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
