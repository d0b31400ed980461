//! Source-value resolution.
//!
//! Every field a label needs is looked up against three sources, strictly in order:
//! 1. the release record, under the lower-case key;
//! 2. the template defaults, under the upper-case key;
//! 3. the caller's fallback.
//!
//! Resolution never fails. A miss is not an error; it simply yields the fallback.

use crate::defaults::TemplateDefaults;
use crate::record::{ReleaseRecord, is_falsy, scalar_to_string};
use serde_json::Value;

#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    record: &'a ReleaseRecord,
    defaults: &'a TemplateDefaults,
}

impl<'a> Resolver<'a> {
    pub fn new(record: &'a ReleaseRecord, defaults: &'a TemplateDefaults) -> Self {
        Self { record, defaults }
    }

    pub fn record(&self) -> &'a ReleaseRecord {
        self.record
    }

    pub fn defaults(&self) -> &'a TemplateDefaults {
        self.defaults
    }

    /// Resolves a top-level scalar field.
    ///
    /// A record value counts as present when it is a non-null scalar, even when it is an empty
    /// string. Containers under a scalar key are ignored.
    pub fn resolve(&self, key: &str, fallback: &str) -> String {
        if let Some(v) = self.record.get(key).and_then(scalar_to_string) {
            return v;
        }
        if let Some(v) = self.defaults.get(key) {
            tracing::debug!(key, "field resolved from template defaults");
            return v.to_string();
        }
        tracing::debug!(key, fallback, "field resolved to fallback");
        fallback.to_string()
    }

    /// Resolves a scalar nested one level below `parent` (`coords.lat`, `colors.bg`).
    ///
    /// Unlike top-level fields, a falsy record value (empty string, `0`, `false`) falls through to
    /// the template defaults, which are consulted under `PARENT_CHILD`.
    pub fn resolve_nested(&self, parent: &str, child: &str, fallback: &str) -> String {
        let from_record = self
            .record
            .get(parent)
            .and_then(Value::as_object)
            .and_then(|m| m.get(&child.to_ascii_lowercase()))
            .filter(|v| !is_falsy(v))
            .and_then(scalar_to_string);
        if let Some(v) = from_record {
            return v;
        }
        let defaults_key = format!("{parent}_{child}");
        if let Some(v) = self.defaults.get(&defaults_key) {
            tracing::debug!(parent, child, "nested field resolved from template defaults");
            return v.to_string();
        }
        fallback.to_string()
    }

    /// Resolves a dotted field path, dispatching to [`Self::resolve`] or [`Self::resolve_nested`].
    ///
    /// Paths deeper than two segments follow the nested rules, with the defaults key formed by
    /// joining every segment with `_`.
    pub fn resolve_path(&self, path: &str, fallback: &str) -> String {
        let Some((parent, child)) = path.split_once('.') else {
            return self.resolve(path, fallback);
        };
        if !child.contains('.') {
            return self.resolve_nested(parent, child, fallback);
        }

        let from_record = self
            .record
            .get_path(path)
            .filter(|v| !is_falsy(v))
            .and_then(scalar_to_string);
        if let Some(v) = from_record {
            return v;
        }
        let defaults_key = path.replace('.', "_");
        match self.defaults.get(&defaults_key) {
            Some(v) => v.to_string(),
            None => fallback.to_string(),
        }
    }

    /// Resolves a list-valued field such as one side of a track listing.
    ///
    /// Looks at `group.member` first (`tracks.a`), then at the flat alternate key `group_member`
    /// (`tracks_a`), then yields an empty list. Template defaults are never consulted: they are a
    /// flat string table and cannot hold lists.
    pub fn resolve_list(&self, group: &str, member: &str) -> Vec<String> {
        let nested = self
            .record
            .get(group)
            .and_then(Value::as_object)
            .and_then(|m| m.get(&member.to_ascii_lowercase()))
            .filter(|v| !is_falsy(v))
            .and_then(Value::as_array);
        let flat_key = format!("{group}_{member}");
        let items = nested.or_else(|| {
            self.record
                .get(&flat_key)
                .filter(|v| !is_falsy(v))
                .and_then(Value::as_array)
        });

        let Some(items) = items else {
            tracing::debug!(group, member, "list field absent; using empty list");
            return Vec::new();
        };
        items.iter().filter_map(list_item_text).collect()
    }
}

/// Display text for one list entry.
///
/// Scalars render as-is. Mappings render as `title duration` (either part may be missing; `name`
/// stands in for `title`). Nulls, nested lists and mappings without either part are skipped.
fn list_item_text(item: &Value) -> Option<String> {
    match item {
        Value::Object(map) => {
            let title = map
                .get("title")
                .or_else(|| map.get("name"))
                .and_then(scalar_to_string)
                .unwrap_or_default();
            let duration = map
                .get("duration")
                .and_then(scalar_to_string)
                .unwrap_or_default();
            let text = format!("{title} {duration}").trim().to_string();
            (!text.is_empty()).then_some(text)
        }
        other => scalar_to_string(other),
    }
}
