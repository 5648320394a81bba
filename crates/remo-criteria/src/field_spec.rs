//! Wanted-field specification per relation path
//!
//! Maps a relation path (`"."` for the root type, `"nodes.module"` for a
//! chain of relations) to the ordered list of field names the caller
//! wants populated on returned objects. Insertion order is preserved;
//! merging a sub-spec under a base path prefix-normalizes its paths.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Relation path of the root type itself
pub const ROOT_PATH: &str = ".";

/// Collapse redundant separators in a single path; empty becomes `"."`.
fn canonical(path: &str) -> String {
    let joined = path
        .split('.')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(".");
    if joined.is_empty() {
        ROOT_PATH.to_string()
    } else {
        joined
    }
}

/// Join a base relation path with a sub-spec path.
///
/// A sub-path of `"."` maps to the base; a base of `"."` maps to the
/// sub-path; otherwise the two are joined with `"."`. Redundant leading
/// or trailing separators collapse.
#[must_use]
pub fn normalize(base: &str, sub: &str) -> String {
    let base = canonical(base);
    let sub = canonical(sub);
    match (base.as_str(), sub.as_str()) {
        (ROOT_PATH, ROOT_PATH) => ROOT_PATH.to_string(),
        (ROOT_PATH, _) => sub,
        (_, ROOT_PATH) => base,
        _ => format!("{base}.{sub}"),
    }
}

/// Which fields the server should populate, per relation path
///
/// Purely declarative; the paths are checked against the type graph at
/// send time, not at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    wanted: IndexMap<String, Vec<String>>,
}

impl FieldSpec {
    /// Create empty spec
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request one field on the given relation path.
    ///
    /// Appends to the path's list, creating it if absent. Duplicate
    /// requests are preserved as-is (append, no dedup).
    pub fn add_wanted_field(&mut self, path: impl AsRef<str>, field: impl Into<String>) {
        self.wanted
            .entry(canonical(path.as_ref()))
            .or_default()
            .push(field.into());
    }

    /// Merge a sub-spec under a base relation path.
    ///
    /// For every `(path, field)` in `sub`, the merged spec gains
    /// `(normalize(base, path), field)`. Existing entries are kept;
    /// duplicates introduced by the merge are preserved.
    pub fn add_wanted_fields(&mut self, base: &str, sub: &FieldSpec) {
        for (path, fields) in &sub.wanted {
            let merged = normalize(base, path);
            for field in fields {
                self.add_wanted_field(&merged, field.clone());
            }
        }
    }

    /// All wanted entries in insertion order
    #[inline]
    #[must_use]
    pub fn wanted(&self) -> &IndexMap<String, Vec<String>> {
        &self.wanted
    }

    /// Fields wanted for one relation path (empty slice if none)
    #[must_use]
    pub fn wanted_for(&self, path: &str) -> &[String] {
        self.wanted
            .get(&canonical(path))
            .map_or(&[], Vec::as_slice)
    }

    /// Iterate relation paths in insertion order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.wanted.keys().map(String::as_str)
    }

    /// Whether nothing was requested
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wanted.is_empty()
    }
}
