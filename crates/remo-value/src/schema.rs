//! Schema metadata for remote domain types
//!
//! The schema is data, not code: one [`TypeSchema`] per domain type maps
//! field names to semantic kinds, and a [`SchemaRegistry`] resolves type
//! names to schemas. The registry is populated once at configuration time;
//! nothing here does I/O.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Semantic kind of one field on a remote type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SemanticKind {
    /// 32-bit integer
    Int,
    /// 64-bit integer
    Long,
    /// 32-bit float
    Float,
    /// 64-bit float
    Double,
    /// Boolean
    Boolean,
    /// UTF-8 string
    String,
    /// Has-one reference to another domain type
    Ref(String),
    /// Has-many list of another domain type
    List(String),
}

impl SemanticKind {
    /// Whether this field is a relation (has-one or has-many)
    #[inline]
    #[must_use]
    pub fn is_relation(&self) -> bool {
        matches!(self, Self::Ref(_) | Self::List(_))
    }

    /// Target type name for relation kinds
    #[inline]
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Ref(t) | Self::List(t) => Some(t),
            _ => None,
        }
    }
}

/// Field layout of one remote domain type
///
/// Field order is preserved (insertion order) but carries no semantic
/// weight; lookup is by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeSchema {
    fields: IndexMap<String, SemanticKind>,
}

impl TypeSchema {
    /// Create empty schema
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field (builder style)
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, kind: SemanticKind) -> Self {
        self.fields.insert(name.into(), kind);
        self
    }

    /// Look up a field's semantic kind
    #[inline]
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&SemanticKind> {
        self.fields.get(name)
    }

    /// Iterate all fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &SemanticKind)> {
        self.fields.iter().map(|(n, k)| (n.as_str(), k))
    }

    /// Iterate relation fields only
    pub fn relations(&self) -> impl Iterator<Item = (&str, &SemanticKind)> {
        self.fields().filter(|(_, k)| k.is_relation())
    }
}

/// Registry of type name → schema
///
/// Resolved at configuration time; replaces runtime reflection with a
/// data lookup. Unregistered type names are handled by callers (the
/// instantiation engine falls back to shape inference for them).
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    types: IndexMap<String, TypeSchema>,
}

impl SchemaRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type schema
    pub fn register(&mut self, name: impl Into<String>, schema: TypeSchema) {
        self.types.insert(name.into(), schema);
    }

    /// Register a type schema (builder style)
    #[must_use]
    pub fn with_type(mut self, name: impl Into<String>, schema: TypeSchema) -> Self {
        self.register(name, schema);
        self
    }

    /// Look up a type schema
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeSchema> {
        self.types.get(name)
    }

    /// Check if a type is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Number of registered types
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Resolve a dotted relation path from a root type.
    ///
    /// `"."` resolves to the root type itself. Each segment must be a
    /// declared relation on the type reached so far. Returns the terminal
    /// target type name, or `None` if any segment fails to resolve.
    #[must_use]
    pub fn resolve_path<'a>(&'a self, root: &'a str, path: &str) -> Option<&'a str> {
        let mut current = root;
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            let schema = self.get(current)?;
            current = schema.field(segment)?.target()?;
        }
        Some(current)
    }
}
