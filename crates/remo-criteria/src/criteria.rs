//! Criteria: filters, ordering, and paging on top of a field spec
//!
//! Builder-style accumulation; never blocks, never fails at construction.
//! Structurally invalid combinations (an `IN` filter on a non-list, a
//! reference to an unsaved object, an unknown relation path) are detected
//! lazily by [`crate::wire::to_params`].

use crate::error::CriteriaError;
use crate::field_spec::FieldSpec;
use indexmap::IndexMap;
use remo_value::TypedObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operator for a filter predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    /// Equal
    Eq,
    /// Not equal
    Ne,
    /// Less than
    Lt,
    /// Less than or equal
    Le,
    /// Greater than
    Gt,
    /// Greater than or equal
    Ge,
    /// SQL LIKE pattern
    Like,
    /// Case-insensitive LIKE
    Ilike,
    /// Membership in a finite list
    In,
}

impl Operator {
    /// Wire symbol for this operator
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Like => "LIKE",
            Self::Ilike => "ILIKE",
            Self::In => "IN",
        }
    }
}

/// Value side of a filter predicate
///
/// Either a JSON literal (scalar or list) or a reference to a typed
/// object. References are normalized to the object's server identity at
/// send time; the captured `id` is `None` for unsaved objects, which is
/// a send-time error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterValue {
    /// JSON literal (scalar, or a list for `IN`)
    Literal(Value),
    /// Identity of a referenced typed object
    Reference {
        /// Type of the referenced object
        type_name: String,
        /// Server identity, if the object is persisted
        id: Option<i64>,
    },
}

impl FilterValue {
    /// Wire representation: literals pass through, references collapse to
    /// their server ID.
    pub(crate) fn to_wire(&self, column: &str) -> Result<Value, CriteriaError> {
        match self {
            Self::Literal(v) => Ok(v.clone()),
            Self::Reference { type_name, id } => match id {
                Some(id) => Ok(Value::from(*id)),
                None => Err(CriteriaError::UnsavedReference {
                    column: column.to_string(),
                    type_name: type_name.clone(),
                }),
            },
        }
    }
}

impl From<Value> for FilterValue {
    fn from(v: Value) -> Self {
        Self::Literal(v)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Literal(Value::from(v))
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        Self::Literal(Value::from(v))
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Literal(Value::from(v))
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::Literal(Value::from(v))
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::Literal(Value::from(v))
    }
}

impl<T: Into<Value>> From<Vec<T>> for FilterValue {
    fn from(v: Vec<T>) -> Self {
        Self::Literal(Value::Array(v.into_iter().map(Into::into).collect()))
    }
}

impl From<&TypedObject> for FilterValue {
    fn from(obj: &TypedObject) -> Self {
        Self::Reference {
            type_name: obj.type_name(),
            id: obj.id(),
        }
    }
}

/// One filter predicate: optional operator plus value
///
/// `operator: None` means plain equality by convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Comparison operator, if one was given
    pub operator: Option<Operator>,
    /// Value side of the predicate
    pub value: FilterValue,
}

/// Declarative request descriptor for one retrieval
///
/// Extends [`FieldSpec`] with filter predicates, ordering, and paging.
/// Owned exclusively by the caller that builds it; carries no execution
/// state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    wanted: FieldSpec,
    filters: IndexMap<String, Filter>,
    order_by: Vec<String>,
    limit: Option<u32>,
    offset: Option<u32>,
}

impl Criteria {
    /// Create empty criteria
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request one field on the given relation path
    pub fn add_wanted_field(&mut self, path: impl AsRef<str>, field: impl Into<String>) {
        self.wanted.add_wanted_field(path, field);
    }

    /// Merge a sub-spec under a base relation path
    pub fn add_wanted_fields(&mut self, base: &str, sub: &FieldSpec) {
        self.wanted.add_wanted_fields(base, sub);
    }

    /// Add an equality filter on a column.
    ///
    /// Overwrites any prior filter for the same column (last write wins).
    pub fn add_filter(&mut self, column: impl Into<String>, value: impl Into<FilterValue>) {
        self.filters.insert(
            column.into(),
            Filter {
                operator: None,
                value: value.into(),
            },
        );
    }

    /// Add a filter with an explicit operator.
    ///
    /// Overwrites any prior filter for the same column (last write wins).
    pub fn add_filter_op(
        &mut self,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<FilterValue>,
    ) {
        self.filters.insert(
            column.into(),
            Filter {
                operator: Some(operator),
                value: value.into(),
            },
        );
    }

    /// Append an ordering column
    pub fn add_order_by(&mut self, column: impl Into<String>) {
        self.order_by.push(column.into());
    }

    /// Set the row limit (overwrites any prior limit)
    pub fn set_limit(&mut self, limit: u32) {
        self.limit = Some(limit);
    }

    /// Set the row offset (overwrites any prior offset)
    pub fn set_offset(&mut self, offset: u32) {
        self.offset = Some(offset);
    }

    /// The wanted-field spec
    #[inline]
    #[must_use]
    pub fn wanted(&self) -> &FieldSpec {
        &self.wanted
    }

    /// All filters in insertion order
    #[inline]
    #[must_use]
    pub fn filters(&self) -> &IndexMap<String, Filter> {
        &self.filters
    }

    /// Ordering columns
    #[inline]
    #[must_use]
    pub fn order_by(&self) -> &[String] {
        &self.order_by
    }

    /// Row limit, if set
    #[inline]
    #[must_use]
    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    /// Row offset, if set
    #[inline]
    #[must_use]
    pub fn offset(&self) -> Option<u32> {
        self.offset
    }
}
