//! Shared typed-object handles
//!
//! A [`TypedObject`] is a cheap-to-clone handle (`Rc<RefCell<_>>`) over an
//! ordered field map. Cyclic object graphs are represented by genuinely
//! shared handles, so `a.get_object("b")?.get_object("a")?` yields the
//! same handle as `a`. The subsystem is single-threaded call/response by
//! design, which is why the handle is `Rc` rather than `Arc`.

use crate::error::ValueError;
use indexmap::IndexMap;
use serde_json::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Unique identity of a persisted remote record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteId {
    /// Domain type name
    pub type_name: String,
    /// Server-assigned integer identity
    pub id: i64,
}

impl RemoteId {
    /// Create new remote identity
    #[inline]
    #[must_use]
    pub fn new(type_name: impl Into<String>, id: i64) -> Self {
        Self {
            type_name: type_name.into(),
            id,
        }
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.type_name, self.id)
    }
}

/// One stored field slot
///
/// A key that is *absent* from the field map means the field was never
/// fetched; [`FieldValue::Null`] means the server returned an explicit
/// null. The two must never be conflated.
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// Fetched and null at the server
    Null,
    /// Scalar wire value (boolean, number, or string)
    Scalar(Value),
    /// Has-one reference
    Object(TypedObject),
    /// Has-many list
    Objects(Vec<TypedObject>),
}

impl FieldValue {
    fn describe(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Scalar(Value::Bool(_)) => "boolean".to_string(),
            Self::Scalar(Value::Number(_)) => "number".to_string(),
            Self::Scalar(Value::String(_)) => "string".to_string(),
            Self::Scalar(other) => format!("scalar {other}"),
            Self::Object(o) => format!("object {}", o.type_name()),
            Self::Objects(_) => "object list".to_string(),
        }
    }
}

#[derive(Debug)]
struct Inner {
    type_name: String,
    id: Option<i64>,
    is_new: bool,
    is_dirty: bool,
    fields: IndexMap<String, FieldValue>,
}

/// Shared handle to a typed remote object
///
/// Cloning the handle does not clone the object; both handles observe the
/// same state. Identity comparison is [`TypedObject::same_identity`].
#[derive(Clone)]
pub struct TypedObject(Rc<RefCell<Inner>>);

impl TypedObject {
    /// Create a fresh local object for later creation on the server.
    ///
    /// Starts `new`, with no server identity and no fields.
    #[must_use]
    pub fn new_local(type_name: impl Into<String>) -> Self {
        Self(Rc::new(RefCell::new(Inner {
            type_name: type_name.into(),
            id: None,
            is_new: true,
            is_dirty: false,
            fields: IndexMap::new(),
        })))
    }

    /// Create an object materialized from a server response.
    ///
    /// Starts non-new, non-dirty, with its server identity. Used by the
    /// instantiation engine; application code should not need this.
    #[must_use]
    pub fn materialized(type_name: impl Into<String>, id: i64) -> Self {
        Self(Rc::new(RefCell::new(Inner {
            type_name: type_name.into(),
            id: Some(id),
            is_new: false,
            is_dirty: false,
            fields: IndexMap::new(),
        })))
    }

    /// Domain type name
    #[must_use]
    pub fn type_name(&self) -> String {
        self.0.borrow().type_name.clone()
    }

    /// Server-assigned identity, if persisted
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.0.borrow().id
    }

    /// Remote identity, or [`ValueError::NotPersisted`]
    pub fn remote_id(&self) -> Result<RemoteId, ValueError> {
        let inner = self.0.borrow();
        match inner.id {
            Some(id) => Ok(RemoteId::new(inner.type_name.clone(), id)),
            None => Err(ValueError::NotPersisted {
                type_name: inner.type_name.clone(),
            }),
        }
    }

    /// Whether the object was constructed locally and not yet saved
    #[inline]
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.0.borrow().is_new
    }

    /// Whether the object was modified since load
    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.0.borrow().is_dirty
    }

    /// Whether two handles refer to the same underlying object
    #[inline]
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Opaque per-handle key, stable for the handle's lifetime.
    ///
    /// Used by graph walks that need a hashable visit key independent of
    /// server identity (new objects have none yet).
    #[inline]
    #[must_use]
    pub fn identity_key(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    /// Whether the field was fetched (present, possibly null)
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.0.borrow().fields.contains_key(name)
    }

    /// Raw field slot, or [`ValueError::FieldNotFetched`]
    pub fn get_field(&self, name: &str) -> Result<FieldValue, ValueError> {
        let inner = self.0.borrow();
        inner
            .fields
            .get(name)
            .cloned()
            .ok_or_else(|| ValueError::FieldNotFetched {
                type_name: inner.type_name.clone(),
                field: name.to_string(),
            })
    }

    /// Snapshot of all fetched fields in insertion order
    #[must_use]
    pub fn fields_snapshot(&self) -> Vec<(String, FieldValue)> {
        self.0
            .borrow()
            .fields
            .iter()
            .map(|(n, v)| (n.clone(), v.clone()))
            .collect()
    }

    /// Store a field without touching the dirty flag.
    ///
    /// Used by the instantiation engine while materializing a response.
    pub fn load_field(&self, name: impl Into<String>, value: FieldValue) {
        self.0.borrow_mut().fields.insert(name.into(), value);
    }

    fn set_field(&self, name: impl Into<String>, value: FieldValue) {
        let mut inner = self.0.borrow_mut();
        inner.fields.insert(name.into(), value);
        inner.is_dirty = true;
    }

    fn mismatch(&self, field: &str, expected: &'static str, value: &FieldValue) -> ValueError {
        ValueError::TypeMismatch {
            type_name: self.type_name(),
            field: field.to_string(),
            expected,
            actual: value.describe(),
        }
    }

    // ---- typed getters ------------------------------------------------

    /// Read a 32-bit integer field
    pub fn get_i32(&self, name: &str) -> Result<Option<i32>, ValueError> {
        match self.get_i64(name)? {
            None => Ok(None),
            Some(v) => i32::try_from(v).map(Some).map_err(|_| ValueError::TypeMismatch {
                type_name: self.type_name(),
                field: name.to_string(),
                expected: "i32",
                actual: format!("out-of-range number {v}"),
            }),
        }
    }

    /// Read a 64-bit integer field
    pub fn get_i64(&self, name: &str) -> Result<Option<i64>, ValueError> {
        match self.get_field(name)? {
            FieldValue::Null => Ok(None),
            FieldValue::Scalar(Value::Number(n)) if n.as_i64().is_some() => Ok(n.as_i64()),
            other => Err(self.mismatch(name, "integer", &other)),
        }
    }

    /// Read a 32-bit float field (accepts any numeric representation)
    #[allow(clippy::cast_possible_truncation)]
    pub fn get_f32(&self, name: &str) -> Result<Option<f32>, ValueError> {
        Ok(self.get_f64(name)?.map(|v| v as f32))
    }

    /// Read a 64-bit float field (integers widen)
    pub fn get_f64(&self, name: &str) -> Result<Option<f64>, ValueError> {
        match self.get_field(name)? {
            FieldValue::Null => Ok(None),
            FieldValue::Scalar(Value::Number(n)) if n.as_f64().is_some() => Ok(n.as_f64()),
            other => Err(self.mismatch(name, "float", &other)),
        }
    }

    /// Read a boolean field
    pub fn get_bool(&self, name: &str) -> Result<Option<bool>, ValueError> {
        match self.get_field(name)? {
            FieldValue::Null => Ok(None),
            FieldValue::Scalar(Value::Bool(b)) => Ok(Some(b)),
            other => Err(self.mismatch(name, "boolean", &other)),
        }
    }

    /// Read a string field
    pub fn get_string(&self, name: &str) -> Result<Option<String>, ValueError> {
        match self.get_field(name)? {
            FieldValue::Null => Ok(None),
            FieldValue::Scalar(Value::String(s)) => Ok(Some(s)),
            other => Err(self.mismatch(name, "string", &other)),
        }
    }

    /// Read a has-one reference field
    pub fn get_object(&self, name: &str) -> Result<Option<TypedObject>, ValueError> {
        match self.get_field(name)? {
            FieldValue::Null => Ok(None),
            FieldValue::Object(o) => Ok(Some(o)),
            other => Err(self.mismatch(name, "object", &other)),
        }
    }

    /// Read a has-many list field
    pub fn get_objects(&self, name: &str) -> Result<Option<Vec<TypedObject>>, ValueError> {
        match self.get_field(name)? {
            FieldValue::Null => Ok(None),
            FieldValue::Objects(list) => Ok(Some(list)),
            other => Err(self.mismatch(name, "object list", &other)),
        }
    }

    // ---- typed setters (mark dirty) -----------------------------------

    /// Write a 32-bit integer field
    pub fn set_i32(&self, name: impl Into<String>, value: i32) {
        self.set_field(name, FieldValue::Scalar(Value::from(value)));
    }

    /// Write a 64-bit integer field
    pub fn set_i64(&self, name: impl Into<String>, value: i64) {
        self.set_field(name, FieldValue::Scalar(Value::from(value)));
    }

    /// Write a 64-bit float field
    pub fn set_f64(&self, name: impl Into<String>, value: f64) {
        self.set_field(name, FieldValue::Scalar(Value::from(value)));
    }

    /// Write a boolean field
    pub fn set_bool(&self, name: impl Into<String>, value: bool) {
        self.set_field(name, FieldValue::Scalar(Value::from(value)));
    }

    /// Write a string field
    pub fn set_string(&self, name: impl Into<String>, value: impl Into<String>) {
        self.set_field(name, FieldValue::Scalar(Value::from(value.into())));
    }

    /// Write an explicit null
    pub fn set_null(&self, name: impl Into<String>) {
        self.set_field(name, FieldValue::Null);
    }

    /// Write a has-one reference
    pub fn set_object(&self, name: impl Into<String>, value: &TypedObject) {
        self.set_field(name, FieldValue::Object(value.clone()));
    }

    /// Write a has-many list
    pub fn set_objects(&self, name: impl Into<String>, value: Vec<TypedObject>) {
        self.set_field(name, FieldValue::Objects(value));
    }

    // ---- lifecycle (save path) ----------------------------------------

    /// Record a freshly assigned server identity.
    ///
    /// Flips the object to persisted and clean. Called by the save path
    /// after every temporary token resolved.
    pub fn assign_persisted(&self, id: i64) {
        let mut inner = self.0.borrow_mut();
        inner.id = Some(id);
        inner.is_new = false;
        inner.is_dirty = false;
    }

    /// Clear the dirty flag after a successful update
    pub fn mark_clean(&self) {
        self.0.borrow_mut().is_dirty = false;
    }
}

// Shallow on purpose: object graphs may be cyclic and a derived Debug
// would recurse forever.
impl fmt::Debug for TypedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.borrow();
        f.debug_struct("TypedObject")
            .field("type_name", &inner.type_name)
            .field("id", &inner.id)
            .field("is_new", &inner.is_new)
            .field("is_dirty", &inner.is_dirty)
            .field("fields", &inner.fields.len())
            .finish()
    }
}

impl fmt::Display for TypedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.borrow();
        match inner.id {
            Some(id) => write!(f, "{}:{}", inner.type_name, id),
            None => write!(f, "{}:<new>", inner.type_name),
        }
    }
}
