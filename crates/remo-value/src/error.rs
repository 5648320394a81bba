//! Error types for the typed-object runtime
//!
//! Covers typed field access failures:
//! - Access to a field the server was never asked for
//! - Coercion failures between stored and requested semantic types
//! - Identity access on objects that were never persisted

/// Errors raised by typed field access and object lifecycle operations
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    /// Field is absent from the backing map: it was never requested from
    /// the server. Distinct from a fetched-and-null field, which reads as
    /// `Ok(None)`.
    #[error("field not fetched: {type_name}.{field}")]
    FieldNotFetched {
        /// Type of the object being read
        type_name: String,
        /// Field that was never populated
        field: String,
    },

    /// Stored representation cannot be coerced to the requested semantic
    /// type.
    #[error("type mismatch on {type_name}.{field}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Type of the object being read
        type_name: String,
        /// Field being read
        field: String,
        /// Semantic type the getter asked for
        expected: &'static str,
        /// Description of the stored value
        actual: String,
    },

    /// Object has no server-assigned identity yet
    #[error("object of type {type_name} is not persisted")]
    NotPersisted {
        /// Type of the unsaved object
        type_name: String,
    },
}

impl ValueError {
    /// Check whether this error means "another round-trip is needed"
    #[inline]
    #[must_use]
    pub fn is_not_fetched(&self) -> bool {
        matches!(self, Self::FieldNotFetched { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_fetched_display() {
        let err = ValueError::FieldNotFetched {
            type_name: "Module".to_string(),
            field: "name".to_string(),
        };
        assert!(err.to_string().contains("Module.name"));
        assert!(err.is_not_fetched());
    }

    #[test]
    fn type_mismatch_is_not_not_fetched() {
        let err = ValueError::TypeMismatch {
            type_name: "Module".to_string(),
            field: "name".to_string(),
            expected: "string",
            actual: "number".to_string(),
        };
        assert!(!err.is_not_fetched());
    }
}
