//! Criteria validation errors
//!
//! A malformed criteria is a caller bug, reported at the point of use
//! (send time) and never retried.

/// Structurally invalid criteria, detected at send time
#[derive(Debug, thiserror::Error)]
pub enum CriteriaError {
    /// `IN` operator used with a non-list value
    #[error("IN filter on column {column} requires a finite list value")]
    InRequiresList {
        /// Filtered column
        column: String,
    },

    /// Object-valued filter referencing an object with no server identity
    #[error("filter on column {column} references an unsaved {type_name} object")]
    UnsavedReference {
        /// Filtered column
        column: String,
        /// Type of the unsaved object
        type_name: String,
    },

    /// Wanted path does not resolve through declared relations
    #[error("unknown relation path {path:?} for root type {root}")]
    UnknownRelationPath {
        /// Root type the criteria targets
        root: String,
        /// Path that failed to resolve
        path: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_column() {
        let err = CriteriaError::InRequiresList {
            column: "granularity".to_string(),
        };
        assert!(err.to_string().contains("granularity"));
    }
}
