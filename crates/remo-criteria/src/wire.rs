//! Send-time validation and wire-form serialization
//!
//! Turns a [`Criteria`] into the JSON mapping handed to the remote
//! dispatcher. This is where the lazily detected malformed-criteria
//! cases surface: unknown relation paths, `IN` with a non-list value,
//! and references to unsaved objects.

use crate::criteria::{Criteria, Operator};
use crate::error::CriteriaError;
use crate::field_spec::ROOT_PATH;
use remo_value::SchemaRegistry;
use serde_json::{json, Map, Value};

/// Validate `criteria` against the root type's declared relations and
/// produce the wire mapping.
///
/// Wanted-path validation is skipped when the root type is not in the
/// registry (dynamically named semantic types cannot be checked
/// client-side).
///
/// # Errors
/// Returns [`CriteriaError`] for any structurally invalid combination.
pub fn to_params(
    criteria: &Criteria,
    root_type: &str,
    registry: &SchemaRegistry,
) -> Result<Value, CriteriaError> {
    if registry.contains(root_type) {
        for path in criteria.wanted().paths() {
            if path != ROOT_PATH && registry.resolve_path(root_type, path).is_none() {
                return Err(CriteriaError::UnknownRelationPath {
                    root: root_type.to_string(),
                    path: path.to_string(),
                });
            }
        }
    }

    let mut filters = Map::new();
    for (column, filter) in criteria.filters() {
        let value = filter.value.to_wire(column)?;
        let entry = match filter.operator {
            None => value,
            Some(op) => {
                if op == Operator::In && !value.is_array() {
                    return Err(CriteriaError::InRequiresList {
                        column: column.clone(),
                    });
                }
                json!([op.symbol(), value])
            }
        };
        filters.insert(column.clone(), entry);
    }

    let mut wanted = Map::new();
    for (path, fields) in criteria.wanted().wanted() {
        wanted.insert(path.clone(), json!(fields));
    }

    let mut params = Map::new();
    params.insert("filters".to_string(), Value::Object(filters));
    params.insert("wanted".to_string(), Value::Object(wanted));
    params.insert("order_by".to_string(), json!(criteria.order_by()));
    if let Some(limit) = criteria.limit() {
        params.insert("limit".to_string(), json!(limit));
    }
    if let Some(offset) = criteria.offset() {
        params.insert("offset".to_string(), json!(offset));
    }
    Ok(Value::Object(params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::Criteria;
    use pretty_assertions::assert_eq;
    use remo_value::{SemanticKind, TypeSchema, TypedObject};

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new()
            .with_type(
                "AnalysisChain",
                TypeSchema::new()
                    .with_field("name", SemanticKind::String)
                    .with_field("nodes", SemanticKind::List("AnalysisNode".to_string())),
            )
            .with_type(
                "AnalysisNode",
                TypeSchema::new()
                    .with_field("module", SemanticKind::Ref("Module".to_string())),
            )
            .with_type(
                "Module",
                TypeSchema::new().with_field("name", SemanticKind::String),
            )
    }

    #[test]
    fn plain_filter_serializes_bare() {
        let mut c = Criteria::new();
        c.add_filter("name", "chain1");
        let params = to_params(&c, "AnalysisChain", &registry()).unwrap();
        assert_eq!(params["filters"]["name"], json!("chain1"));
    }

    #[test]
    fn operator_filter_serializes_as_pair() {
        let mut c = Criteria::new();
        c.add_filter_op("id", Operator::Gt, 100i64);
        let params = to_params(&c, "AnalysisChain", &registry()).unwrap();
        assert_eq!(params["filters"]["id"], json!([">", 100]));
    }

    #[test]
    fn in_filter_requires_list() {
        let mut c = Criteria::new();
        c.add_filter_op("name", Operator::In, "not-a-list");
        let err = to_params(&c, "AnalysisChain", &registry()).unwrap_err();
        assert!(matches!(err, CriteriaError::InRequiresList { .. }));
    }

    #[test]
    fn in_filter_accepts_list() {
        let mut c = Criteria::new();
        c.add_filter_op("name", Operator::In, vec!["a", "b"]);
        let params = to_params(&c, "AnalysisChain", &registry()).unwrap();
        assert_eq!(params["filters"]["name"], json!(["IN", ["a", "b"]]));
    }

    #[test]
    fn reference_normalizes_to_id() {
        let module = TypedObject::materialized("Module", 42);
        let mut c = Criteria::new();
        c.add_filter("module", &module);
        let params = to_params(&c, "AnalysisNode", &registry()).unwrap();
        assert_eq!(params["filters"]["module"], json!(42));
    }

    #[test]
    fn unsaved_reference_is_malformed() {
        let fresh = TypedObject::new_local("Module");
        let mut c = Criteria::new();
        c.add_filter("module", &fresh);
        let err = to_params(&c, "AnalysisNode", &registry()).unwrap_err();
        assert!(matches!(err, CriteriaError::UnsavedReference { .. }));
    }

    #[test]
    fn unknown_wanted_path_is_malformed() {
        let mut c = Criteria::new();
        c.add_wanted_field("bogus.path", "name");
        let err = to_params(&c, "AnalysisChain", &registry()).unwrap_err();
        assert!(matches!(err, CriteriaError::UnknownRelationPath { .. }));
    }

    #[test]
    fn known_wanted_paths_pass() {
        let mut c = Criteria::new();
        c.add_wanted_field(".", "name");
        c.add_wanted_field("nodes.module", "name");
        let params = to_params(&c, "AnalysisChain", &registry()).unwrap();
        assert_eq!(params["wanted"]["."], json!(["name"]));
        assert_eq!(params["wanted"]["nodes.module"], json!(["name"]));
    }

    #[test]
    fn unregistered_root_skips_path_validation() {
        let mut c = Criteria::new();
        c.add_wanted_field("anything.goes", "x");
        assert!(to_params(&c, "CustomAttr", &registry()).is_ok());
    }

    #[test]
    fn limit_offset_only_when_set() {
        let c = Criteria::new();
        let params = to_params(&c, "Module", &registry()).unwrap();
        assert!(params.get("limit").is_none());
        assert!(params.get("offset").is_none());

        let mut c = Criteria::new();
        c.set_limit(5);
        c.set_offset(10);
        let params = to_params(&c, "Module", &registry()).unwrap();
        assert_eq!(params["limit"], json!(5));
        assert_eq!(params["offset"], json!(10));
    }

    #[test]
    fn order_by_serializes_in_order() {
        let mut c = Criteria::new();
        c.add_order_by("name");
        c.add_order_by("id");
        let params = to_params(&c, "Module", &registry()).unwrap();
        assert_eq!(params["order_by"], json!(["name", "id"]));
    }
}
