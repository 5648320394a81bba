//! Untyped response → typed object graph
//!
//! One [`Instantiator`] is one instantiation pass. Its identity cache
//! (remote identity → handle) lives exactly as long as the pass:
//! long enough to resolve cycles and shared references within a single
//! response, and never across calls. Not intended for concurrent reuse;
//! a concurrent host must give each logical call its own pass.

use crate::error::ClientError;
use remo_value::{FieldValue, RemoteId, SchemaRegistry, SemanticKind, TypedObject};
use serde_json::Value;
use std::collections::HashMap;

/// Describe a wire value's shape for protocol errors
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// How one field of an incoming mapping should materialize
enum FieldKind {
    Scalar,
    Ref(String),
    List(String),
}

/// One instantiation pass over a raw server response
pub struct Instantiator<'a> {
    registry: &'a SchemaRegistry,
    seen: HashMap<RemoteId, TypedObject>,
}

impl<'a> Instantiator<'a> {
    /// Start a fresh pass with an empty identity cache
    #[must_use]
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self {
            registry,
            seen: HashMap::new(),
        }
    }

    /// Materialize a single object of `type_name` from `raw`.
    ///
    /// `raw` must be a mapping carrying an integer `id` field. Objects
    /// already materialized in this pass (same `(type, id)`) are reused,
    /// which terminates cyclic reference graphs.
    ///
    /// # Errors
    /// [`ClientError::Protocol`] on any shape mismatch.
    pub fn instantiate(
        &mut self,
        type_name: &str,
        raw: &Value,
    ) -> Result<TypedObject, ClientError> {
        let map = raw.as_object().ok_or_else(|| {
            ClientError::protocol(format!(
                "expected object for type {type_name}, got {}",
                kind_of(raw)
            ))
        })?;

        let id = match map.get("id") {
            Some(Value::Number(n)) => n.as_i64().ok_or_else(|| {
                ClientError::protocol(format!("non-integer id for type {type_name}"))
            })?,
            Some(other) => {
                return Err(ClientError::protocol(format!(
                    "id field for type {type_name} must be an integer, got {}",
                    kind_of(other)
                )))
            }
            None => {
                return Err(ClientError::protocol(format!(
                    "missing required id field for type {type_name}"
                )))
            }
        };

        let key = RemoteId::new(type_name, id);
        if let Some(existing) = self.seen.get(&key) {
            tracing::trace!(identity = %key, "reusing materialized object");
            return Ok(existing.clone());
        }

        // Register before walking children so cycles land on this handle.
        let object = TypedObject::materialized(type_name, id);
        self.seen.insert(key, object.clone());

        for (field, value) in map {
            if field == "id" {
                continue;
            }
            let slot = match self.field_kind(type_name, field, value) {
                FieldKind::Ref(target) => match value {
                    Value::Null => FieldValue::Null,
                    v => FieldValue::Object(self.instantiate(&target, v)?),
                },
                FieldKind::List(target) => match value {
                    Value::Null => FieldValue::Null,
                    Value::Array(items) => {
                        let mut out = Vec::with_capacity(items.len());
                        for item in items {
                            out.push(self.instantiate(&target, item)?);
                        }
                        FieldValue::Objects(out)
                    }
                    other => {
                        return Err(ClientError::protocol(format!(
                            "expected list for {type_name}.{field}, got {}",
                            kind_of(other)
                        )))
                    }
                },
                FieldKind::Scalar => match value {
                    Value::Null => FieldValue::Null,
                    v => FieldValue::Scalar(v.clone()),
                },
            };
            object.load_field(field.clone(), slot);
        }

        tracing::debug!(object = %object, fields = map.len(), "materialized");
        Ok(object)
    }

    /// Materialize an ordered sequence of objects of `type_name`.
    ///
    /// All elements share this pass's identity cache.
    ///
    /// # Errors
    /// [`ClientError::Protocol`] if `raw` is not list-shaped.
    pub fn instantiate_list(
        &mut self,
        type_name: &str,
        raw: &Value,
    ) -> Result<Vec<TypedObject>, ClientError> {
        let items = raw.as_array().ok_or_else(|| {
            ClientError::protocol(format!(
                "expected list of {type_name}, got {}",
                kind_of(raw)
            ))
        })?;
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(self.instantiate(type_name, item)?);
        }
        Ok(out)
    }

    /// Resolve how a field materializes: by declared schema when the
    /// type is registered, by value shape otherwise (dynamically named
    /// semantic types). Fields a registered schema does not declare are
    /// kept as scalars.
    fn field_kind(&self, type_name: &str, field: &str, value: &Value) -> FieldKind {
        if let Some(schema) = self.registry.get(type_name) {
            return match schema.field(field) {
                Some(SemanticKind::Ref(target)) => FieldKind::Ref(target.clone()),
                Some(SemanticKind::List(target)) => FieldKind::List(target.clone()),
                _ => FieldKind::Scalar,
            };
        }
        // Shape inference: a nested mapping (or list of mappings) becomes
        // a child object named after the field.
        match value {
            Value::Object(_) => FieldKind::Ref(field.to_string()),
            Value::Array(items) if items.iter().all(Value::is_object) && !items.is_empty() => {
                FieldKind::List(field.to_string())
            }
            _ => FieldKind::Scalar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remo_value::{SemanticKind, TypeSchema};
    use serde_json::json;

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
                    .with_field("module", SemanticKind::Ref("Module".to_string()))
                    .with_field("chain", SemanticKind::Ref("AnalysisChain".to_string())),
            )
            .with_type(
                "Module",
                TypeSchema::new()
                    .with_field("name", SemanticKind::String)
                    .with_field("inputs", SemanticKind::List("FormalInput".to_string())),
            )
            .with_type(
                "FormalInput",
                TypeSchema::new()
                    .with_field("name", SemanticKind::String)
                    .with_field("module", SemanticKind::Ref("Module".to_string())),
            )
    }

    #[test]
    fn instantiate_simple_object() {
        let reg = registry();
        let mut pass = Instantiator::new(&reg);
        let obj = pass
            .instantiate("Module", &json!({"id": 1, "name": "finder"}))
            .unwrap();

        assert_eq!(obj.id(), Some(1));
        assert!(!obj.is_new());
        assert!(!obj.is_dirty());
        assert_eq!(obj.get_string("name").unwrap(), Some("finder".to_string()));
    }

    #[test]
    fn non_object_is_protocol_error() {
        let reg = registry();
        let mut pass = Instantiator::new(&reg);
        let err = pass.instantiate("Module", &json!(42)).unwrap_err();
        assert!(err.is_protocol());
        assert!(err.to_string().contains("got number"));
    }

    #[test]
    fn missing_id_is_protocol_error() {
        let reg = registry();
        let mut pass = Instantiator::new(&reg);
        let err = pass
            .instantiate("Module", &json!({"name": "finder"}))
            .unwrap_err();
        assert!(err.is_protocol());
        assert!(err.to_string().contains("missing required id"));
    }

    #[test]
    fn null_id_is_protocol_error() {
        let reg = registry();
        let mut pass = Instantiator::new(&reg);
        let err = pass
            .instantiate("Module", &json!({"id": null}))
            .unwrap_err();
        assert!(err.is_protocol());
    }

    #[test]
    fn instantiate_list_on_object_is_protocol_error() {
        let reg = registry();
        let mut pass = Instantiator::new(&reg);
        let err = pass
            .instantiate_list("Module", &json!({"id": 1}))
            .unwrap_err();
        assert!(err.is_protocol());
        assert!(err.to_string().contains("expected list"));
    }

    #[test]
    fn nested_objects_materialize_recursively() {
        let reg = registry();
        let mut pass = Instantiator::new(&reg);
        let chain = pass
            .instantiate(
                "AnalysisChain",
                &json!({
                    "id": 1,
                    "name": "chain1",
                    "nodes": [
                        {"id": 10, "module": {"id": 100, "name": "finder"}},
                        {"id": 11, "module": {"id": 101, "name": "tracker"}}
                    ]
                }),
            )
            .unwrap();

        let nodes = chain.get_objects("nodes").unwrap().unwrap();
        assert_eq!(nodes.len(), 2);
        let module = nodes[0].get_object("module").unwrap().unwrap();
        assert_eq!(module.get_string("name").unwrap(), Some("finder".to_string()));
    }

    #[test]
    fn shared_reference_dedups_to_one_handle() {
        let reg = registry();
        let mut pass = Instantiator::new(&reg);
        let chain = pass
            .instantiate(
                "AnalysisChain",
                &json!({
                    "id": 1,
                    "nodes": [
                        {"id": 10, "module": {"id": 100, "name": "finder"}},
                        {"id": 11, "module": {"id": 100, "name": "finder"}}
                    ]
                }),
            )
            .unwrap();

        let nodes = chain.get_objects("nodes").unwrap().unwrap();
        let m0 = nodes[0].get_object("module").unwrap().unwrap();
        let m1 = nodes[1].get_object("module").unwrap().unwrap();
        assert!(m0.same_identity(&m1));
    }

    #[test]
    fn cyclic_reference_terminates_and_shares_identity() {
        let reg = registry();
        let mut pass = Instantiator::new(&reg);
        let module = pass
            .instantiate(
                "Module",
                &json!({
                    "id": 1,
                    "name": "finder",
                    "inputs": [
                        {"id": 2, "name": "image", "module": {"id": 1, "name": "finder"}}
                    ]
                }),
            )
            .unwrap();

        let inputs = module.get_objects("inputs").unwrap().unwrap();
        let back = inputs[0].get_object("module").unwrap().unwrap();
        assert!(back.same_identity(&module));
    }

    #[test]
    fn null_relation_reads_as_none() {
        let reg = registry();
        let mut pass = Instantiator::new(&reg);
        let node = pass
            .instantiate("AnalysisNode", &json!({"id": 1, "module": null}))
            .unwrap();
        assert!(node.get_object("module").unwrap().is_none());
    }

    #[test]
    fn unfetched_field_stays_absent() {
        let reg = registry();
        let mut pass = Instantiator::new(&reg);
        let module = pass.instantiate("Module", &json!({"id": 1})).unwrap();
        assert!(!module.has_field("name"));
        assert!(module.get_string("name").is_err());
    }

    #[test]
    fn list_relation_with_scalar_value_is_protocol_error() {
        let reg = registry();
        let mut pass = Instantiator::new(&reg);
        let err = pass
            .instantiate("AnalysisChain", &json!({"id": 1, "nodes": 5}))
            .unwrap_err();
        assert!(err.is_protocol());
    }

    #[test]
    fn dynamic_type_infers_nested_objects() {
        let reg = registry();
        let mut pass = Instantiator::new(&reg);
        let attr = pass
            .instantiate(
                "PixelStats",
                &json!({
                    "id": 7,
                    "mean": 12.5,
                    "target": {"id": 3, "label": "cell"}
                }),
            )
            .unwrap();

        assert_eq!(attr.get_f64("mean").unwrap(), Some(12.5));
        let target = attr.get_object("target").unwrap().unwrap();
        assert_eq!(target.type_name(), "target");
        assert_eq!(target.get_string("label").unwrap(), Some("cell".to_string()));
    }

    #[test]
    fn list_shares_cache_across_elements() {
        let reg = registry();
        let mut pass = Instantiator::new(&reg);
        let nodes = pass
            .instantiate_list(
                "AnalysisNode",
                &json!([
                    {"id": 10, "module": {"id": 100}},
                    {"id": 11, "module": {"id": 100}}
                ]),
            )
            .unwrap();

        let m0 = nodes[0].get_object("module").unwrap().unwrap();
        let m1 = nodes[1].get_object("module").unwrap().unwrap();
        assert!(m0.same_identity(&m1));
    }

    #[test]
    fn separate_passes_do_not_share_identity() {
        let reg = registry();
        let raw = json!({"id": 100, "name": "finder"});

        let mut pass1 = Instantiator::new(&reg);
        let a = pass1.instantiate("Module", &raw).unwrap();
        let mut pass2 = Instantiator::new(&reg);
        let b = pass2.instantiate("Module", &raw).unwrap();

        assert!(!a.same_identity(&b));
    }
}
