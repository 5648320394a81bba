//! Write-back path
//!
//! Serializes the object graphs reachable from the save roots using the
//! identity-cache discipline in reverse: every not-yet-persisted object
//! gets a deterministic temporary token (`NEW:<n>` in visit order), the
//! outgoing payload references new objects by token and persisted ones
//! by server ID, and the server's token → real-ID map is applied
//! atomically: either every token resolves or nothing is mutated.

use crate::caller::InstantiatingCaller;
use crate::dispatcher::Dispatcher;
use crate::error::ClientError;
use crate::instantiator::kind_of;
use remo_value::{FieldValue, TypedObject};
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};

struct SavePlan {
    payload: Value,
    /// Token → object, in token assignment order
    new_objects: Vec<(String, TypedObject)>,
    /// Persisted objects with local edits
    dirty_objects: Vec<TypedObject>,
}

impl SavePlan {
    fn is_empty(&self) -> bool {
        self.new_objects.is_empty() && self.dirty_objects.is_empty()
    }
}

/// Preorder walk over the graphs reachable from `roots`, each handle
/// visited once (pointer identity, since new objects have no remote
/// identity yet).
fn reachable(roots: &[TypedObject]) -> Vec<TypedObject> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut stack: Vec<TypedObject> = roots.iter().rev().cloned().collect();

    while let Some(obj) = stack.pop() {
        if !seen.insert(obj.identity_key()) {
            continue;
        }
        // Children pushed in reverse so field order is preserved.
        let mut children = Vec::new();
        for (_, value) in obj.fields_snapshot() {
            match value {
                FieldValue::Object(child) => children.push(child),
                FieldValue::Objects(list) => children.extend(list),
                FieldValue::Null | FieldValue::Scalar(_) => {}
            }
        }
        for child in children.into_iter().rev() {
            stack.push(child);
        }
        out.push(obj);
    }
    out
}

fn plan(roots: &[TypedObject]) -> SavePlan {
    let objects = reachable(roots);

    let mut tokens: HashMap<usize, String> = HashMap::new();
    let mut new_objects = Vec::new();
    for obj in &objects {
        if obj.is_new() {
            let token = format!("NEW:{}", new_objects.len() + 1);
            tokens.insert(obj.identity_key(), token.clone());
            new_objects.push((token, obj.clone()));
        }
    }

    let reference = |obj: &TypedObject| -> Value {
        match tokens.get(&obj.identity_key()) {
            Some(token) => json!({ "$token": token }),
            // Not new implies persisted, so the id is present.
            None => json!({ "$ref": obj.id() }),
        }
    };

    let mut entries = Vec::new();
    let mut dirty_objects = Vec::new();
    for obj in &objects {
        if !obj.is_new() && !obj.is_dirty() {
            continue;
        }
        if !obj.is_new() {
            dirty_objects.push(obj.clone());
        }

        let mut fields = Map::new();
        for (name, value) in obj.fields_snapshot() {
            let encoded = match value {
                FieldValue::Null => Value::Null,
                FieldValue::Scalar(v) => v,
                FieldValue::Object(child) => reference(&child),
                FieldValue::Objects(list) => {
                    Value::Array(list.iter().map(&reference).collect())
                }
            };
            fields.insert(name, encoded);
        }

        let target = match tokens.get(&obj.identity_key()) {
            Some(token) => json!(token),
            None => json!(obj.id()),
        };
        entries.push(json!({
            "type": obj.type_name(),
            "target": target,
            "new": obj.is_new(),
            "fields": fields,
        }));
    }

    SavePlan {
        payload: Value::Array(entries),
        new_objects,
        dirty_objects,
    }
}

/// Parse the server's token → real-ID mapping. An absent or empty map is
/// legitimate when nothing new was created.
fn parse_token_map(raw: &Value) -> Result<HashMap<String, i64>, ClientError> {
    match raw {
        Value::Null => Ok(HashMap::new()),
        Value::Object(map) => {
            let mut out = HashMap::with_capacity(map.len());
            for (token, id) in map {
                let id = id.as_i64().ok_or_else(|| {
                    ClientError::protocol(format!(
                        "token map entry {token} must be an integer, got {}",
                        kind_of(id)
                    ))
                })?;
                out.insert(token.clone(), id);
            }
            Ok(out)
        }
        other => Err(ClientError::protocol(format!(
            "expected token map, got {}",
            kind_of(other)
        ))),
    }
}

/// Save the graphs reachable from `roots` through one remote call.
///
/// No call is made when nothing is new or dirty. Application of the
/// response is atomic with respect to the caller's view: all tokens are
/// verified before any object is mutated.
pub(crate) fn execute<D: Dispatcher>(
    caller: &mut InstantiatingCaller<D>,
    method: &str,
    roots: &[TypedObject],
) -> Result<(), ClientError> {
    let plan = plan(roots);
    if plan.is_empty() {
        tracing::debug!("nothing to save");
        return Ok(());
    }

    let raw = caller.dispatch_raw(method, vec![plan.payload.clone()])?;
    let resolved = parse_token_map(&raw)?;

    let missing: Vec<String> = plan
        .new_objects
        .iter()
        .map(|(token, _)| token.clone())
        .filter(|token| !resolved.contains_key(token))
        .collect();
    if !missing.is_empty() {
        return Err(ClientError::UnresolvedTokens { tokens: missing });
    }

    for (token, obj) in &plan.new_objects {
        obj.assign_persisted(resolved[token]);
    }
    for obj in &plan.dirty_objects {
        obj.mark_clean();
    }

    tracing::info!(
        created = plan.new_objects.len(),
        updated = plan.dirty_objects.len(),
        "save applied"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reachable_visits_each_handle_once() {
        let a = TypedObject::new_local("AnalysisNode");
        let b = TypedObject::new_local("Module");
        a.set_object("module", &b);
        b.set_object("node", &a); // cycle

        let objects = reachable(&[a.clone()]);
        assert_eq!(objects.len(), 2);
        assert!(objects[0].same_identity(&a));
        assert!(objects[1].same_identity(&b));
    }

    #[test]
    fn plan_assigns_tokens_in_visit_order() {
        let a = TypedObject::new_local("AnalysisChain");
        let b = TypedObject::new_local("AnalysisNode");
        a.set_object("node", &b);

        let plan = plan(&[a.clone()]);
        assert_eq!(plan.new_objects.len(), 2);
        assert_eq!(plan.new_objects[0].0, "NEW:1");
        assert!(plan.new_objects[0].1.same_identity(&a));
        assert_eq!(plan.new_objects[1].0, "NEW:2");
    }

    #[test]
    fn plan_references_new_by_token_and_persisted_by_id() {
        let parent = TypedObject::new_local("AnalysisNode");
        let module = TypedObject::materialized("Module", 42);
        let child = TypedObject::new_local("Attribute");
        parent.set_object("module", &module);
        parent.set_object("attr", &child);

        let plan = plan(&[parent]);
        let entries = plan.payload.as_array().unwrap();
        let parent_entry = &entries[0];
        assert_eq!(parent_entry["fields"]["module"], json!({"$ref": 42}));
        assert_eq!(parent_entry["fields"]["attr"], json!({"$token": "NEW:2"}));
    }

    #[test]
    fn clean_persisted_objects_are_not_transmitted() {
        let parent = TypedObject::new_local("AnalysisNode");
        let module = TypedObject::materialized("Module", 42);
        parent.set_object("module", &module);

        let plan = plan(&[parent]);
        let entries = plan.payload.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["type"], json!("AnalysisNode"));
    }

    #[test]
    fn dirty_persisted_object_is_transmitted_by_id() {
        let module = TypedObject::materialized("Module", 42);
        module.set_string("name", "renamed");

        let plan = plan(&[module]);
        let entries = plan.payload.as_array().unwrap();
        assert_eq!(entries[0]["target"], json!(42));
        assert_eq!(entries[0]["new"], json!(false));
        assert_eq!(entries[0]["fields"]["name"], json!("renamed"));
    }

    #[test]
    fn token_map_parses() {
        let map = parse_token_map(&json!({"NEW:1": 101, "NEW:2": 102})).unwrap();
        assert_eq!(map["NEW:1"], 101);
        assert_eq!(map["NEW:2"], 102);
        assert!(parse_token_map(&Value::Null).unwrap().is_empty());
    }

    #[test]
    fn token_map_rejects_non_integer_ids() {
        let err = parse_token_map(&json!({"NEW:1": "oops"})).unwrap_err();
        assert!(err.is_protocol());
    }

    #[test]
    fn token_map_rejects_non_map() {
        let err = parse_token_map(&json!([1, 2])).unwrap_err();
        assert!(err.is_protocol());
    }
}
