//! Testing utilities for the remo workspace
//!
//! Scripted dispatcher, fixture schema registry, and canned responses.

#![allow(missing_docs)]

use remo_client::Dispatcher;
use remo_value::{SchemaRegistry, SemanticKind, TypeSchema};
use serde_json::Value;
use std::collections::VecDeque;

/// Dispatcher fed from a queue of canned responses; records every call.
#[derive(Debug, Default)]
pub struct ScriptedDispatcher {
    responses: VecDeque<Value>,
    pub calls: Vec<(String, Vec<Value>)>,
}

impl ScriptedDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_response(mut self, response: Value) -> Self {
        self.responses.push_back(response);
        self
    }

    pub fn push_response(&mut self, response: Value) {
        self.responses.push_back(response);
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.len()
    }
}

impl Dispatcher for ScriptedDispatcher {
    fn dispatch(&mut self, method: &str, params: Vec<Value>) -> Result<Value, anyhow::Error> {
        self.calls.push((method.to_string(), params));
        self.responses
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted response left for {method}"))
    }
}

/// Dispatcher that always fails, for transport-failure paths.
#[derive(Debug, Default)]
pub struct FailingDispatcher {
    pub message: String,
}

impl FailingDispatcher {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Dispatcher for FailingDispatcher {
    fn dispatch(&mut self, _method: &str, _params: Vec<Value>) -> Result<Value, anyhow::Error> {
        Err(anyhow::anyhow!("{}", self.message))
    }
}

/// Microscopy-flavoured fixture schema: analysis chains of nodes wired
/// to modules with formal inputs, plus free-form attributes.
#[must_use]
pub fn fixture_registry() -> SchemaRegistry {
    SchemaRegistry::new()
        .with_type(
            "Module",
            TypeSchema::new()
                .with_field("name", SemanticKind::String)
                .with_field("category", SemanticKind::String)
                .with_field("inputs", SemanticKind::List("FormalInput".to_string())),
        )
        .with_type(
            "FormalInput",
            TypeSchema::new()
                .with_field("name", SemanticKind::String)
                .with_field("optional", SemanticKind::Boolean)
                .with_field("module", SemanticKind::Ref("Module".to_string())),
        )
        .with_type(
            "AnalysisChain",
            TypeSchema::new()
                .with_field("name", SemanticKind::String)
                .with_field("locked", SemanticKind::Boolean)
                .with_field("nodes", SemanticKind::List("AnalysisNode".to_string())),
        )
        .with_type(
            "AnalysisNode",
            TypeSchema::new()
                .with_field("module", SemanticKind::Ref("Module".to_string()))
                .with_field("chain", SemanticKind::Ref("AnalysisChain".to_string())),
        )
        .with_type(
            "AnalysisLink",
            TypeSchema::new()
                .with_field("from_node", SemanticKind::Ref("AnalysisNode".to_string()))
                .with_field("to_node", SemanticKind::Ref("AnalysisNode".to_string()))
                .with_field("chain", SemanticKind::Ref("AnalysisChain".to_string())),
        )
        .with_type(
            "Attribute",
            TypeSchema::new()
                .with_field("granularity", SemanticKind::String)
                .with_field("value", SemanticKind::Double),
        )
}

/// Canned single-module response.
#[must_use]
pub fn module_json(id: i64, name: &str) -> Value {
    serde_json::json!({ "id": id, "name": name, "category": "tracking" })
}

/// Initialize test logging once (safe to call repeatedly).
pub fn init_test_logging() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
