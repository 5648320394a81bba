//! Explicit call context
//!
//! A [`Repository`] bundles the transport, the schema registry, and the
//! server method-name configuration into one explicit object passed by
//! the caller; there is no ambient service registry. Every retrieval
//! builds its own instantiation pass; no state is shared between calls.

use crate::caller::InstantiatingCaller;
use crate::dispatcher::Dispatcher;
use crate::error::ClientError;
use crate::instantiator::kind_of;
use crate::save;
use remo_criteria::{wire, Criteria};
use remo_value::{SchemaRegistry, TypedObject};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Server method names used by the repository operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Method returning a single object for a criteria
    pub retrieve_method: String,
    /// Method returning an object list for a criteria
    pub retrieve_list_method: String,
    /// Method returning a row count for a criteria
    pub count_method: String,
    /// Method accepting a save payload and returning a token map
    pub save_method: String,
}

impl SessionConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a custom single-object retrieval method
    #[inline]
    #[must_use]
    pub fn with_retrieve_method(mut self, method: impl Into<String>) -> Self {
        self.retrieve_method = method.into();
        self
    }

    /// With a custom list retrieval method
    #[inline]
    #[must_use]
    pub fn with_retrieve_list_method(mut self, method: impl Into<String>) -> Self {
        self.retrieve_list_method = method.into();
        self
    }

    /// With a custom count method
    #[inline]
    #[must_use]
    pub fn with_count_method(mut self, method: impl Into<String>) -> Self {
        self.count_method = method.into();
        self
    }

    /// With a custom save method
    #[inline]
    #[must_use]
    pub fn with_save_method(mut self, method: impl Into<String>) -> Self {
        self.save_method = method.into();
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            retrieve_method: "retrieveObject".to_string(),
            retrieve_list_method: "retrieveObjects".to_string(),
            count_method: "countObjects".to_string(),
            save_method: "updateObjects".to_string(),
        }
    }
}

/// Criteria-driven retrieval and write-back over one transport
#[derive(Debug)]
pub struct Repository<D> {
    caller: InstantiatingCaller<D>,
    config: SessionConfig,
}

impl<D: Dispatcher> Repository<D> {
    /// Create a repository with default method names
    #[must_use]
    pub fn new(dispatcher: D, registry: SchemaRegistry) -> Self {
        Self {
            caller: InstantiatingCaller::new(dispatcher, registry),
            config: SessionConfig::default(),
        }
    }

    /// With a custom method-name configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Access the underlying caller (for method-level dispatch)
    #[inline]
    pub fn caller(&mut self) -> &mut InstantiatingCaller<D> {
        &mut self.caller
    }

    /// Retrieve a single object matching `criteria`.
    ///
    /// # Errors
    /// Malformed criteria surface before any call is made; transport and
    /// protocol failures surface after.
    pub fn retrieve(
        &mut self,
        type_name: &str,
        criteria: &Criteria,
    ) -> Result<TypedObject, ClientError> {
        let params = self.params(type_name, criteria)?;
        let method = self.config.retrieve_method.clone();
        self.caller.dispatch(type_name, &method, params)
    }

    /// Retrieve all objects matching `criteria`.
    ///
    /// # Errors
    /// Same contract as [`Self::retrieve`].
    pub fn retrieve_all(
        &mut self,
        type_name: &str,
        criteria: &Criteria,
    ) -> Result<Vec<TypedObject>, ClientError> {
        let params = self.params(type_name, criteria)?;
        let method = self.config.retrieve_list_method.clone();
        self.caller.dispatch_list(type_name, &method, params)
    }

    /// Retrieve one object by its server identity, populating `fields`
    /// on the root.
    ///
    /// # Errors
    /// Same contract as [`Self::retrieve`].
    pub fn retrieve_by_id(
        &mut self,
        type_name: &str,
        id: i64,
        fields: &[&str],
    ) -> Result<TypedObject, ClientError> {
        let mut criteria = Criteria::new();
        criteria.add_filter("id", id);
        for field in fields {
            criteria.add_wanted_field(".", *field);
        }
        self.retrieve(type_name, &criteria)
    }

    /// Count objects matching `criteria`.
    ///
    /// The dispatcher must return a bare non-negative integer; anything
    /// else is a protocol error.
    ///
    /// # Errors
    /// Same contract as [`Self::retrieve`].
    pub fn count(&mut self, type_name: &str, criteria: &Criteria) -> Result<u64, ClientError> {
        let params = self.params(type_name, criteria)?;
        let method = self.config.count_method.clone();
        let raw = self.caller.dispatch_raw(&method, params)?;
        raw.as_u64().ok_or_else(|| {
            ClientError::protocol(format!("expected count, got {}", kind_of(&raw)))
        })
    }

    /// Save the new/dirty object graphs reachable from `roots`.
    ///
    /// One remote call (none if nothing changed); token resolution is
    /// atomic, so on failure no object is mutated.
    ///
    /// # Errors
    /// [`ClientError::UnresolvedTokens`] when the server's token map is
    /// incomplete; transport and protocol failures as usual.
    pub fn save(&mut self, roots: &[TypedObject]) -> Result<(), ClientError> {
        let method = self.config.save_method.clone();
        save::execute(&mut self.caller, &method, roots)
    }

    fn params(&self, type_name: &str, criteria: &Criteria) -> Result<Vec<Value>, ClientError> {
        let wire = wire::to_params(criteria, type_name, self.caller.registry())?;
        Ok(vec![Value::from(type_name), wire])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_method_names() {
        let config = SessionConfig::new();
        assert_eq!(config.retrieve_method, "retrieveObject");
        assert_eq!(config.retrieve_list_method, "retrieveObjects");
        assert_eq!(config.count_method, "countObjects");
        assert_eq!(config.save_method, "updateObjects");
    }

    #[test]
    fn config_builder_overrides() {
        let config = SessionConfig::new()
            .with_retrieve_method("loadOne")
            .with_save_method("persist");
        assert_eq!(config.retrieve_method, "loadOne");
        assert_eq!(config.save_method, "persist");
        assert_eq!(config.count_method, "countObjects");
    }

    #[test]
    fn config_serde_round_trip() {
        let config = SessionConfig::new().with_count_method("tally");
        let json = serde_json::to_string(&config).unwrap();
        let back: SessionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
