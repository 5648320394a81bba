//! One remote call, one instantiation pass
//!
//! Thin orchestration between the transport and the instantiation
//! engine. Exactly one dispatch per invocation; no retries, no caching
//! across calls.

use crate::dispatcher::Dispatcher;
use crate::error::ClientError;
use crate::instantiator::Instantiator;
use remo_value::{SchemaRegistry, TypedObject};
use serde_json::Value;

/// Bridges a remote dispatcher to the instantiation engine
#[derive(Debug)]
pub struct InstantiatingCaller<D> {
    dispatcher: D,
    registry: SchemaRegistry,
}

impl<D: Dispatcher> InstantiatingCaller<D> {
    /// Create a caller over a transport and a configured schema registry
    #[must_use]
    pub fn new(dispatcher: D, registry: SchemaRegistry) -> Self {
        Self {
            dispatcher,
            registry,
        }
    }

    /// The configured schema registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Call `method` and materialize the result as one object of a
    /// statically registered type.
    ///
    /// # Errors
    /// [`ClientError::UnknownType`] if `type_name` is not registered;
    /// transport failures propagate unchanged; shape mismatches surface
    /// as protocol errors.
    pub fn dispatch(
        &mut self,
        type_name: &str,
        method: &str,
        params: Vec<Value>,
    ) -> Result<TypedObject, ClientError> {
        self.require_registered(type_name)?;
        let raw = self.call(method, params)?;
        Instantiator::new(&self.registry).instantiate(type_name, &raw)
    }

    /// Call `method` and materialize the result as an ordered sequence
    /// of a statically registered type.
    ///
    /// # Errors
    /// Same contract as [`Self::dispatch`].
    pub fn dispatch_list(
        &mut self,
        type_name: &str,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Vec<TypedObject>, ClientError> {
        self.require_registered(type_name)?;
        let raw = self.call(method, params)?;
        Instantiator::new(&self.registry).instantiate_list(type_name, &raw)
    }

    /// Call `method` and materialize one object of a dynamically named
    /// semantic type (not necessarily registered; unregistered names use
    /// shape inference).
    ///
    /// # Errors
    /// Transport failures propagate unchanged; shape mismatches surface
    /// as protocol errors.
    pub fn dispatch_dynamic(
        &mut self,
        type_name: &str,
        method: &str,
        params: Vec<Value>,
    ) -> Result<TypedObject, ClientError> {
        let raw = self.call(method, params)?;
        Instantiator::new(&self.registry).instantiate(type_name, &raw)
    }

    /// List-returning variant of [`Self::dispatch_dynamic`].
    ///
    /// # Errors
    /// Same contract as [`Self::dispatch_dynamic`].
    pub fn dispatch_dynamic_list(
        &mut self,
        type_name: &str,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Vec<TypedObject>, ClientError> {
        let raw = self.call(method, params)?;
        Instantiator::new(&self.registry).instantiate_list(type_name, &raw)
    }

    /// Call `method` and hand back the raw wire value (count calls, save
    /// responses).
    ///
    /// # Errors
    /// Transport failures propagate unchanged.
    pub fn dispatch_raw(
        &mut self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Value, ClientError> {
        self.call(method, params)
    }

    fn call(&mut self, method: &str, params: Vec<Value>) -> Result<Value, ClientError> {
        tracing::debug!(method, params = params.len(), "dispatching");
        self.dispatcher
            .dispatch(method, params)
            .map_err(ClientError::Transport)
    }

    fn require_registered(&self, type_name: &str) -> Result<(), ClientError> {
        if self.registry.contains(type_name) {
            Ok(())
        } else {
            Err(ClientError::UnknownType {
                type_name: type_name.to_string(),
            })
        }
    }
}
