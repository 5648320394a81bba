//! Transport seam
//!
//! The remote dispatcher is an external collaborator: one operation,
//! one blocking round trip. Timeouts, retries, and authentication are
//! its responsibility, not this layer's.

use serde_json::Value;

/// Remote method dispatcher
///
/// `params` are positional; the return value is the untyped wire
/// universe (null, boolean, number, string, list, or mapping). Any
/// failure is opaque to this layer and propagates unchanged.
#[cfg_attr(test, mockall::automock)]
pub trait Dispatcher {
    /// Invoke `method` with positional `params` and return the raw
    /// result.
    ///
    /// # Errors
    /// Whatever the transport produces; never retried here.
    fn dispatch(&mut self, method: &str, params: Vec<Value>) -> Result<Value, anyhow::Error>;
}

// Mutable borrows dispatch too, so a caller can keep ownership of its
// transport (useful for inspecting recorded calls in tests).
impl<D: Dispatcher + ?Sized> Dispatcher for &mut D {
    fn dispatch(&mut self, method: &str, params: Vec<Value>) -> Result<Value, anyhow::Error> {
        (**self).dispatch(method, params)
    }
}
