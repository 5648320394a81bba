//! Error types for the retrieval engine
//!
//! Four kinds, mirroring the layer's contract:
//! - malformed criteria (caller bug, reported at send time)
//! - server protocol errors (response shape mismatch)
//! - typed-access errors bubbling up from the value runtime
//! - transport failures, propagated unchanged and never retried here

use remo_criteria::CriteriaError;
use remo_value::ValueError;

/// Main error type for retrieval, instantiation, and save operations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Caller built an internally inconsistent criteria
    #[error("malformed criteria: {0}")]
    MalformedCriteria(#[from] CriteriaError),

    /// Raw response does not match the shape expected for the requested
    /// type
    #[error("server protocol error: {0}")]
    Protocol(String),

    /// Dispatch against a type name the schema registry does not know
    #[error("type {type_name} is not registered")]
    UnknownType {
        /// The unregistered type name
        type_name: String,
    },

    /// Typed field access failure
    #[error(transparent)]
    Value(#[from] ValueError),

    /// Failure from the external dispatcher, propagated unchanged
    #[error("transport failure: {0}")]
    Transport(anyhow::Error),

    /// Save response did not resolve every temporary token
    #[error("save response left unresolved tokens: {tokens:?}")]
    UnresolvedTokens {
        /// Tokens missing from the server's token map
        tokens: Vec<String>,
    },
}

impl ClientError {
    /// Create a server-protocol error
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Whether this is a transport failure (caller decides on retry)
    #[inline]
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Whether the server response itself was malformed
    #[inline]
    #[must_use]
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_constructor() {
        let err = ClientError::protocol("expected object, got list");
        assert!(err.is_protocol());
        assert!(!err.is_transport());
        assert!(err.to_string().contains("expected object"));
    }

    #[test]
    fn transport_wraps_anyhow() {
        let err = ClientError::Transport(anyhow::anyhow!("connection refused"));
        assert!(err.is_transport());
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn criteria_error_converts() {
        let err: ClientError = CriteriaError::InRequiresList {
            column: "id".to_string(),
        }
        .into();
        assert!(matches!(err, ClientError::MalformedCriteria(_)));
    }
}
