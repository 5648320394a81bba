//! Declarative retrieval criteria
//!
//! A [`Criteria`] describes one retrieval request: which fields to
//! populate per relation path ([`FieldSpec`]), filter predicates,
//! ordering, and limit/offset. It is a pure value object; no execution
//! logic lives here. Serialization to the wire mapping and send-time
//! validation are in [`wire`].

#![warn(unreachable_pub)]

pub mod criteria;
pub mod error;
pub mod field_spec;
pub mod wire;

pub use criteria::{Criteria, Filter, FilterValue, Operator};
pub use error::CriteriaError;
pub use field_spec::{normalize, FieldSpec, ROOT_PATH};
