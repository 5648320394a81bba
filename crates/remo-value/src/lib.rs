//! Typed remote-object runtime
//!
//! Provides the client-side representation of remote domain objects:
//! - [`TypedObject`]: shared handle over an ordered field map with
//!   identity, new/dirty lifecycle, and typed accessors
//! - [`SchemaRegistry`] / [`TypeSchema`]: data-driven type metadata
//!   (field name to semantic kind) resolved at configuration time
//! - [`FieldValue`]: stored field slot preserving the null-vs-absent
//!   distinction ("fetched and null" is not "never fetched")

#![warn(unreachable_pub)]

pub mod error;
pub mod object;
pub mod schema;

pub use error::ValueError;
pub use object::{FieldValue, RemoteId, TypedObject};
pub use schema::{SchemaRegistry, SemanticKind, TypeSchema};
