//! Retrieval and instantiation engine
//!
//! The core of the client: takes a declarative [`Criteria`], sends it to
//! a remote [`Dispatcher`], and materializes the untyped response into a
//! typed object graph with per-pass identity, cycle resolution, and
//! new/dirty write-back tracking.
//!
//! # Example
//!
//! ```rust,ignore
//! use remo_client::{Repository, SessionConfig};
//! use remo_criteria::Criteria;
//!
//! let mut repo = Repository::new(transport, registry);
//! let mut criteria = Criteria::new();
//! criteria.add_wanted_field(".", "name");
//! criteria.add_wanted_field("nodes.module", "name");
//! criteria.add_filter("id", 42i64);
//!
//! let chain = repo.retrieve("AnalysisChain", &criteria)?;
//! println!("{:?}", chain.get_string("name")?);
//! ```

#![warn(unreachable_pub)]

pub mod caller;
pub mod dispatcher;
pub mod error;
pub mod instantiator;
pub mod repository;
mod save;

pub use caller::InstantiatingCaller;
pub use dispatcher::Dispatcher;
pub use error::ClientError;
pub use instantiator::Instantiator;
pub use repository::{Repository, SessionConfig};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the retrieval engine
    pub use crate::{ClientError, Dispatcher, InstantiatingCaller, Repository, SessionConfig};
    pub use remo_criteria::{Criteria, FieldSpec, Operator};
    pub use remo_value::{SchemaRegistry, SemanticKind, TypeSchema, TypedObject};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
