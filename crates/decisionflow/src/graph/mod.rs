//! Workflow graph: model, connection grammar, edge construction and edits
//!
//! Every operation here takes a snapshot by reference and returns a new
//! one; nothing is mutated in place.

mod connect;
mod edit;
mod model;
mod seed;
mod snapshot;
mod validator;

pub use connect::*;
pub use edit::*;
pub use model::*;
pub use seed::*;
pub use snapshot::*;
pub use validator::*;
