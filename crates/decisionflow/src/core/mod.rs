//! Core abstractions for workflow graphs
//!
//! This module defines the shared vocabulary (node kinds, typed node data,
//! edges, geometry), the error taxonomy, the layout trait and logging setup.

mod error;
mod layout;
pub mod logging;
mod types;

pub use error::*;
pub use layout::*;
pub use logging::*;
pub use types::*;
