//! Generation domain module - turns a user entry point into a Lambda handler
//!
//! The workflow is linear: check for an existing handler, load the entry
//! module, introspect the entry point, assemble the template slots, render,
//! write. See [`HandlerGenerator::generate_handler`].

pub mod context;
pub mod errors;
pub mod introspection;
pub mod orchestrator;
pub mod traits;
pub mod types;

pub use context::*;
pub use errors::*;
pub use introspection::*;
pub use orchestrator::*;
pub use traits::*;
pub use types::*;
