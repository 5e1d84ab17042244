//! Infrastructure layer - concrete implementations of domain ports

pub mod output;
pub mod python;
pub mod shell;
pub mod templates;

pub use output::*;
pub use python::*;
pub use shell::*;
pub use templates::*;
