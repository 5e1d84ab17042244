//! Python source loading

pub mod module_loader;

pub use module_loader::*;
