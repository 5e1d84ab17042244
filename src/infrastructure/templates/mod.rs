//! Template repositories and Tera renderers

pub mod embedded_repository;
pub mod errors;
pub mod renderer;

pub use embedded_repository::*;
pub use errors::*;
pub use renderer::*;
