//! Port interfaces for the generation domain

use async_trait::async_trait;
use std::path::Path;

use crate::generation::{GenerationError, HandlerTemplateContext, LoadedModule};

/// Minimal filesystem surface the generator needs
#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn exists(&self, path: &Path) -> bool;

    async fn read_text(&self, path: &Path) -> std::io::Result<String>;

    async fn write_text(&self, path: &Path, contents: &str) -> std::io::Result<()>;
}

/// Loads a source file into an inspectable syntax tree
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// Load and parse the module at `path`.
    ///
    /// Must fail with [`GenerationError::ModuleLoad`], telling a missing
    /// file apart from a file that does not parse.
    async fn load(&self, path: &Path) -> Result<LoadedModule, GenerationError>;
}

/// Renders the handler template from its slots
pub trait HandlerRenderer: Send + Sync {
    fn render(&self, context: &HandlerTemplateContext) -> Result<String, GenerationError>;
}
