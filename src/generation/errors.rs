//! Error types for the generation domain

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Why an entry module could not be loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleLoadErrorKind {
    /// The file does not exist
    NotFound,
    /// The file exists but could not be read
    Unreadable(String),
    /// The file was read but is not valid Python
    Syntax(String),
}

impl fmt::Display for ModuleLoadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleLoadErrorKind::NotFound => write!(f, "file not found"),
            ModuleLoadErrorKind::Unreadable(reason) => write!(f, "unreadable: {reason}"),
            ModuleLoadErrorKind::Syntax(reason) => write!(f, "syntax error: {reason}"),
        }
    }
}

/// Errors that can occur while generating a handler
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Failed to load module {}: {kind}", path.display())]
    ModuleLoad {
        path: PathBuf,
        kind: ModuleLoadErrorKind,
    },

    #[error("No '{name}' function found in {}", path.display())]
    MissingEntryPoint { name: String, path: PathBuf },

    #[error("No return expression found in '{name}' ({})", path.display())]
    MissingReturn { name: String, path: PathBuf },

    #[error(
        "Parameter '{name}' of '{entry_point}' ({}) clashes with a name the handler defines",
        path.display()
    )]
    ReservedParameter {
        name: String,
        entry_point: String,
        path: PathBuf,
    },

    #[error("Template error: {0}")]
    Template(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GenerationError {
    /// True for every failure to load or parse the entry module
    pub fn is_module_load(&self) -> bool {
        matches!(self, GenerationError::ModuleLoad { .. })
    }
}
