//! Core types for the generation domain

use rustpython_parser::ast;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A parsed Python source file
#[derive(Debug, Clone)]
pub struct LoadedModule {
    pub path: PathBuf,
    pub source: String,
    pub body: ast::Suite,
}

impl LoadedModule {
    pub fn new(path: impl Into<PathBuf>, source: String, body: ast::Suite) -> Self {
        Self {
            path: path.into(),
            source,
            body,
        }
    }

    /// Source text covered by a parser range
    pub fn slice(&self, range: rustpython_parser::text_size::TextRange) -> &str {
        let start = usize::from(range.start());
        let end = usize::from(range.end());
        self.source.get(start..end).unwrap_or_default()
    }
}

/// Kind of an import statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportKind {
    /// `from package import name`
    From,
    /// `import package`
    Plain,
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportKind::From => write!(f, "from"),
            ImportKind::Plain => write!(f, "import"),
        }
    }
}

/// An import statement copied verbatim from the entry point body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStatement {
    pub kind: ImportKind,
    pub text: String,
}

/// Metadata of the user-authored entry point
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPointDescriptor {
    /// Parameter names in declaration order
    pub parameters: Vec<String>,
    /// Source text following the first `return` keyword
    pub return_expression: Option<String>,
    /// Import statements found in the function body, in source order
    pub imports: Vec<ImportStatement>,
}

/// Terminal state of a successful `generate_handler` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// The handler was rendered and written by this call
    Generated(PathBuf),
    /// A handler already existed; nothing was written
    AlreadyPresent(PathBuf),
}

impl GenerationOutcome {
    pub fn path(&self) -> &Path {
        match self {
            GenerationOutcome::Generated(path) | GenerationOutcome::AlreadyPresent(path) => path,
        }
    }

    /// The handler file exists after the call
    pub fn handler_exists(&self) -> bool {
        true
    }

    pub fn was_generated(&self) -> bool {
        matches!(self, GenerationOutcome::Generated(_))
    }
}
