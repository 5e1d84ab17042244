//! Loads a Python source file into a syntax tree

use async_trait::async_trait;
use rustpython_parser::{Parse, ast};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::generation::{
    FileSystem, GenerationError, LoadedModule, ModuleLoadErrorKind, ModuleLoader,
};

/// Parses modules with `rustpython-parser`. Nothing is executed.
pub struct PythonModuleLoader {
    file_system: Arc<dyn FileSystem>,
}

impl PythonModuleLoader {
    pub fn new(file_system: Arc<dyn FileSystem>) -> Self {
        Self { file_system }
    }
}

#[async_trait]
impl ModuleLoader for PythonModuleLoader {
    async fn load(&self, path: &Path) -> Result<LoadedModule, GenerationError> {
        let load_error = |kind| GenerationError::ModuleLoad {
            path: path.to_path_buf(),
            kind,
        };

        let source = match self.file_system.read_text(path).await {
            Ok(source) => source,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(load_error(ModuleLoadErrorKind::NotFound));
            }
            Err(e) => return Err(load_error(ModuleLoadErrorKind::Unreadable(e.to_string()))),
        };

        let body = ast::Suite::parse(&source, &path.to_string_lossy())
            .map_err(|e| load_error(ModuleLoadErrorKind::Syntax(e.to_string())))?;

        debug!("Parsed {} ({} top-level statements)", path.display(), body.len());
        Ok(LoadedModule::new(path, source, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::LocalFileSystem;
    use tempfile::TempDir;

    fn loader() -> PythonModuleLoader {
        PythonModuleLoader::new(Arc::new(LocalFileSystem::new()))
    }

    #[tokio::test]
    async fn test_loads_valid_module() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.py");
        std::fs::write(&path, "import os\n\ndef main(a):\n    return a\n").unwrap();

        let module = loader().load(&path).await.unwrap();

        assert_eq!(module.body.len(), 2);
        assert_eq!(module.path, path);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = loader().load(&dir.path().join("main.py")).await.unwrap_err();

        assert!(matches!(
            err,
            GenerationError::ModuleLoad {
                kind: ModuleLoadErrorKind::NotFound,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_syntax_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.py");
        std::fs::write(&path, "def main(:\n    return 1\n").unwrap();

        let err = loader().load(&path).await.unwrap_err();

        assert!(matches!(
            err,
            GenerationError::ModuleLoad {
                kind: ModuleLoadErrorKind::Syntax(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_non_utf8_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.py");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        let err = loader().load(&path).await.unwrap_err();

        assert!(matches!(
            err,
            GenerationError::ModuleLoad {
                kind: ModuleLoadErrorKind::Unreadable(_),
                ..
            }
        ));
    }
}
