//! Generation orchestration - coordinates the handler generation workflow

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::config::HandlerGenConfig;
use crate::generation::{
    FileSystem, GenerationError, GenerationOutcome, HandlerRenderer, HandlerTemplateContext,
    ModuleLoader, describe_entry_point,
};

/// Generates `lambda_function.py` next to a user's `main.py`
pub struct HandlerGenerator {
    config: HandlerGenConfig,
    file_system: Arc<dyn FileSystem>,
    module_loader: Arc<dyn ModuleLoader>,
    renderer: Arc<dyn HandlerRenderer>,
}

impl HandlerGenerator {
    pub fn new(
        config: HandlerGenConfig,
        file_system: Arc<dyn FileSystem>,
        module_loader: Arc<dyn ModuleLoader>,
        renderer: Arc<dyn HandlerRenderer>,
    ) -> Self {
        Self {
            config,
            file_system,
            module_loader,
            renderer,
        }
    }

    /// Wire the generator with the local filesystem, the Python parser and
    /// the template named in `config`.
    pub fn with_defaults(config: HandlerGenConfig) -> Result<Self, GenerationError> {
        use crate::infrastructure::{
            LocalFileSystem, PythonModuleLoader, TeraHandlerRenderer,
        };

        let file_system: Arc<dyn FileSystem> = Arc::new(LocalFileSystem::new());
        let renderer = TeraHandlerRenderer::from_config(&config)?;
        Ok(Self::new(
            config,
            Arc::clone(&file_system),
            Arc::new(PythonModuleLoader::new(file_system)),
            Arc::new(renderer),
        ))
    }

    pub fn config(&self) -> &HandlerGenConfig {
        &self.config
    }

    /// Execute the generation workflow for one application directory
    #[instrument(skip(self, dir), fields(dir = %dir.display()))]
    pub async fn generate_handler(&self, dir: &Path) -> Result<GenerationOutcome, GenerationError> {
        // 1. Skip when a handler is already there
        let output_path = dir.join(&self.config.output_file);
        if self.file_system.exists(&output_path).await {
            info!("{} found in {}", self.config.output_file, dir.display());
            return Ok(GenerationOutcome::AlreadyPresent(output_path));
        }
        info!(
            "{} does not exist in {}, generating it",
            self.config.output_file,
            dir.display()
        );

        // 2. Load the entry module
        let module_path = dir.join(&self.config.entry_module);
        let module = self.module_loader.load(&module_path).await?;

        // 3. Introspect the entry point
        let descriptor = describe_entry_point(&module, &self.config.entry_function)?;
        debug!(
            parameters = ?descriptor.parameters,
            imports = descriptor.imports.len(),
            "Introspected '{}'",
            self.config.entry_function
        );
        if let Some(expression) = &descriptor.return_expression {
            info!("The expression returned in {}() is: {}", self.config.entry_function, expression);
        }

        // 4. Assemble the template slots
        let context =
            HandlerTemplateContext::from_descriptor(&descriptor, self.config.missing_return)
                .map_err(|_| GenerationError::MissingReturn {
                    name: self.config.entry_function.clone(),
                    path: module_path.clone(),
                })?;

        // 5. Render
        let rendered = self.renderer.render(&context)?;

        // 6. Write
        self.file_system
            .write_text(&output_path, &rendered)
            .await
            .map_err(|source| GenerationError::Write {
                path: output_path.clone(),
                source,
            })?;

        info!("Generated {}", output_path.display());
        Ok(GenerationOutcome::Generated(output_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MissingReturnPolicy;
    use crate::generation::{LoadedModule, ModuleLoadErrorKind};
    use async_trait::async_trait;
    use rustpython_parser::{Parse, ast};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tracing_test::traced_test;

    #[derive(Default)]
    struct MemoryFileSystem {
        files: Mutex<HashMap<PathBuf, String>>,
        writes: Mutex<usize>,
    }

    impl MemoryFileSystem {
        fn with_file(self, path: &str, contents: &str) -> Self {
            self.files
                .lock()
                .unwrap()
                .insert(PathBuf::from(path), contents.to_string());
            self
        }

        fn get(&self, path: &str) -> Option<String> {
            self.files.lock().unwrap().get(Path::new(path)).cloned()
        }

        fn write_count(&self) -> usize {
            *self.writes.lock().unwrap()
        }
    }

    #[async_trait]
    impl FileSystem for MemoryFileSystem {
        async fn exists(&self, path: &Path) -> bool {
            self.files.lock().unwrap().contains_key(path)
        }

        async fn read_text(&self, path: &Path) -> std::io::Result<String> {
            self.files
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))
        }

        async fn write_text(&self, path: &Path, contents: &str) -> std::io::Result<()> {
            *self.writes.lock().unwrap() += 1;
            self.files
                .lock()
                .unwrap()
                .insert(path.to_path_buf(), contents.to_string());
            Ok(())
        }
    }

    struct MemoryLoader(Arc<MemoryFileSystem>);

    #[async_trait]
    impl ModuleLoader for MemoryLoader {
        async fn load(&self, path: &Path) -> Result<LoadedModule, GenerationError> {
            let source = self.0.read_text(path).await.map_err(|_| GenerationError::ModuleLoad {
                path: path.to_path_buf(),
                kind: ModuleLoadErrorKind::NotFound,
            })?;
            let body = ast::Suite::parse(&source, "main.py").map_err(|e| {
                GenerationError::ModuleLoad {
                    path: path.to_path_buf(),
                    kind: ModuleLoadErrorKind::Syntax(e.to_string()),
                }
            })?;
            Ok(LoadedModule::new(path, source, body))
        }
    }

    /// Renders the slots as `slot=value` lines
    struct SlotRenderer;

    impl HandlerRenderer for SlotRenderer {
        fn render(&self, context: &HandlerTemplateContext) -> Result<String, GenerationError> {
            Ok(format!(
                "imports={}\nreturn={}\ncheck={}",
                context.from_imports,
                context.return_statement,
                context.check_variables.as_deref().unwrap_or("-")
            ))
        }
    }

    fn generator(fs: Arc<MemoryFileSystem>, config: HandlerGenConfig) -> HandlerGenerator {
        HandlerGenerator::new(
            config,
            Arc::clone(&fs) as Arc<dyn FileSystem>,
            Arc::new(MemoryLoader(fs)),
            Arc::new(SlotRenderer),
        )
    }

    #[tokio::test]
    async fn test_generates_when_handler_missing() {
        let fs = Arc::new(MemoryFileSystem::default().with_file(
            "app/main.py",
            "def main(x):\n    from foo import bar\n    return bar(x)\n",
        ));
        let generator = generator(Arc::clone(&fs), HandlerGenConfig::default());

        let outcome = generator.generate_handler(Path::new("app")).await.unwrap();

        assert_eq!(
            outcome,
            GenerationOutcome::Generated(PathBuf::from("app/lambda_function.py"))
        );
        assert_eq!(
            fs.get("app/lambda_function.py").unwrap(),
            "imports=from foo import bar\nreturn=bar(x)\ncheck=        if x is None:"
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn test_existing_handler_is_left_alone() {
        let fs = Arc::new(
            MemoryFileSystem::default()
                .with_file("app/lambda_function.py", "# hand written")
                .with_file("app/main.py", "this is not python ("),
        );
        let generator = generator(Arc::clone(&fs), HandlerGenConfig::default());

        let outcome = generator.generate_handler(Path::new("app")).await.unwrap();

        assert!(!outcome.was_generated());
        assert_eq!(fs.write_count(), 0);
        assert_eq!(fs.get("app/lambda_function.py").unwrap(), "# hand written");
        assert!(logs_contain("lambda_function.py found in app"));
    }

    #[tokio::test]
    async fn test_missing_module_writes_nothing() {
        let fs = Arc::new(MemoryFileSystem::default());
        let generator = generator(Arc::clone(&fs), HandlerGenConfig::default());

        let err = generator.generate_handler(Path::new("app")).await.unwrap_err();

        assert!(err.is_module_load());
        assert_eq!(fs.write_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_entry_point_is_fatal() {
        let fs = Arc::new(
            MemoryFileSystem::default().with_file("app/main.py", "def other():\n    return 1\n"),
        );
        let generator = generator(Arc::clone(&fs), HandlerGenConfig::default());

        let err = generator.generate_handler(Path::new("app")).await.unwrap_err();

        assert!(matches!(err, GenerationError::MissingEntryPoint { .. }));
        assert_eq!(fs.write_count(), 0);
    }

    #[tokio::test]
    async fn test_reserved_parameter_writes_nothing() {
        let fs = Arc::new(
            MemoryFileSystem::default().with_file("app/main.py", "def main(event):\n    return event\n"),
        );
        let generator = generator(Arc::clone(&fs), HandlerGenConfig::default());

        let err = generator.generate_handler(Path::new("app")).await.unwrap_err();

        assert!(matches!(err, GenerationError::ReservedParameter { ref name, .. } if name == "event"));
        assert_eq!(fs.write_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_return_follows_policy() {
        let source = "def main():\n    print('side effect')\n";

        let fs = Arc::new(MemoryFileSystem::default().with_file("app/main.py", source));
        let strict = generator(Arc::clone(&fs), HandlerGenConfig::default());
        let err = strict.generate_handler(Path::new("app")).await.unwrap_err();
        assert!(matches!(err, GenerationError::MissingReturn { ref name, .. } if name == "main"));
        assert_eq!(fs.write_count(), 0);

        let lenient = generator(
            Arc::clone(&fs),
            HandlerGenConfig {
                missing_return: MissingReturnPolicy::EmbedSentinel,
                ..HandlerGenConfig::default()
            },
        );
        lenient.generate_handler(Path::new("app")).await.unwrap();
        assert!(
            fs.get("app/lambda_function.py")
                .unwrap()
                .contains("return=\"No function returned in the main function.\"")
        );
    }

    #[tokio::test]
    async fn test_custom_file_names() {
        let fs = Arc::new(
            MemoryFileSystem::default().with_file("svc/app.py", "def handle():\n    return 1\n"),
        );
        let config = HandlerGenConfig {
            entry_module: "app.py".to_string(),
            entry_function: "handle".to_string(),
            output_file: "handler.py".to_string(),
            ..HandlerGenConfig::default()
        };
        let generator = generator(Arc::clone(&fs), config);

        let outcome = generator.generate_handler(Path::new("svc")).await.unwrap();

        assert_eq!(outcome.path(), Path::new("svc/handler.py"));
        assert!(fs.get("svc/handler.py").unwrap().contains("check=-"));
    }
}
