//! Template repositories: bundled templates and a user template directory

use rust_embed::RustEmbed;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::TemplateError;

/// Container for all templates embedded at compile time
#[derive(RustEmbed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

/// Source of template text addressed by relative path
pub trait TemplateRepository: Send + Sync {
    /// Template text, or `None` when this repository does not have it
    fn get_template(&self, path: &str) -> Result<Option<String>, TemplateError>;

    /// Relative paths of every template this repository holds
    fn list_templates(&self) -> Vec<String>;
}

/// Template repository backed by embedded templates
pub struct EmbeddedTemplateRepository;

impl EmbeddedTemplateRepository {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EmbeddedTemplateRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRepository for EmbeddedTemplateRepository {
    fn get_template(&self, path: &str) -> Result<Option<String>, TemplateError> {
        let Some(file) = EmbeddedTemplates::get(path) else {
            return Ok(None);
        };
        let content = std::str::from_utf8(file.data.as_ref()).map_err(|source| {
            TemplateError::InvalidEncoding {
                path: path.to_string(),
                source,
            }
        })?;
        Ok(Some(content.to_string()))
    }

    fn list_templates(&self) -> Vec<String> {
        let mut paths: Vec<String> = EmbeddedTemplates::iter()
            .map(|p| p.as_ref().to_string())
            .collect();
        paths.sort();
        paths
    }
}

/// Template repository rooted at a directory on disk, typically given with
/// `--template-dir`
pub struct FileSystemTemplateRepository {
    root: PathBuf,
}

impl FileSystemTemplateRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TemplateRepository for FileSystemTemplateRepository {
    fn get_template(&self, path: &str) -> Result<Option<String>, TemplateError> {
        let full_path = self.root.join(path);
        if !full_path.is_file() {
            return Ok(None);
        }
        debug!("Loading template from {}", full_path.display());
        Ok(Some(std::fs::read_to_string(&full_path)?))
    }

    fn list_templates(&self) -> Vec<String> {
        let mut paths = Vec::new();
        collect_files(&self.root, &self.root, &mut paths);
        paths.sort();
        paths
    }
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, out);
        } else if let Ok(relative) = path.strip_prefix(root) {
            out.push(relative.to_string_lossy().replace('\\', "/"));
        }
    }
}

/// Look a template up in the user directory first, then in the bundle.
pub fn resolve_template(
    path: &str,
    template_dir: Option<&Path>,
) -> Result<String, TemplateError> {
    if let Some(dir) = template_dir {
        if let Some(content) = FileSystemTemplateRepository::new(dir).get_template(path)? {
            return Ok(content);
        }
        debug!(
            "Template {} not in {}, falling back to bundled templates",
            path,
            dir.display()
        );
    }

    EmbeddedTemplateRepository::new()
        .get_template(path)?
        .ok_or_else(|| TemplateError::not_found(path))
}

/// Copy every bundled template under `dest`, keeping relative paths.
/// Returns the written files.
pub fn export_templates(dest: &Path) -> Result<Vec<PathBuf>, TemplateError> {
    let repo = EmbeddedTemplateRepository::new();
    let mut written = Vec::new();
    for relative in repo.list_templates() {
        let Some(content) = repo.get_template(&relative)? else {
            continue;
        };
        let target = dest.join(&relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, content)?;
        written.push(target);
    }
    Ok(written)
}
