//! Checks that an application directory can be built into a Lambda image

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

use super::DeploymentError;
use crate::generation::{GenerationOutcome, HandlerGenerator};
use crate::infrastructure::{DockerfileContext, render_dockerfile};

const DOCKERFILE: &str = "Dockerfile";
const REQUIREMENTS: &str = "requirements.txt";

/// How a required file came to be present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactStatus {
    Present,
    Generated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactReport {
    pub dockerfile: ArtifactStatus,
    pub handler: ArtifactStatus,
}

/// Ensures `Dockerfile`, the handler and `requirements.txt` exist
pub struct ArtifactChecker {
    generator: Arc<HandlerGenerator>,
}

impl ArtifactChecker {
    pub fn new(generator: Arc<HandlerGenerator>) -> Self {
        Self { generator }
    }

    /// With `generate` set, a missing Dockerfile or handler is produced;
    /// otherwise any missing file is an error. `requirements.txt` is never
    /// generated.
    pub async fn check(&self, dir: &Path, generate: bool) -> Result<ArtifactReport, DeploymentError> {
        let dockerfile = self.ensure_dockerfile(dir, generate).await?;
        let handler = self.ensure_handler(dir, generate).await?;

        let requirements = dir.join(REQUIREMENTS);
        if !path_exists(&requirements).await {
            return Err(DeploymentError::MissingArtifact(requirements));
        }

        Ok(ArtifactReport {
            dockerfile,
            handler,
        })
    }

    async fn ensure_dockerfile(
        &self,
        dir: &Path,
        generate: bool,
    ) -> Result<ArtifactStatus, DeploymentError> {
        let path = dir.join(DOCKERFILE);
        if path_exists(&path).await {
            return Ok(ArtifactStatus::Present);
        }
        if !generate {
            return Err(DeploymentError::MissingArtifact(path));
        }

        warn!("{} not found, writing the default Dockerfile", path.display());
        let template_dir = self.generator.config().template_dir.as_deref();
        let contents = render_dockerfile(&DockerfileContext::default(), template_dir)?;
        tokio::fs::write(&path, contents)
            .await
            .map_err(|source| DeploymentError::Write {
                path: path.clone(),
                source,
            })?;
        Ok(ArtifactStatus::Generated)
    }

    async fn ensure_handler(
        &self,
        dir: &Path,
        generate: bool,
    ) -> Result<ArtifactStatus, DeploymentError> {
        let path: PathBuf = dir.join(&self.generator.config().output_file);
        if !generate {
            return if path_exists(&path).await {
                Ok(ArtifactStatus::Present)
            } else {
                Err(DeploymentError::MissingArtifact(path))
            };
        }

        match self.generator.generate_handler(dir).await? {
            GenerationOutcome::AlreadyPresent(_) => Ok(ArtifactStatus::Present),
            GenerationOutcome::Generated(_) => Ok(ArtifactStatus::Generated),
        }
    }
}

async fn path_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HandlerGenConfig;
    use tempfile::TempDir;

    fn checker() -> ArtifactChecker {
        let generator = HandlerGenerator::with_defaults(HandlerGenConfig::default()).unwrap();
        ArtifactChecker::new(Arc::new(generator))
    }

    fn app_dir(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, contents) in files {
            std::fs::write(dir.path().join(name), contents).unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn test_complete_directory_is_untouched() {
        let dir = app_dir(&[
            ("Dockerfile", "FROM scratch\n"),
            ("lambda_function.py", "# handler\n"),
            ("requirements.txt", ""),
        ]);

        let report = checker().check(dir.path(), true).await.unwrap();

        assert_eq!(report.dockerfile, ArtifactStatus::Present);
        assert_eq!(report.handler, ArtifactStatus::Present);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("Dockerfile")).unwrap(),
            "FROM scratch\n"
        );
    }

    #[tokio::test]
    async fn test_missing_files_are_generated() {
        let dir = app_dir(&[
            ("main.py", "def main(name):\n    return f'hello {name}'\n"),
            ("requirements.txt", "boto3\n"),
        ]);

        let report = checker().check(dir.path(), true).await.unwrap();

        assert_eq!(report.dockerfile, ArtifactStatus::Generated);
        assert_eq!(report.handler, ArtifactStatus::Generated);
        let dockerfile = std::fs::read_to_string(dir.path().join("Dockerfile")).unwrap();
        assert!(dockerfile.contains("lambda_function.lambda_handler"));
        assert!(dir.path().join("lambda_function.py").exists());
    }

    #[tokio::test]
    async fn test_no_generate_reports_missing_file() {
        let dir = app_dir(&[("requirements.txt", ""), ("lambda_function.py", "")]);

        let err = checker().check(dir.path(), false).await.unwrap_err();

        assert!(matches!(err, DeploymentError::MissingArtifact(ref p) if p.ends_with("Dockerfile")));
        assert!(!dir.path().join("Dockerfile").exists());
    }

    #[tokio::test]
    async fn test_requirements_are_required() {
        let dir = app_dir(&[
            ("Dockerfile", "FROM scratch\n"),
            ("lambda_function.py", "# handler\n"),
        ]);

        let err = checker().check(dir.path(), true).await.unwrap_err();

        assert!(
            matches!(err, DeploymentError::MissingArtifact(ref p) if p.ends_with("requirements.txt"))
        );
    }

    #[tokio::test]
    async fn test_generation_failure_is_reported() {
        let dir = app_dir(&[("requirements.txt", ""), ("main.py", "def other():\n    pass\n")]);

        let err = checker().check(dir.path(), true).await.unwrap_err();

        assert!(matches!(
            err,
            DeploymentError::Generation(crate::generation::GenerationError::MissingEntryPoint { .. })
        ));
    }
}
