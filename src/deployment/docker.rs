//! Container image build, tag and push via the `docker` CLI

use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{DeploymentError, run_checked};
use crate::infrastructure::{CommandExecutor, CommandSpec};

pub struct DockerImageBuilder {
    executor: Arc<dyn CommandExecutor>,
}

impl DockerImageBuilder {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    /// `docker build -t <image> -f <dir>/Dockerfile <dir>`
    #[instrument(skip(self, context_dir), fields(context = %context_dir.display()))]
    pub async fn build(&self, image: &str, context_dir: &Path) -> Result<(), DeploymentError> {
        let dockerfile = context_dir.join("Dockerfile");
        let command = CommandSpec::new("docker")
            .args(["build", "-t", image, "-f"])
            .arg(dockerfile.to_string_lossy())
            .arg(context_dir.to_string_lossy());

        run_checked(self.executor.as_ref(), &command).await?;
        info!("Docker image built successfully: {image}");
        Ok(())
    }

    pub async fn tag(&self, source: &str, target: &str) -> Result<(), DeploymentError> {
        let command = CommandSpec::new("docker").args(["tag", source, target]);
        run_checked(self.executor.as_ref(), &command).await?;
        info!("Tagged image: {source} -> {target}");
        Ok(())
    }

    pub async fn push(&self, image: &str) -> Result<(), DeploymentError> {
        let command = CommandSpec::new("docker").args(["push", image]);
        run_checked(self.executor.as_ref(), &command).await?;
        info!("Pushed image to ECR: {image}");
        Ok(())
    }

    /// Tag the local image with its registry URI, then push it
    pub async fn tag_and_push(&self, local: &str, remote: &str) -> Result<(), DeploymentError> {
        self.tag(local, remote).await?;
        self.push(remote).await
    }
}
