//! ECR repository lifecycle and registry login

use std::sync::Arc;
use tracing::{error, info, instrument};

use super::{DeploymentError, run_checked};
use crate::config::DeployConfig;
use crate::infrastructure::{CommandExecutor, CommandSpec};

/// Marker the AWS CLI prints when a repository is unknown
const REPOSITORY_NOT_FOUND: &str = "RepositoryNotFoundException";

/// Wraps `aws ecr` for one repository
pub struct EcrRegistry {
    executor: Arc<dyn CommandExecutor>,
    repository_name: String,
    registry: String,
    aws_args: Vec<String>,
}

impl EcrRegistry {
    pub fn new(config: &DeployConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            executor,
            repository_name: config.ecr_repository_name.clone(),
            registry: config.registry(),
            aws_args: config.aws_cli_args(),
        }
    }

    fn ecr(&self, subcommand: &str) -> CommandSpec {
        CommandSpec::new("aws")
            .args(["ecr", subcommand])
            .args(self.aws_args.iter().cloned())
    }

    pub async fn repository_exists(&self) -> Result<bool, DeploymentError> {
        let command = self
            .ecr("describe-repositories")
            .args(["--repository-names", self.repository_name.as_str()]);
        let result = self.executor.execute(&command).await?;

        if result.is_success() {
            Ok(true)
        } else if result.stderr.contains(REPOSITORY_NOT_FOUND) {
            Ok(false)
        } else {
            Err(DeploymentError::command_failed(&command, &result))
        }
    }

    /// Delete the repository together with its images
    pub async fn delete_repository(&self) -> Result<(), DeploymentError> {
        let command = self
            .ecr("delete-repository")
            .args(["--repository-name", self.repository_name.as_str(), "--force"]);
        run_checked(self.executor.as_ref(), &command).await?;
        info!("Deleted ECR repository: {}", self.repository_name);
        Ok(())
    }

    /// Create the repository with scan-on-push and AES256 encryption
    pub async fn create_repository(&self) -> Result<(), DeploymentError> {
        let command = self.ecr("create-repository").args([
            "--repository-name",
            self.repository_name.as_str(),
            "--image-scanning-configuration",
            "scanOnPush=true",
            "--encryption-configuration",
            "encryptionType=AES256",
        ]);
        run_checked(self.executor.as_ref(), &command).await?;
        info!("Created ECR repository: {}", self.repository_name);
        Ok(())
    }

    /// Start from an empty repository.
    ///
    /// An existing repository is deleted first, unless `fail_if_exists` is
    /// set, in which case nothing is touched and an error is returned.
    #[instrument(skip(self), fields(repository = %self.repository_name))]
    pub async fn recreate_repository(&self, fail_if_exists: bool) -> Result<(), DeploymentError> {
        if self.repository_exists().await? {
            if fail_if_exists {
                error!(
                    "ECR repository {} already exists. Failing as requested.",
                    self.repository_name
                );
                return Err(DeploymentError::RepositoryExists(
                    self.repository_name.clone(),
                ));
            }
            info!(
                "ECR repository {} already exists. Deleting it first.",
                self.repository_name
            );
            self.delete_repository().await?;
        } else {
            info!(
                "ECR repository {} does not exist, proceeding with creation.",
                self.repository_name
            );
        }

        self.create_repository().await
    }

    /// `aws ecr get-login-password | docker login --password-stdin <registry>`
    #[instrument(skip(self), fields(registry = %self.registry))]
    pub async fn login(&self) -> Result<(), DeploymentError> {
        let password = run_checked(
            self.executor.as_ref(),
            &self.ecr("get-login-password").quiet(),
        )
        .await?
        .stdout
        .trim()
        .to_string();

        let login = CommandSpec::new("docker")
            .args(["login", "--username", "AWS", "--password-stdin"])
            .arg(&self.registry)
            .stdin(password);
        run_checked(self.executor.as_ref(), &login).await?;

        info!("Successfully logged in to ECR");
        Ok(())
    }
}
