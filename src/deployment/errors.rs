//! Error types for the deployment pipeline

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::generation::GenerationError;
use crate::infrastructure::{CommandError, CommandResult, CommandSpec, TemplateError};

#[derive(Error, Debug)]
pub enum DeploymentError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("'{command}' failed with exit code {exit_code}: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("ECR repository {0} already exists")]
    RepositoryExists(String),

    #[error("Required file missing: {}", .0.display())]
    MissingArtifact(PathBuf),

    #[error("Failed to generate lambda handler: {0}")]
    Generation(#[from] GenerationError),

    #[error("Failed to render Dockerfile: {0}")]
    Template(#[from] TemplateError),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DeploymentError {
    /// Build a [`DeploymentError::CommandFailed`] from a finished command
    pub fn command_failed(command: &CommandSpec, result: &CommandResult) -> Self {
        let stderr = if result.stderr.trim().is_empty() {
            result.stdout.trim()
        } else {
            result.stderr.trim()
        };
        Self::CommandFailed {
            command: command.to_string(),
            exit_code: result.exit_code,
            stderr: stderr.to_string(),
        }
    }
}
