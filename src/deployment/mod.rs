//! Deployment pipeline: ECR repository, container image and Lambda function
//!
//! Every AWS and Docker interaction goes through a
//! [`CommandExecutor`](crate::infrastructure::CommandExecutor) driving the
//! `aws` and `docker` CLIs.

pub mod artifacts;
pub mod docker;
pub mod errors;
pub mod lambda;
pub mod pipeline;
pub mod registry;

pub use artifacts::*;
pub use docker::*;
pub use errors::*;
pub use lambda::*;
pub use pipeline::*;
pub use registry::*;

use crate::infrastructure::{CommandExecutor, CommandResult, CommandSpec};

/// Run a command and turn a non-zero exit into [`DeploymentError::CommandFailed`]
pub(crate) async fn run_checked(
    executor: &dyn CommandExecutor,
    command: &CommandSpec,
) -> Result<CommandResult, DeploymentError> {
    let result = executor.execute(command).await?;
    if result.is_success() {
        Ok(result)
    } else {
        Err(DeploymentError::command_failed(command, &result))
    }
}
