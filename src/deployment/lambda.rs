//! Lambda function updates via `aws lambda`

use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{DeploymentError, run_checked};
use crate::config::DeployConfig;
use crate::infrastructure::{CommandExecutor, CommandSpec};

/// Settings applied with `update-function-configuration`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSettings {
    pub memory_size: u32,
    pub timeout: u32,
    /// Value of `ENVIRONMENT` inside the function
    pub environment: String,
    /// Value of `LOG_LEVEL` inside the function
    pub log_level: String,
}

impl FunctionSettings {
    pub fn from_config(config: &DeployConfig, log_level: &str) -> Self {
        Self {
            memory_size: config.lambda_memory_size,
            timeout: config.lambda_timeout,
            environment: config.environment.clone(),
            log_level: log_level.to_string(),
        }
    }

    /// `--environment` argument in the CLI's JSON shorthand
    fn environment_json(&self) -> String {
        json!({
            "Variables": {
                "ENVIRONMENT": self.environment,
                "LOG_LEVEL": self.log_level,
            }
        })
        .to_string()
    }
}

pub struct LambdaFunctionUpdater {
    executor: Arc<dyn CommandExecutor>,
    aws_args: Vec<String>,
}

impl LambdaFunctionUpdater {
    pub fn new(config: &DeployConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            executor,
            aws_args: config.aws_cli_args(),
        }
    }

    fn lambda(&self, subcommand: &str, function_name: &str) -> CommandSpec {
        CommandSpec::new("aws")
            .args(["lambda", subcommand])
            .args(self.aws_args.iter().cloned())
            .args(["--function-name", function_name])
    }

    /// Point the function at a new image and wait for the update to settle
    #[instrument(skip(self))]
    pub async fn update_function_code(
        &self,
        function_name: &str,
        image_uri: &str,
    ) -> Result<(), DeploymentError> {
        let command = self
            .lambda("update-function-code", function_name)
            .args(["--image-uri", image_uri]);
        run_checked(self.executor.as_ref(), &command).await?;

        // A configuration update is rejected while the code update is in progress
        let wait = CommandSpec::new("aws")
            .args(["lambda", "wait", "function-updated"])
            .args(self.aws_args.iter().cloned())
            .args(["--function-name", function_name]);
        run_checked(self.executor.as_ref(), &wait).await?;

        info!("Updated {function_name} to image {image_uri}");
        Ok(())
    }

    #[instrument(skip(self, settings))]
    pub async fn update_function_configuration(
        &self,
        function_name: &str,
        settings: &FunctionSettings,
    ) -> Result<(), DeploymentError> {
        let command = self
            .lambda("update-function-configuration", function_name)
            .args(["--memory-size".to_string(), settings.memory_size.to_string()])
            .args(["--timeout".to_string(), settings.timeout.to_string()])
            .args(["--environment".to_string(), settings.environment_json()]);
        run_checked(self.executor.as_ref(), &command).await?;

        info!(
            memory_size = settings.memory_size,
            timeout = settings.timeout,
            "Updated configuration of {function_name}"
        );
        Ok(())
    }
}
