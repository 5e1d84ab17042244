//! Configuration for handler generation and deployment
//!
//! [`DeployConfig`] is read from command-line flags with environment
//! variable fallbacks (optionally seeded from a `.env` file by the binary).
//! [`HandlerGenConfig`] carries the file naming conventions of the generator.

use clap::{Args, ValueEnum};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// ECR repository names: lowercase segments separated by `/`
static REPOSITORY_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[a-z0-9]+(?:[._-][a-z0-9]+)*/)*[a-z0-9]+(?:[._-][a-z0-9]+)*$")
        .expect("repository name pattern is valid")
});

static ACCOUNT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{12}$").expect("account id pattern is valid"));

/// Configuration errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("Invalid AWS account id: {0}")]
    InvalidAccountId(String),

    #[error("Invalid ECR repository name: {0}")]
    InvalidRepositoryName(String),

    #[error("Application location does not exist: {}", .0.display())]
    AppLocationNotFound(PathBuf),

    #[error("Application location is not a directory: {}", .0.display())]
    AppLocationNotDirectory(PathBuf),
}

/// What to do when the entry point has no `return <expr>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MissingReturnPolicy {
    /// Abort generation with an error
    #[default]
    Fail,
    /// Emit a handler whose success body is a fixed message
    EmbedSentinel,
}

/// Naming conventions and template selection for the handler generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerGenConfig {
    /// File holding the entry point, relative to the application directory
    pub entry_module: String,
    /// Name of the entry point function
    pub entry_function: String,
    /// Generated file name, relative to the application directory
    pub output_file: String,
    /// Template name, without the `.py.tera` suffix
    pub template_name: String,
    /// Directory searched before the bundled templates
    pub template_dir: Option<PathBuf>,
    pub missing_return: MissingReturnPolicy,
}

impl Default for HandlerGenConfig {
    fn default() -> Self {
        Self {
            entry_module: "main.py".to_string(),
            entry_function: "main".to_string(),
            output_file: "lambda_function.py".to_string(),
            template_name: "generic_lambda_handler".to_string(),
            template_dir: None,
            missing_return: MissingReturnPolicy::Fail,
        }
    }
}

/// AWS, ECR and Lambda settings for a deployment run
#[derive(Debug, Clone, PartialEq, Eq, Args, Serialize, Deserialize)]
pub struct DeployConfig {
    /// AWS region
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub aws_region: String,

    /// AWS account id owning the registry
    #[arg(long, env = "AWS_ACCOUNT_ID", default_value = "")]
    pub aws_account_id: String,

    /// Named AWS CLI profile
    #[arg(long, env = "AWS_PROFILE")]
    pub aws_profile: Option<String>,

    /// Name of the ECR repository
    #[arg(long, env = "ECR_REPOSITORY_NAME", default_value = "lambda-docker")]
    pub ecr_repository_name: String,

    /// Image tag pushed to ECR
    #[arg(long, env = "ECR_IMAGE_TAG", default_value = "latest")]
    pub ecr_image_tag: String,

    /// Path to the application directory containing the Dockerfile
    #[arg(long, env = "APP_LOCATION")]
    pub app_location: Option<PathBuf>,

    /// Lambda function updated with the new image
    #[arg(long, env = "LAMBDA_FUNCTION_NAME", default_value = "lambda-docker-function")]
    pub lambda_function_name: String,

    /// Lambda memory size in MB
    #[arg(long, env = "LAMBDA_MEMORY_SIZE", default_value_t = 128)]
    pub lambda_memory_size: u32,

    /// Lambda timeout in seconds
    #[arg(long, env = "LAMBDA_TIMEOUT", default_value_t = 30)]
    pub lambda_timeout: u32,

    /// Value of the ENVIRONMENT variable set on the function
    #[arg(long, env = "ENVIRONMENT", default_value = "development")]
    pub environment: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            aws_region: "us-east-1".to_string(),
            aws_account_id: String::new(),
            aws_profile: None,
            ecr_repository_name: "lambda-docker".to_string(),
            ecr_image_tag: "latest".to_string(),
            app_location: None,
            lambda_function_name: "lambda-docker-function".to_string(),
            lambda_memory_size: 128,
            lambda_timeout: 30,
            environment: "development".to_string(),
        }
    }
}

impl DeployConfig {
    /// Check required values and the application location
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.aws_account_id.is_empty() {
            return Err(ConfigError::Missing("AWS_ACCOUNT_ID"));
        }
        if !ACCOUNT_ID.is_match(&self.aws_account_id) {
            return Err(ConfigError::InvalidAccountId(self.aws_account_id.clone()));
        }
        if self.ecr_repository_name.is_empty() {
            return Err(ConfigError::Missing("ECR_REPOSITORY_NAME"));
        }
        if !REPOSITORY_NAME.is_match(&self.ecr_repository_name) {
            return Err(ConfigError::InvalidRepositoryName(
                self.ecr_repository_name.clone(),
            ));
        }
        if self.lambda_function_name.is_empty() {
            return Err(ConfigError::Missing("LAMBDA_FUNCTION_NAME"));
        }
        if let Some(location) = &self.app_location {
            if !location.exists() {
                return Err(ConfigError::AppLocationNotFound(location.clone()));
            }
            if !location.is_dir() {
                return Err(ConfigError::AppLocationNotDirectory(location.clone()));
            }
        }
        Ok(())
    }

    /// Application directory, defaulting to the current directory
    pub fn app_dir(&self) -> &Path {
        self.app_location.as_deref().unwrap_or_else(|| Path::new("."))
    }

    /// `{account}.dkr.ecr.{region}.amazonaws.com`
    pub fn registry(&self) -> String {
        format!(
            "{}.dkr.ecr.{}.amazonaws.com",
            self.aws_account_id, self.aws_region
        )
    }

    pub fn repository_uri(&self) -> String {
        format!("{}/{}", self.registry(), self.ecr_repository_name)
    }

    pub fn image_uri(&self) -> String {
        format!("{}:{}", self.repository_uri(), self.ecr_image_tag)
    }

    /// Tag of the locally built image
    pub fn local_image(&self) -> String {
        format!("{}:{}", self.ecr_repository_name, self.ecr_image_tag)
    }

    /// Arguments shared by every `aws` invocation
    pub fn aws_cli_args(&self) -> Vec<String> {
        let mut args = vec!["--region".to_string(), self.aws_region.clone()];
        if let Some(profile) = &self.aws_profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: DeployConfig,
    }

    fn valid() -> DeployConfig {
        DeployConfig {
            aws_account_id: "123456789012".to_string(),
            ..DeployConfig::default()
        }
    }

    #[test]
    fn test_uris() {
        let config = DeployConfig {
            aws_region: "eu-west-1".to_string(),
            ecr_repository_name: "team/api".to_string(),
            ecr_image_tag: "v2".to_string(),
            ..valid()
        };

        assert_eq!(config.registry(), "123456789012.dkr.ecr.eu-west-1.amazonaws.com");
        assert_eq!(
            config.repository_uri(),
            "123456789012.dkr.ecr.eu-west-1.amazonaws.com/team/api"
        );
        assert_eq!(
            config.image_uri(),
            "123456789012.dkr.ecr.eu-west-1.amazonaws.com/team/api:v2"
        );
        assert_eq!(config.local_image(), "team/api:v2");
    }

    #[test]
    fn test_validate_requires_account_id() {
        assert_eq!(
            DeployConfig::default().validate(),
            Err(ConfigError::Missing("AWS_ACCOUNT_ID"))
        );

        let config = DeployConfig {
            aws_account_id: "12345".to_string(),
            ..DeployConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidAccountId(_))
        ));
    }

    #[test]
    fn test_validate_repository_and_function_names() {
        assert!(valid().validate().is_ok());

        let config = DeployConfig {
            ecr_repository_name: "Not_Valid".to_string(),
            ..valid()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRepositoryName(_))
        ));

        let config = DeployConfig {
            ecr_repository_name: String::new(),
            ..valid()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Missing("ECR_REPOSITORY_NAME"))
        );

        let config = DeployConfig {
            lambda_function_name: String::new(),
            ..valid()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Missing("LAMBDA_FUNCTION_NAME"))
        );
    }

    #[test]
    fn test_validate_app_location() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Dockerfile");
        std::fs::write(&file, "FROM scratch").unwrap();

        let config = DeployConfig {
            app_location: Some(dir.path().to_path_buf()),
            ..valid()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.app_dir(), dir.path());

        let config = DeployConfig {
            app_location: Some(dir.path().join("missing")),
            ..valid()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::AppLocationNotFound(_))
        ));

        let config = DeployConfig {
            app_location: Some(file),
            ..valid()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::AppLocationNotDirectory(_))
        ));
    }

    #[test]
    fn test_aws_cli_args_include_profile() {
        assert_eq!(valid().aws_cli_args(), vec!["--region", "us-east-1"]);

        let config = DeployConfig {
            aws_profile: Some("latest".to_string()),
            ..valid()
        };
        assert_eq!(
            config.aws_cli_args(),
            vec!["--region", "us-east-1", "--profile", "latest"]
        );
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = TestCli::try_parse_from([
            "test",
            "--aws-account-id",
            "123456789012",
            "--ecr-repository-name",
            "my-repo",
            "--lambda-memory-size",
            "512",
        ])
        .unwrap();

        assert_eq!(cli.config.ecr_repository_name, "my-repo");
        assert_eq!(cli.config.lambda_memory_size, 512);
    }

    #[test]
    fn test_handler_gen_defaults() {
        let config = HandlerGenConfig::default();
        assert_eq!(config.entry_module, "main.py");
        assert_eq!(config.entry_function, "main");
        assert_eq!(config.output_file, "lambda_function.py");
        assert_eq!(config.template_name, "generic_lambda_handler");
        assert_eq!(config.missing_return, MissingReturnPolicy::Fail);
    }
}
