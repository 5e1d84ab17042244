//! Deployment orchestration - coordinates the ECR and Lambda stages

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument};

use super::{
    ArtifactChecker, DeploymentError, DockerImageBuilder, EcrRegistry, FunctionSettings,
    LambdaFunctionUpdater,
};
use crate::config::DeployConfig;
use crate::generation::HandlerGenerator;
use crate::infrastructure::CommandExecutor;

/// Which stages of the pipeline to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeploymentMode {
    /// ECR stage followed by the Lambda stage
    #[default]
    Full,
    EcrOnly,
    /// Point the function at an image already in ECR
    LambdaOnly,
}

impl DeploymentMode {
    pub fn from_flags(ecr_only: bool, lambda_only: bool) -> Self {
        match (ecr_only, lambda_only) {
            (true, _) => Self::EcrOnly,
            (false, true) => Self::LambdaOnly,
            (false, false) => Self::Full,
        }
    }

    fn runs_ecr(self) -> bool {
        matches!(self, Self::Full | Self::EcrOnly)
    }

    fn runs_lambda(self) -> bool {
        matches!(self, Self::Full | Self::LambdaOnly)
    }
}

/// Options that are not part of [`DeployConfig`]
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Fail instead of deleting an existing repository
    pub fail_if_exists: bool,
    /// Generate a missing Dockerfile or handler
    pub generate_artifacts: bool,
    /// `LOG_LEVEL` set on the function
    pub log_level: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            fail_if_exists: false,
            generate_artifacts: true,
            log_level: "INFO".to_string(),
        }
    }
}

/// What a successful run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentSummary {
    pub mode: DeploymentMode,
    pub image_uri: String,
    pub elapsed: Duration,
}

pub struct DeploymentPipeline {
    config: DeployConfig,
    options: PipelineOptions,
    registry: EcrRegistry,
    images: DockerImageBuilder,
    artifacts: ArtifactChecker,
    function: LambdaFunctionUpdater,
}

impl DeploymentPipeline {
    pub fn new(
        config: DeployConfig,
        options: PipelineOptions,
        executor: Arc<dyn CommandExecutor>,
        generator: Arc<HandlerGenerator>,
    ) -> Self {
        Self {
            registry: EcrRegistry::new(&config, Arc::clone(&executor)),
            images: DockerImageBuilder::new(Arc::clone(&executor)),
            function: LambdaFunctionUpdater::new(&config, executor),
            artifacts: ArtifactChecker::new(generator),
            config,
            options,
        }
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    /// Run the stages selected by `mode`; the first failure stops the run
    #[instrument(skip(self), fields(repository = %self.config.ecr_repository_name))]
    pub async fn run(&self, mode: DeploymentMode) -> Result<DeploymentSummary, DeploymentError> {
        self.config.validate()?;
        let start = Instant::now();
        let image_uri = self.config.image_uri();

        if mode.runs_ecr() {
            info!(
                "Starting deployment to ECR: {}",
                self.config.ecr_repository_name
            );
            self.deploy_image(&image_uri).await.inspect_err(|e| {
                error!("ECR deployment failed: {e}");
            })?;
        }

        if mode.runs_lambda() {
            info!(
                "Updating Lambda function: {}",
                self.config.lambda_function_name
            );
            self.update_function(&image_uri).await.inspect_err(|e| {
                error!("Lambda update failed: {e}");
            })?;
        }

        let elapsed = start.elapsed();
        info!(
            "Deployment completed successfully in {:.2} seconds",
            elapsed.as_secs_f64()
        );
        Ok(DeploymentSummary {
            mode,
            image_uri,
            elapsed,
        })
    }

    async fn deploy_image(&self, image_uri: &str) -> Result<(), DeploymentError> {
        let app_dir = self.config.app_dir();
        let local_image = self.config.local_image();

        self.registry
            .recreate_repository(self.options.fail_if_exists)
            .await?;
        self.registry.login().await?;
        self.artifacts
            .check(app_dir, self.options.generate_artifacts)
            .await?;
        self.images.build(&local_image, app_dir).await?;
        self.images.tag_and_push(&local_image, image_uri).await
    }

    async fn update_function(&self, image_uri: &str) -> Result<(), DeploymentError> {
        let name = &self.config.lambda_function_name;
        self.function.update_function_code(name, image_uri).await?;

        let settings = FunctionSettings::from_config(&self.config, &self.options.log_level);
        self.function
            .update_function_configuration(name, &settings)
            .await
    }
}
