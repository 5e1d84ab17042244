//! lambdaship CLI entrypoint
//! Parses command-line arguments and dispatches to the generator or the
//! deployment pipeline.
#![deny(unsafe_code)]

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, error, info};

use lambdaship::config::{DeployConfig, HandlerGenConfig, MissingReturnPolicy};
use lambdaship::deployment::{DeploymentMode, DeploymentPipeline, PipelineOptions};
use lambdaship::generation::{GenerationOutcome, HandlerGenerator};
use lambdaship::infrastructure::{
    EmbeddedTemplateRepository, ShellCommandExecutor, TemplateRepository, export_templates,
};
use lambdaship::logging::{LoggingArgs, init_tracing};

#[derive(Parser)]
#[command(name = "lambdaship")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    logging: LoggingArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Generate lambda_function.py from the `main` function in main.py
    Generate {
        /// Directory containing main.py
        #[arg(long, env = "APP_LOCATION")]
        app_location: PathBuf,
        /// Custom template directory
        #[arg(long)]
        template_dir: Option<PathBuf>,
        /// Handler template to use
        #[arg(long, default_value = "generic_lambda_handler")]
        template: String,
        /// Embed a fixed message instead of failing when `main` returns nothing
        #[arg(long)]
        allow_missing_return: bool,
    },
    /// Build the image, push it to ECR and update the Lambda function
    Deploy(DeployArgs),
    /// Inspect and export the bundled templates
    Templates {
        #[command(subcommand)]
        action: TemplateCommands,
    },
}

#[derive(clap::Subcommand, Debug)]
enum TemplateCommands {
    /// List bundled templates
    List,
    /// Copy bundled templates into a directory usable with --template-dir
    Export {
        /// Destination directory
        dest: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct DeployArgs {
    /// Environment file loaded before reading configuration (default: .env)
    #[arg(long)]
    env_file: Option<PathBuf>,
    /// Only build and push the image
    #[arg(long, conflicts_with = "lambda_only")]
    ecr_only: bool,
    /// Only update the Lambda function
    #[arg(long)]
    lambda_only: bool,
    /// Fail if the ECR repository already exists instead of recreating it
    #[arg(long)]
    fail_if_exists: bool,
    /// Do not generate a missing Dockerfile or lambda_function.py
    #[arg(long)]
    no_generate: bool,
    /// Custom template directory
    #[arg(long)]
    template_dir: Option<PathBuf>,
    #[command(flatten)]
    config: DeployConfig,
}

/// Find `--env-file` before clap runs, since the file feeds env fallbacks
fn env_file_arg(args: &[OsString]) -> Option<PathBuf> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let arg = arg.to_string_lossy();
        if arg == "--env-file" {
            return iter.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--env-file=") {
            return Some(PathBuf::from(path));
        }
    }
    None
}

fn load_env_file(args: &[OsString]) -> anyhow::Result<Option<PathBuf>> {
    match env_file_arg(args) {
        Some(path) => {
            dotenvy::from_path(&path)
                .with_context(|| format!("Failed to load environment file {}", path.display()))?;
            Ok(Some(path))
        }
        None => Ok(dotenvy::dotenv().ok()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<OsString> = std::env::args_os().collect();
    let env_file = load_env_file(&args)?;

    let cli = Cli::parse_from(args);
    let _guard = init_tracing(&cli.logging).context("Failed to initialize logging")?;
    if let Some(path) = env_file {
        info!("Loaded environment from {}", path.display());
    }

    let result = match cli.command {
        Commands::Generate {
            app_location,
            template_dir,
            template,
            allow_missing_return,
        } => {
            let config = HandlerGenConfig {
                template_name: template,
                template_dir,
                missing_return: if allow_missing_return {
                    MissingReturnPolicy::EmbedSentinel
                } else {
                    MissingReturnPolicy::Fail
                },
                ..HandlerGenConfig::default()
            };
            generate(config, app_location).await
        }
        Commands::Deploy(args) => deploy(args, &cli.logging).await,
        Commands::Templates { action } => templates(action),
    };

    if let Err(e) = &result {
        error!("{e:#}");
    }
    result
}

async fn generate(config: HandlerGenConfig, app_location: PathBuf) -> anyhow::Result<()> {
    let generator =
        HandlerGenerator::with_defaults(config).context("Failed to load handler template")?;
    let outcome = generator
        .generate_handler(&app_location)
        .await
        .with_context(|| format!("Failed to generate handler in {}", app_location.display()))?;

    match outcome {
        GenerationOutcome::Generated(path) => info!("Handler written to {}", path.display()),
        GenerationOutcome::AlreadyPresent(path) => {
            info!("Handler already present at {}, nothing to do", path.display())
        }
    }
    Ok(())
}

async fn deploy(args: DeployArgs, logging: &LoggingArgs) -> anyhow::Result<()> {
    if let Some(path) = &args.env_file {
        debug!("Configuration read with environment file {}", path.display());
    }
    args.config.validate().context("Invalid deployment configuration")?;

    let generator = HandlerGenerator::with_defaults(HandlerGenConfig {
        template_dir: args.template_dir.clone(),
        ..HandlerGenConfig::default()
    })
    .context("Failed to load handler template")?;

    let options = PipelineOptions {
        fail_if_exists: args.fail_if_exists,
        generate_artifacts: !args.no_generate,
        log_level: logging.log_level.clone(),
    };
    let mode = DeploymentMode::from_flags(args.ecr_only, args.lambda_only);

    let pipeline = DeploymentPipeline::new(
        args.config,
        options,
        Arc::new(ShellCommandExecutor::new()),
        Arc::new(generator),
    );
    let summary = pipeline.run(mode).await.context("Deployment failed")?;

    info!(
        "{:?} deployment of {} finished in {:.2}s",
        summary.mode,
        summary.image_uri,
        summary.elapsed.as_secs_f64()
    );
    Ok(())
}

fn templates(action: TemplateCommands) -> anyhow::Result<()> {
    match action {
        TemplateCommands::List => {
            println!("Available embedded templates:");
            for path in EmbeddedTemplateRepository::new().list_templates() {
                println!("  {path}");
            }
        }
        TemplateCommands::Export { dest } => {
            let written = export_templates(&dest)
                .with_context(|| format!("Failed to export templates to {}", dest.display()))?;
            println!("Exported {} templates to {}", written.len(), dest.display());
        }
    }
    Ok(())
}
