//! lambdaship library
//!
//! Generates an AWS Lambda request/response handler (`lambda_function.py`)
//! from a user-authored Python `main` function, and ships the containerized
//! function to ECR before pointing a Lambda function at the new image.
//!
//! The crate is layered the same way as the binary uses it:
//! - [`generation`] holds the handler-generation domain (introspection of the
//!   entry point, template context assembly and the orchestrating generator)
//! - [`infrastructure`] holds the adapters behind the domain ports (Python
//!   parser, filesystem, Tera templates, process execution)
//! - [`deployment`] holds the registry / image / function pipeline
//! - [`config`] and [`logging`] hold the ambient setup used by the CLI

pub mod config;
pub mod deployment;
pub mod generation;
pub mod infrastructure;
pub mod logging;

pub use crate::{
    config::{ConfigError, DeployConfig, HandlerGenConfig, MissingReturnPolicy},
    deployment::{DeploymentError, DeploymentMode, DeploymentPipeline},
    generation::{GenerationError, GenerationOutcome, HandlerGenerator},
};
