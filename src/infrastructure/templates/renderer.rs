//! Tera-based renderers for the handler and Dockerfile templates

use serde::Serialize;
use std::path::Path;
use tera::Tera;

use super::{TemplateError, resolve_template};
use crate::config::HandlerGenConfig;
use crate::generation::{GenerationError, HandlerRenderer, HandlerTemplateContext};

const DOCKERFILE_TEMPLATE: &str = "docker/Dockerfile.tera";

/// Relative path of a handler template inside a template directory
pub fn handler_template_path(template_name: &str) -> String {
    format!("handlers/{template_name}.py.tera")
}

/// Build a Tera instance holding a single template, with autoescaping off
/// since none of the outputs are HTML.
fn single_template(name: &str, source: &str) -> Result<Tera, TemplateError> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    tera.add_raw_template(name, source)
        .map_err(|e| TemplateError::InvalidTemplate {
            name: name.to_string(),
            message: error_chain(&e),
        })?;
    Ok(tera)
}

/// Tera reports the useful detail in the source chain, not the top error
fn error_chain(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Renders the five-slot handler template
pub struct TeraHandlerRenderer {
    tera: Tera,
    template_name: String,
}

impl TeraHandlerRenderer {
    /// Load the template named in `config`, preferring `config.template_dir`
    pub fn from_config(config: &HandlerGenConfig) -> Result<Self, GenerationError> {
        let path = handler_template_path(&config.template_name);
        let source = resolve_template(&path, config.template_dir.as_deref())?;
        Self::from_source(&path, &source)
    }

    pub fn from_source(name: &str, source: &str) -> Result<Self, GenerationError> {
        Ok(Self {
            tera: single_template(name, source)?,
            template_name: name.to_string(),
        })
    }
}

impl HandlerRenderer for TeraHandlerRenderer {
    fn render(&self, context: &HandlerTemplateContext) -> Result<String, GenerationError> {
        let tera_context = context.to_tera_context()?;
        self.tera
            .render(&self.template_name, &tera_context)
            .map_err(|e| {
                GenerationError::Render(format!(
                    "Failed to render {}: {}",
                    self.template_name,
                    error_chain(&e)
                ))
            })
    }
}

/// Values substituted into the default Dockerfile
#[derive(Debug, Clone, Serialize)]
pub struct DockerfileContext {
    pub python_version: String,
    /// `module.function` passed to the Lambda runtime
    pub handler: String,
}

impl Default for DockerfileContext {
    fn default() -> Self {
        Self {
            python_version: "3.12".to_string(),
            handler: "lambda_function.lambda_handler".to_string(),
        }
    }
}

/// Render the Dockerfile template, preferring one under `template_dir`
pub fn render_dockerfile(
    context: &DockerfileContext,
    template_dir: Option<&Path>,
) -> Result<String, TemplateError> {
    let source = resolve_template(DOCKERFILE_TEMPLATE, template_dir)?;
    let tera = single_template(DOCKERFILE_TEMPLATE, &source)?;
    let tera_context =
        tera::Context::from_serialize(context).map_err(|e| TemplateError::InvalidTemplate {
            name: DOCKERFILE_TEMPLATE.to_string(),
            message: error_chain(&e),
        })?;
    tera.render(DOCKERFILE_TEMPLATE, &tera_context)
        .map_err(|e| TemplateError::InvalidTemplate {
            name: DOCKERFILE_TEMPLATE.to_string(),
            message: error_chain(&e),
        })
}
