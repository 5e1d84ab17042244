//! Template context assembled from an entry point descriptor

use serde::Serialize;

use crate::config::MissingReturnPolicy;
use crate::generation::{EntryPointDescriptor, GenerationError};

/// Expression embedded when the entry point returns nothing and the policy
/// allows generation to continue.
pub const NO_RETURN_SENTINEL: &str = "No function returned in the main function.";

/// Value substituted for a parameter absent from the query string
pub const MISSING_PARAMETER_DEFAULT: &str = "default_value_if_missing";

/// Names the handler template binds itself; a parameter with one of these
/// names would be overwritten by its `None` declaration.
pub const HANDLER_RESERVED_NAMES: [&str; 5] = ["event", "context", "query_params", "json", "err"];

/// The five slots of the handler template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HandlerTemplateContext {
    pub from_imports: String,
    pub declare_variables: String,
    pub variables_extraction: String,
    /// Absent when the entry point takes no parameters
    pub check_variables: Option<String>,
    pub return_statement: String,
}

impl HandlerTemplateContext {
    /// Build the slots for a descriptor.
    ///
    /// `missing_return` decides what happens when the descriptor carries no
    /// return expression; the error variant names the entry point for the
    /// caller to report.
    pub fn from_descriptor(
        descriptor: &EntryPointDescriptor,
        missing_return: MissingReturnPolicy,
    ) -> Result<Self, MissingReturn> {
        let return_statement = match (&descriptor.return_expression, missing_return) {
            (Some(expression), _) => expression.clone(),
            (None, MissingReturnPolicy::EmbedSentinel) => python_string_literal(NO_RETURN_SENTINEL),
            (None, MissingReturnPolicy::Fail) => return Err(MissingReturn),
        };

        Ok(Self {
            from_imports: render_imports(descriptor),
            declare_variables: render_declarations(&descriptor.parameters),
            variables_extraction: render_extraction(&descriptor.parameters),
            check_variables: render_check(&descriptor.parameters),
            return_statement,
        })
    }

    pub fn to_tera_context(&self) -> Result<tera::Context, GenerationError> {
        tera::Context::from_serialize(self)
            .map_err(|e| GenerationError::Render(format!("Failed to build template context: {e}")))
    }
}

/// Marker returned when the descriptor has no return expression under
/// [`MissingReturnPolicy::Fail`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingReturn;

fn render_imports(descriptor: &EntryPointDescriptor) -> String {
    let mut seen = Vec::new();
    for import in &descriptor.imports {
        if !seen.contains(&import.text.as_str()) {
            seen.push(import.text.as_str());
        }
    }
    seen.join("\n")
}

fn render_declarations(parameters: &[String]) -> String {
    parameters
        .iter()
        .map(|p| format!("    {p} = None"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_extraction(parameters: &[String]) -> String {
    parameters
        .iter()
        .map(|p| format!("            {p} = query_params.get('{p}', '{MISSING_PARAMETER_DEFAULT}')"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_check(parameters: &[String]) -> Option<String> {
    if parameters.is_empty() {
        return None;
    }
    let condition = parameters
        .iter()
        .map(|p| format!("{p} is None"))
        .collect::<Vec<_>>()
        .join(" or ");
    Some(format!("        if {condition}:"))
}

fn python_string_literal(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{ImportKind, ImportStatement};

    fn descriptor(parameters: &[&str], expression: Option<&str>) -> EntryPointDescriptor {
        EntryPointDescriptor {
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            return_expression: expression.map(str::to_string),
            imports: vec![],
        }
    }

    #[test]
    fn test_parameter_blocks_share_order() {
        let context = HandlerTemplateContext::from_descriptor(
            &descriptor(&["a", "b", "c"], Some("run(a, b, c)")),
            MissingReturnPolicy::Fail,
        )
        .unwrap();

        assert_eq!(
            context.declare_variables,
            "    a = None\n    b = None\n    c = None"
        );
        assert_eq!(
            context.variables_extraction,
            "            a = query_params.get('a', 'default_value_if_missing')\n            b = query_params.get('b', 'default_value_if_missing')\n            c = query_params.get('c', 'default_value_if_missing')"
        );
        assert_eq!(
            context.check_variables.as_deref(),
            Some("        if a is None or b is None or c is None:")
        );
        assert_eq!(context.return_statement, "run(a, b, c)");
    }

    #[test]
    fn test_zero_parameters_leave_blocks_empty() {
        let context = HandlerTemplateContext::from_descriptor(
            &descriptor(&[], Some("ping()")),
            MissingReturnPolicy::Fail,
        )
        .unwrap();

        assert!(context.declare_variables.is_empty());
        assert!(context.variables_extraction.is_empty());
        assert!(context.check_variables.is_none());
    }

    #[test]
    fn test_missing_return_policies() {
        let d = descriptor(&["x"], None);

        assert_eq!(
            HandlerTemplateContext::from_descriptor(&d, MissingReturnPolicy::Fail),
            Err(MissingReturn)
        );

        let context =
            HandlerTemplateContext::from_descriptor(&d, MissingReturnPolicy::EmbedSentinel)
                .unwrap();
        assert_eq!(
            context.return_statement,
            "\"No function returned in the main function.\""
        );
    }

    #[test]
    fn test_imports_are_joined_once_each() {
        let mut d = descriptor(&[], Some("bar()"));
        d.imports = vec![
            ImportStatement {
                kind: ImportKind::From,
                text: "from foo import bar".to_string(),
            },
            ImportStatement {
                kind: ImportKind::Plain,
                text: "import os".to_string(),
            },
            ImportStatement {
                kind: ImportKind::From,
                text: "from foo import bar".to_string(),
            },
        ];

        let context = HandlerTemplateContext::from_descriptor(&d, MissingReturnPolicy::Fail).unwrap();
        assert_eq!(context.from_imports, "from foo import bar\nimport os");
    }

    #[test]
    fn test_tera_context_carries_null_check() {
        let context = HandlerTemplateContext::from_descriptor(
            &descriptor(&[], Some("1")),
            MissingReturnPolicy::Fail,
        )
        .unwrap();
        let tera_context = context.to_tera_context().unwrap();
        assert_eq!(
            tera_context.get("check_variables"),
            Some(&serde_json::Value::Null)
        );
        assert_eq!(
            tera_context.get("return_statement"),
            Some(&serde_json::json!("1"))
        );
    }
}
