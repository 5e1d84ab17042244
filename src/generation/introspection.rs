//! Entry-point introspection over the Python syntax tree
//!
//! The entry point is located by name among the top-level statements of the
//! loaded module. Its parameters come from the declared signature; the return
//! expression and the import statements are cut out of the module source
//! using the ranges recorded by the parser, so multi-line expressions and
//! parenthesized imports survive intact.

use rustpython_parser::ast::{self, Stmt};
use rustpython_parser::{Mode, Tok, lexer};
use tracing::warn;

use crate::generation::{
    EntryPointDescriptor, GenerationError, HANDLER_RESERVED_NAMES, ImportKind, ImportStatement,
    LoadedModule,
};

/// A function definition found in a loaded module
#[derive(Debug, Clone, Copy)]
pub struct EntryPoint<'m> {
    pub name: &'m str,
    pub args: &'m ast::Arguments,
    pub body: &'m [Stmt],
}

/// Find a top-level function by name.
///
/// Later definitions shadow earlier ones, matching what the interpreter
/// binds when the module is imported.
pub fn find_entry_point<'m>(module: &'m LoadedModule, name: &str) -> Option<EntryPoint<'m>> {
    module.body.iter().rev().find_map(|stmt| match stmt {
        Stmt::FunctionDef(def) if def.name.as_str() == name => Some(EntryPoint {
            name: def.name.as_str(),
            args: &def.args,
            body: &def.body,
        }),
        Stmt::AsyncFunctionDef(def) if def.name.as_str() == name => Some(EntryPoint {
            name: def.name.as_str(),
            args: &def.args,
            body: &def.body,
        }),
        _ => None,
    })
}

/// Parameter names in the order the signature declares them.
pub fn extract_parameters(entry: &EntryPoint<'_>) -> Vec<String> {
    let args = entry.args;
    let mut names = Vec::new();

    names.extend(args.posonlyargs.iter().map(|a| a.def.arg.as_str().to_string()));
    names.extend(args.args.iter().map(|a| a.def.arg.as_str().to_string()));
    if let Some(vararg) = &args.vararg {
        names.push(vararg.arg.as_str().to_string());
    }
    names.extend(args.kwonlyargs.iter().map(|a| a.def.arg.as_str().to_string()));
    if let Some(kwarg) = &args.kwarg {
        names.push(kwarg.arg.as_str().to_string());
    }

    names
}

/// Text of the first `return <expr>` in the function, without the keyword.
///
/// A bare `return` carries no expression and is skipped. A tuple written
/// without enclosing parentheses (`return a, b`) comes back parenthesized so
/// it stays a single value when passed as a call argument.
pub fn extract_return_expression(
    entry: &EntryPoint<'_>,
    module: &LoadedModule,
) -> Option<String> {
    let mut found = None;
    walk_body(entry.body, &mut |stmt| {
        if found.is_some() {
            return;
        }
        if let Stmt::Return(ret) = stmt {
            if let Some(value) = ret.value.as_deref() {
                let text = module.slice(ret.range);
                let expression = text.strip_prefix("return").unwrap_or(text).trim();
                if expression.is_empty() {
                    return;
                }
                found = Some(match value {
                    ast::Expr::Tuple(_) if !is_parenthesized(expression) => {
                        format!("({expression})")
                    }
                    _ => expression.to_string(),
                });
            }
        }
    });
    found
}

/// Import statements written directly in the function body, in source order.
///
/// Imports nested in `if`, `try`, loops or `with` blocks are conditional in
/// the entry module and cannot be hoisted to module level without changing what
/// fails when; they are skipped with a warning.
pub fn extract_import_lines(entry: &EntryPoint<'_>, module: &LoadedModule) -> Vec<ImportStatement> {
    let mut imports = Vec::new();
    for stmt in entry.body {
        if let Some(import) = import_statement(stmt, module) {
            imports.push(import);
            continue;
        }
        walk_nested(stmt, &mut |inner| {
            if let Some(skipped) = import_statement(inner, module) {
                warn!(
                    import = %skipped.text,
                    "Skipping import nested in a block of '{}'; it is not copied to the handler",
                    entry.name
                );
            }
        });
    }
    imports
}

fn import_statement(stmt: &Stmt, module: &LoadedModule) -> Option<ImportStatement> {
    let (kind, range) = match stmt {
        Stmt::ImportFrom(import) => (ImportKind::From, import.range),
        Stmt::Import(import) => (ImportKind::Plain, import.range),
        _ => return None,
    };
    Some(ImportStatement {
        kind,
        text: module.slice(range).trim().to_string(),
    })
}

/// Introspect the named entry point of a loaded module.
pub fn describe_entry_point(
    module: &LoadedModule,
    name: &str,
) -> Result<EntryPointDescriptor, GenerationError> {
    let entry =
        find_entry_point(module, name).ok_or_else(|| GenerationError::MissingEntryPoint {
            name: name.to_string(),
            path: module.path.clone(),
        })?;

    let parameters = extract_parameters(&entry);
    if let Some(name) = parameters
        .iter()
        .find(|p| HANDLER_RESERVED_NAMES.contains(&p.as_str()))
    {
        return Err(GenerationError::ReservedParameter {
            name: name.clone(),
            entry_point: entry.name.to_string(),
            path: module.path.clone(),
        });
    }

    Ok(EntryPointDescriptor {
        parameters,
        return_expression: extract_return_expression(&entry, module),
        imports: extract_import_lines(&entry, module),
    })
}

// True when the whole expression sits inside one pair of parentheses, as in
// `(a, b)` but not `(a), b`. Tokens are used so parentheses inside string
// literals do not count.
fn is_parenthesized(expression: &str) -> bool {
    let mut tokens = lexer::lex(expression, Mode::Expression)
        .filter_map(Result::ok)
        .map(|(tok, _)| tok);
    if !matches!(tokens.next(), Some(Tok::Lpar)) {
        return false;
    }

    let mut depth = 1usize;
    for tok in tokens.by_ref() {
        match tok {
            Tok::Lpar => depth += 1,
            Tok::Rpar => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
    }
    depth == 0 && tokens.all(|tok| matches!(tok, Tok::Newline | Tok::EndOfFile))
}

// Pre-order walk over the statements of one function scope. Nested function
// and class bodies belong to another scope and are not entered.
fn walk_body<'a>(body: &'a [Stmt], visit: &mut dyn FnMut(&'a Stmt)) {
    for stmt in body {
        visit(stmt);
        walk_nested(stmt, visit);
    }
}

// Visit the statements inside the blocks of one compound statement.
fn walk_nested<'a>(stmt: &'a Stmt, visit: &mut dyn FnMut(&'a Stmt)) {
    match stmt {
        Stmt::If(ast::StmtIf { body, orelse, .. })
        | Stmt::While(ast::StmtWhile { body, orelse, .. })
        | Stmt::For(ast::StmtFor { body, orelse, .. })
        | Stmt::AsyncFor(ast::StmtAsyncFor { body, orelse, .. }) => {
            walk_body(body, visit);
            walk_body(orelse, visit);
        }
        Stmt::With(ast::StmtWith { body, .. })
        | Stmt::AsyncWith(ast::StmtAsyncWith { body, .. }) => walk_body(body, visit),
        Stmt::Try(ast::StmtTry {
            body,
            handlers,
            orelse,
            finalbody,
            ..
        })
        | Stmt::TryStar(ast::StmtTryStar {
            body,
            handlers,
            orelse,
            finalbody,
            ..
        }) => {
            walk_body(body, visit);
            for handler in handlers {
                let ast::ExceptHandler::ExceptHandler(handler) = handler;
                walk_body(&handler.body, visit);
            }
            walk_body(orelse, visit);
            walk_body(finalbody, visit);
        }
        Stmt::Match(ast::StmtMatch { cases, .. }) => {
            for case in cases {
                walk_body(&case.body, visit);
            }
        }
        _ => {}
    }
}
