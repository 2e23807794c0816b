//! Checkpoint evaluation
//!
//! Checkpoints and request bodies are written in the workbook as small
//! expressions, for example `resp['msg'] == 'success' and len(resp['data']) > 0`.
//! They are parsed and evaluated by a sandboxed interpreter over JSON
//! values: the only names visible are the ones bound in the [`Scope`], and
//! the only callable functions are a fixed set of built-ins (`len`, `str`,
//! `int`, `role_id`, `export_rows`).

mod eval;
mod lexer;
mod parser;

pub use eval::{loose_eq, render, truthy};
pub use parser::Expr;

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Category of an evaluation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalErrorKind {
    /// The expression text does not parse
    Syntax,
    /// An unbound name or unknown function
    Name,
    /// A missing mapping key or an out-of-range index
    Key,
    /// An operation applied to values of the wrong type
    Type,
    /// A file read by a built-in could not be opened or parsed
    Io,
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalErrorKind::Syntax => write!(f, "SyntaxError"),
            EvalErrorKind::Name => write!(f, "NameError"),
            EvalErrorKind::Key => write!(f, "KeyError"),
            EvalErrorKind::Type => write!(f, "TypeError"),
            EvalErrorKind::Io => write!(f, "IOError"),
        }
    }
}

/// An expression failed to parse or evaluate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub message: String,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind, message: String) -> Self {
        Self { kind, message }
    }
}

/// Names visible to an expression
#[derive(Debug, Clone, Default)]
pub struct Scope {
    bindings: HashMap<String, Value>,
    /// Export files saved for this check, readable by `export_rows`
    exports: HashMap<String, PathBuf>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, replacing any previous value
    pub fn bind(mut self, name: &str, value: Value) -> Self {
        self.bindings.insert(name.to_string(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Record that the export file `name` was saved at `path`
    pub fn bind_export(mut self, name: &str, path: PathBuf) -> Self {
        self.exports.insert(name.to_string(), path);
        self
    }

    pub fn export_path(&self, name: &str) -> Option<&Path> {
        self.exports.get(name).map(PathBuf::as_path)
    }
}

/// A parsed expression, ready to evaluate against any scope
#[derive(Debug, Clone)]
pub struct Expression {
    tree: Expr,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self, EvalError> {
        Ok(Self {
            tree: parser::parse(source)?,
        })
    }

    /// Evaluate to a value
    pub fn evaluate(&self, scope: &Scope) -> Result<Value, EvalError> {
        eval::evaluate(&self.tree, scope)
    }

    /// Evaluate and reduce the result to its truthiness
    pub fn check(&self, scope: &Scope) -> Result<bool, EvalError> {
        self.evaluate(scope).map(|value| truthy(&value))
    }
}

/// Parse and evaluate `source` in one step
pub fn evaluate(source: &str, scope: &Scope) -> Result<Value, EvalError> {
    Expression::parse(source)?.evaluate(scope)
}

/// Whether response text is shaped like an object literal: `{`, anything
/// without a colon, a colon, then the rest of one line closed by `}`
pub fn looks_like_object(text: &str) -> bool {
    let body = text.strip_suffix('\n').unwrap_or(text);
    let Some(inner) = body.strip_prefix('{') else {
        return false;
    };
    match inner.find(':') {
        Some(colon) => {
            let rest = &inner[colon + 1..];
            rest.ends_with('}') && !rest.contains('\n')
        }
        None => false,
    }
}

/// Decode response text: object-shaped text is parsed as JSON, anything
/// else (including object-shaped text that is not valid JSON) stays text
pub fn classify_response(text: &str) -> Value {
    if looks_like_object(text) {
        match serde_json::from_str(text) {
            Ok(value) => return value,
            Err(e) => tracing::debug!("Object-shaped response is not JSON ({}), keeping text", e),
        }
    }
    Value::String(text.to_string())
}

/// File name requested by an `export_file == '<name>'` clause
///
/// The clause must sit on a single-line checkpoint; when it appears more
/// than once the last one wins.
pub fn export_target(checkpoint: &str) -> Option<String> {
    const KEYWORD: &str = "export_file";

    let line = checkpoint.strip_suffix('\n').unwrap_or(checkpoint);
    if line.contains('\n') {
        return None;
    }

    line.rmatch_indices(KEYWORD).find_map(|(start, _)| {
        let rest = line[start + KEYWORD.len()..].trim_start_matches(' ');
        let rest = rest.strip_prefix("==")?.trim_start_matches(' ');
        let rest = rest.strip_prefix('\'')?;
        let end = rest.find('\'')?;
        Some(rest[..end].to_string())
    })
}
