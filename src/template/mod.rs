//! Parsed templates and the named template store
//!
//! A [`Template`] is an immutable node tree plus the parent it extends, if
//! any. Trees are shared behind `Arc` so one parse serves every render on
//! every thread.

mod store;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::parser::{self, Expr, Node, NodeList, Span, Spanned};
use crate::ParseError;

pub use store::TemplateStore;

/// Errors that can occur while loading or preparing templates
#[derive(Debug, Error)]
pub enum TemplateError {
    /// No template registered or on disk under this name
    #[error("template not found: {name}")]
    NotFound { name: String },

    /// Source failed to parse
    #[error("failed to parse template {name}: {}", first_message(.errors))]
    Parse {
        name: String,
        source_text: Arc<str>,
        errors: Vec<ParseError>,
    },

    /// Error reading a template file
    #[error("error reading template file {path}: {message}")]
    FileReadError { path: PathBuf, message: String },

    /// `extends` somewhere other than the first tag of the template
    #[error("{{% extends %}} must be the first tag in template {name}")]
    MisplacedExtends { name: String, span: Span },

    /// A template that (indirectly) extends itself
    #[error("circular template inheritance detected: {chain}")]
    CircularExtends { chain: String },
}

fn first_message(errors: &[ParseError]) -> String {
    errors
        .first()
        .map(|e| e.to_string())
        .unwrap_or_else(|| "unknown error".to_string())
}

impl TemplateError {
    /// Render parse errors with source context; other errors use their message
    pub fn report(&self) -> String {
        match self {
            TemplateError::Parse {
                name,
                source_text,
                errors,
            } => errors
                .iter()
                .map(|e| e.format(source_text, name))
                .collect::<Vec<_>>()
                .join("\n"),
            other => other.to_string(),
        }
    }
}

/// Display name used for templates that were not loaded by name
pub const INLINE_NAME: &str = "<inline>";

/// A parsed template
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// Registered name; `None` for inline sources
    pub name: Option<String>,
    pub nodes: NodeList,
    /// Expression naming the parent template
    pub parent: Option<Spanned<Expr>>,
}

impl Template {
    /// Parse and validate template source
    pub fn parse(name: Option<&str>, source: &str) -> Result<Self, TemplateError> {
        let display = name.unwrap_or(INLINE_NAME);
        let nodes = parser::parse(source).map_err(|errors| TemplateError::Parse {
            name: display.to_string(),
            source_text: Arc::from(source),
            errors,
        })?;
        let parent = find_parent(display, &nodes)?;
        Ok(Self {
            name: name.map(str::to_string),
            nodes,
            parent,
        })
    }

    /// Name for diagnostics
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(INLINE_NAME)
    }
}

/// The `extends` tag is only honoured as the first non-blank top-level node
fn find_parent(name: &str, nodes: &NodeList) -> Result<Option<Spanned<Expr>>, TemplateError> {
    let mut parent = None;
    let mut seen_content = false;

    for node in nodes.iter() {
        match &node.node {
            Node::Extends(expr) if !seen_content && parent.is_none() => {
                parent = Some(expr.clone());
            }
            Node::Extends(_) => {
                return Err(TemplateError::MisplacedExtends {
                    name: name.to_string(),
                    span: node.span.clone(),
                })
            }
            other => {
                if !other.is_blank() {
                    seen_content = true;
                }
                if let Some(span) = nested_extends(other) {
                    return Err(TemplateError::MisplacedExtends {
                        name: name.to_string(),
                        span,
                    });
                }
            }
        }
    }

    Ok(parent)
}

fn nested_extends(node: &Node) -> Option<Span> {
    node.children().into_iter().find_map(|list| {
        list.iter().find_map(|child| match &child.node {
            Node::Extends(_) => Some(child.span.clone()),
            other => nested_extends(other),
        })
    })
}
