//! Abstract Syntax Tree types for the template language

use std::sync::Arc;

use crate::value::Value;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// An immutable sequence of nodes, shared between renders and threads
pub type NodeList = Arc<[Spanned<Node>]>;

/// A single element of a parsed template
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text between tags
    Text(String),
    /// Variable output: `{{ expr|filter }}`
    Output(Expr),
    /// Library load: `{% load component_tags %}` (renders nothing)
    Load(Vec<String>),
    If(IfNode),
    For(ForNode),
    With(WithNode),
    /// Parent template reference: `{% extends "base.html" %}`
    Extends(Spanned<Expr>),
    Block(BlockNode),
    Include(IncludeNode),
    Component(ComponentNode),
    Slot(SlotNode),
    Provide(ProvideNode),
}

impl Node {
    /// Whitespace-only text and loads carry no content of their own
    pub fn is_blank(&self) -> bool {
        match self {
            Node::Text(text) => text.trim().is_empty(),
            Node::Load(_) => true,
            _ => false,
        }
    }

    /// Nested node lists in source order, fill bodies included
    pub fn children(&self) -> Vec<&NodeList> {
        match self {
            Node::If(node) => node
                .branches
                .iter()
                .map(|(_, body)| body)
                .chain(node.otherwise.iter())
                .collect(),
            Node::For(node) => std::iter::once(&node.body).chain(node.empty.iter()).collect(),
            Node::With(node) => vec![&node.body],
            Node::Block(node) => vec![&node.body],
            Node::Slot(node) => vec![&node.body],
            Node::Provide(node) => vec![&node.body],
            Node::Component(node) => match &node.body {
                ComponentBody::Empty => Vec::new(),
                ComponentBody::Fills(fills) => fills.iter().map(|f| &f.node.body).collect(),
                ComponentBody::Default(body) => vec![body],
            },
            Node::Text(_)
            | Node::Output(_)
            | Node::Load(_)
            | Node::Extends(_)
            | Node::Include(_) => Vec::new(),
        }
    }
}

/// A value expression with an optional filter chain
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub operand: Operand,
    pub filters: Vec<Filter>,
}

impl Expr {
    pub fn literal(value: impl Into<Value>) -> Self {
        Self {
            operand: Operand::Literal(value.into()),
            filters: Vec::new(),
        }
    }

    pub fn variable(path: &str) -> Self {
        Self {
            operand: Operand::Variable(path.split('.').map(str::to_string).collect()),
            filters: Vec::new(),
        }
    }

    /// The literal string this expression stands for, if it is a plain string literal
    pub fn as_str_literal(&self) -> Option<&str> {
        match (&self.operand, self.filters.is_empty()) {
            (Operand::Literal(Value::String(s)), true) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The bare identifier this expression stands for, if it is one
    pub fn as_bare_identifier(&self) -> Option<&str> {
        match (&self.operand, self.filters.is_empty()) {
            (Operand::Variable(path), true) if path.len() == 1 => Some(path[0].as_str()),
            _ => None,
        }
    }
}

/// The head of an expression before any filters
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Value),
    /// Dotted lookup path: `user.name`, `items.0`
    Variable(Vec<String>),
    /// Translation marker: `_("text")`
    Translated(String),
    /// A string literal containing template tags, rendered in the caller's context
    Template(NodeList),
}

/// Built-in output filters
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Upper,
    Lower,
    Title,
    Length,
    Safe,
    Escape,
    Default(Operand),
    Join(Operand),
}

/// Condition of an `if`/`elif` branch
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Test(Expr),
    Not(Box<Condition>),
    Equal(Expr, Expr),
    NotEqual(Expr, Expr),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfNode {
    pub branches: Vec<(Condition, NodeList)>,
    pub otherwise: Option<NodeList>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForNode {
    pub variable: String,
    pub iterable: Expr,
    pub body: NodeList,
    pub empty: Option<NodeList>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithNode {
    pub bindings: Vec<(String, Expr)>,
    pub body: NodeList,
}

/// Overridable region: `{% block name %}...{% endblock %}`
#[derive(Debug, Clone, PartialEq)]
pub struct BlockNode {
    pub name: String,
    pub body: NodeList,
}

/// `{% include "name" with a=b only %}`
#[derive(Debug, Clone, PartialEq)]
pub struct IncludeNode {
    pub template: Expr,
    pub bindings: Vec<(String, Expr)>,
    pub only: bool,
}

/// A component call site: `{% component "name" args kwargs %}...{% endcomponent %}`
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentNode {
    pub name: Expr,
    pub args: Vec<Expr>,
    pub kwargs: Vec<(String, Expr)>,
    /// Render in an isolated context regardless of configuration
    pub only: bool,
    pub body: ComponentBody,
}

/// What a call site supplies for the component's slots
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentBody {
    /// Self-closing tag or whitespace-only body
    Empty,
    /// Explicit `{% fill %}` tags
    Fills(Vec<Spanned<FillNode>>),
    /// Raw content for the slot flagged `default`
    Default(NodeList),
}

/// Content for one named slot: `{% fill "name" data="d" default="df" %}`
#[derive(Debug, Clone, PartialEq)]
pub struct FillNode {
    pub name: Expr,
    /// Variable bound to the slot's data within the fill body
    pub data: Option<String>,
    /// Variable bound to the slot's rendered default content within the fill body
    pub default: Option<String>,
    pub body: NodeList,
}

/// A placeholder in a component template: `{% slot "name" default required k=v %}`
#[derive(Debug, Clone, PartialEq)]
pub struct SlotNode {
    pub name: String,
    pub is_default: bool,
    pub required: bool,
    /// Data exposed to the filling content
    pub kwargs: Vec<(String, Expr)>,
    pub body: NodeList,
}

/// `{% provide "key" k=v %}...{% endprovide %}`
#[derive(Debug, Clone, PartialEq)]
pub struct ProvideNode {
    pub key: String,
    pub kwargs: Vec<(String, Expr)>,
    pub body: NodeList,
}
