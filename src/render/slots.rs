//! Slot/fill resolution state for one component call

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::parser::{Node, NodeList};
use crate::render::{Frame, RenderError};

/// Name under which implicit body content is stored
pub const DEFAULT_FILL: &str = "default";

/// Caller-supplied content for one slot, with the frame it must render in
#[derive(Debug, Clone)]
pub struct Fill {
    pub name: String,
    pub data: Option<String>,
    pub default: Option<String>,
    pub body: NodeList,
    pub frame: Frame,
}

/// The fills of one component call and what the render has done with them
#[derive(Debug)]
pub struct SlotScope {
    pub component: String,
    fills: HashMap<String, Fill>,
    consumed: RefCell<HashSet<String>>,
    default_slot: RefCell<Option<String>>,
}

impl SlotScope {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            fills: HashMap::new(),
            consumed: RefCell::new(HashSet::new()),
            default_slot: RefCell::new(None),
        }
    }

    /// Add a fill; names must be unique within one call
    pub fn add_fill(&mut self, fill: Fill) -> Result<(), RenderError> {
        if self.fills.contains_key(&fill.name) {
            return Err(RenderError::DuplicateFill {
                component: self.component.clone(),
                name: fill.name,
            });
        }
        self.fills.insert(fill.name.clone(), fill);
        Ok(())
    }

    /// Find the fill for a slot and mark it consumed
    ///
    /// A slot flagged `default` also accepts the implicit body content.
    pub fn take(&self, name: &str, is_default: bool) -> Result<Option<&Fill>, RenderError> {
        if is_default {
            let mut current = self.default_slot.borrow_mut();
            match current.as_deref() {
                Some(first) if first != name => {
                    return Err(RenderError::MultipleDefaultSlots {
                        component: self.component.clone(),
                        first: first.to_string(),
                        second: name.to_string(),
                    })
                }
                Some(_) => {}
                None => *current = Some(name.to_string()),
            }
        }

        let found = self
            .fills
            .get(name)
            .or_else(|| is_default.then(|| self.fills.get(DEFAULT_FILL)).flatten());
        if let Some(fill) = found {
            self.consumed.borrow_mut().insert(fill.name.clone());
        }
        Ok(found)
    }

    /// Fill names that no rendered slot asked for, sorted
    pub fn unconsumed(&self) -> Vec<&str> {
        let consumed = self.consumed.borrow();
        let mut names: Vec<&str> = self
            .fills
            .keys()
            .filter(|name| !consumed.contains(*name))
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.fills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fills.is_empty()
    }
}

/// Slots a component's template chain declares anywhere, reached or not
#[derive(Debug, Default, PartialEq)]
pub struct DeclaredSlots {
    pub names: HashSet<String>,
    pub has_default: bool,
}

impl DeclaredSlots {
    /// Whether a fill with this name could ever be consumed
    pub fn accepts(&self, fill: &str) -> bool {
        self.names.contains(fill) || (fill == DEFAULT_FILL && self.has_default)
    }

    /// Record slots in `nodes`, returning statically named templates to scan next
    pub fn scan(&mut self, nodes: &NodeList) -> Vec<String> {
        let mut linked = Vec::new();
        self.scan_into(nodes, &mut linked);
        linked
    }

    fn scan_into(&mut self, nodes: &NodeList, linked: &mut Vec<String>) {
        for node in nodes.iter() {
            match &node.node {
                Node::Slot(slot) => {
                    self.names.insert(slot.name.clone());
                    self.has_default |= slot.is_default;
                }
                Node::Extends(expr) => {
                    if let Some(name) = expr.node.as_str_literal() {
                        linked.push(name.to_string());
                    }
                }
                Node::Include(include) => {
                    if let Some(name) = include.template.as_str_literal() {
                        linked.push(name.to_string());
                    }
                }
                _ => {}
            }
            for child in node.node.children() {
                self.scan_into(child, linked);
            }
        }
    }
}
