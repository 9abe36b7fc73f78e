//! Block overrides for one template unit
//!
//! Every rendered unit (a top-level template, an included template or a
//! component's template) builds its own [`BlockContext`] from its `extends`
//! chain. Overrides never travel across unit boundaries, so a block named
//! `body` outside a component cannot replace a `body` block inside it.

use std::collections::HashMap;

use crate::parser::{Node, NodeList};

/// Resolved block bodies, most derived definition first
#[derive(Debug, Clone, Default)]
pub struct BlockContext {
    blocks: HashMap<String, NodeList>,
}

impl BlockContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from node trees ordered child first; the first definition of a name wins
    pub fn from_chain<'a>(chain: impl IntoIterator<Item = &'a NodeList>) -> Self {
        let mut context = Self::new();
        for nodes in chain {
            context.collect(nodes);
        }
        context
    }

    fn collect(&mut self, nodes: &NodeList) {
        for node in nodes.iter() {
            if let Node::Block(block) = &node.node {
                self.blocks
                    .entry(block.name.clone())
                    .or_insert_with(|| block.body.clone());
            }
            for child in node.node.children() {
                self.collect(child);
            }
        }
    }

    /// The body to render for block `name`, if any unit in the chain defines it
    pub fn get(&self, name: &str) -> Option<&NodeList> {
        self.blocks.get(name)
    }
}
