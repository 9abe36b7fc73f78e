//! Rendering contexts and the isolated/inherited scope decision

use std::collections::HashMap;

use serde::Deserialize;

use crate::value::Value;

/// Variables produced by a component's data-building step
pub type Data = HashMap<String, Value>;

/// How much of the caller's context a component template can see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextBehavior {
    /// Component data is layered on top of the caller's variables
    #[default]
    Django,
    /// Component templates see only their own data
    Isolated,
}

/// A stack of variable-binding layers; lookups walk from the innermost layer out
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    layers: Vec<HashMap<String, Value>>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Create a context with a single empty layer
    pub fn new() -> Self {
        Self {
            layers: vec![HashMap::new()],
        }
    }

    /// Create a context whose only layer holds `data`
    pub fn from_data(data: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            layers: vec![data.into_iter().collect()],
        }
    }

    /// Builder-style binding, for constructing contexts inline
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Bind a variable in the innermost layer
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        if let Some(layer) = self.layers.last_mut() {
            layer.insert(key.into(), value.into());
        }
    }

    /// Look up a variable, innermost layer first
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.layers.iter().rev().find_map(|layer| layer.get(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Resolve a dotted path such as `user.name` or `items.0`
    pub fn resolve(&self, path: &[String]) -> Option<&Value> {
        let (head, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.get(head)?, |value, segment| value.attr(segment))
    }

    /// Open a new layer holding `bindings`
    pub fn push_layer(&mut self, bindings: impl IntoIterator<Item = (String, Value)>) {
        self.layers.push(bindings.into_iter().collect());
    }

    /// Close the innermost layer; the base layer is never removed
    pub fn pop(&mut self) -> Option<HashMap<String, Value>> {
        if self.layers.len() > 1 {
            self.layers.pop()
        } else {
            None
        }
    }
}

impl ContextBehavior {
    /// Build the context a component template renders in
    ///
    /// In `Django` mode the caller's variables stay visible beneath the
    /// component's data; in `Isolated` mode only the data is visible.
    /// `force_isolated` corresponds to the `only` flag on the call tag.
    pub fn component_context(self, caller: &Context, data: Data, force_isolated: bool) -> Context {
        match (self, force_isolated) {
            (ContextBehavior::Django, false) => {
                let mut context = caller.clone();
                context.push_layer(data);
                context
            }
            _ => Context::from_data(data),
        }
    }
}
