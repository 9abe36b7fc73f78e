//! Scoped provide/inject of dependency values

use crate::render::RenderError;
use crate::value::Value;

/// Stack of provided values for one top-level render
///
/// `provide` blocks push on entry and truncate back to their mark on exit,
/// so a nested provision of the same key shadows the outer one only for
/// its own subtree.
#[derive(Debug, Clone, Default)]
pub struct InjectionScope {
    entries: Vec<(String, Value)>,
}

impl InjectionScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current stack height, to restore with [`InjectionScope::restore`]
    pub fn mark(&self) -> usize {
        self.entries.len()
    }

    pub fn provide(&mut self, key: impl Into<String>, value: Value) {
        self.entries.push((key.into(), value));
    }

    /// Drop every provision made since `mark`
    pub fn restore(&mut self, mark: usize) {
        self.entries.truncate(mark);
    }

    /// The nearest enclosing provision for `key`
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    pub fn injector(&self) -> Injector<'_> {
        Injector { scope: self }
    }
}

/// Read-only view of the provisions visible to a component's data step
#[derive(Debug, Clone, Copy)]
pub struct Injector<'a> {
    scope: &'a InjectionScope,
}

impl Injector<'_> {
    /// Look up a provided value; fails if nothing encloses the caller
    pub fn inject(&self, key: &str) -> Result<Value, RenderError> {
        self.scope
            .lookup(key)
            .cloned()
            .ok_or_else(|| RenderError::MissingInjection {
                key: key.to_string(),
            })
    }

    /// Look up a provided value, falling back to `default`
    pub fn inject_or(&self, key: &str, default: impl Into<Value>) -> Value {
        self.scope
            .lookup(key)
            .cloned()
            .unwrap_or_else(|| default.into())
    }
}
