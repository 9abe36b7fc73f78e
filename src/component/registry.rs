//! Registry mapping component names to definitions

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use log::debug;
use thiserror::Error;

use super::Component;

/// Errors that can occur during registry operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    /// A component is already registered under this name
    #[error("component already registered: {name}")]
    AlreadyRegistered { name: String },

    /// No component registered under this name
    #[error("component not registered: {name}")]
    NotRegistered { name: String },
}

/// Named component definitions shared by every render
///
/// Reads run concurrently; `register`, `unregister` and `clear` take the
/// write lock. Share one registry between engines with `Arc`.
#[derive(Default)]
pub struct ComponentRegistry {
    components: RwLock<HashMap<String, Arc<dyn Component>>>,
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("components", &self.names())
            .finish()
    }
}

impl ComponentRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component under `name`
    pub fn register(
        &self,
        name: impl Into<String>,
        component: impl Component + 'static,
    ) -> Result<(), RegistryError> {
        self.register_arc(name, Arc::new(component))
    }

    /// Register an already shared component
    pub fn register_arc(
        &self,
        name: impl Into<String>,
        component: Arc<dyn Component>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        let mut components = self
            .components
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if components.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered { name });
        }
        debug!("Registered component {}", name);
        components.insert(name, component);
        Ok(())
    }

    /// Remove a component
    pub fn unregister(&self, name: &str) -> Result<(), RegistryError> {
        self.components
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| RegistryError::NotRegistered {
                name: name.to_string(),
            })
    }

    /// Get a component by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Component>> {
        self.components
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Check if a component exists
    pub fn contains(&self, name: &str) -> bool {
        self.components
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// All registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .components
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Remove every component
    pub fn clear(&self) {
        self.components
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.components
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
