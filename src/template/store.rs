//! Thread-safe cache of named templates

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use log::debug;

use super::{Template, TemplateError};

/// Named templates, parsed once and shared across renders
///
/// Templates are either added from source or loaded lazily from the base
/// directory the first time they are requested.
#[derive(Debug, Default)]
pub struct TemplateStore {
    templates: RwLock<HashMap<String, Arc<Template>>>,
    /// Base path for resolving template names to files
    base_path: Option<PathBuf>,
}

impl TemplateStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that loads missing templates from `base_path`
    pub fn with_base_path(base_path: PathBuf) -> Self {
        Self {
            templates: RwLock::new(HashMap::new()),
            base_path: Some(base_path),
        }
    }

    /// Resolve a template name to a file path
    pub fn resolve_path(&self, name: &str) -> PathBuf {
        if let Some(base) = &self.base_path {
            base.join(name)
        } else {
            PathBuf::from(name)
        }
    }

    /// Parse `source` and store it under `name`, replacing any previous entry
    pub fn add(&self, name: &str, source: &str) -> Result<Arc<Template>, TemplateError> {
        let template = Arc::new(Template::parse(Some(name), source)?);
        self.templates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), Arc::clone(&template));
        Ok(template)
    }

    /// Get a template by name, loading it from the base path if needed
    pub fn get(&self, name: &str) -> Result<Arc<Template>, TemplateError> {
        if let Some(template) = self
            .templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Ok(Arc::clone(template));
        }

        if self.base_path.is_none() {
            return Err(TemplateError::NotFound {
                name: name.to_string(),
            });
        }
        self.load(name)
    }

    fn load(&self, name: &str) -> Result<Arc<Template>, TemplateError> {
        let path = self.resolve_path(name);
        if !path.is_file() {
            return Err(TemplateError::NotFound {
                name: name.to_string(),
            });
        }

        let source = std::fs::read_to_string(&path).map_err(|e| TemplateError::FileReadError {
            path: path.clone(),
            message: e.to_string(),
        })?;

        debug!("Loaded template {} from {}", name, path.display());
        self.add(name, &source)
    }

    /// Check if a template is already cached
    pub fn contains(&self, name: &str) -> bool {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Names of cached templates, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}
