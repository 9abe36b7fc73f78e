//! Engine configuration and component manifests, loadable from TOML
//!
//! One settings file carries an optional `[engine]` table and any number of
//! `[[components]]` entries:
//!
//! ```toml
//! [engine]
//! context_behavior = "isolated"
//! templates_dir = "templates"
//!
//! [[components]]
//! name = "card"
//! template = "card.html"
//! params = ["title"]
//!
//! [components.defaults]
//! tone = "plain"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::component::{ComponentRegistry, RegistryError, TemplateComponent};
use crate::context::ContextBehavior;
use crate::template::TemplateError;
use crate::value::Value;

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid component '{name}': {message}")]
    InvalidComponent { name: String, message: String },
    #[error("Invalid component template: {0}")]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Options controlling how components render
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Whether component templates see the caller's variables
    pub context_behavior: ContextBehavior,

    /// Reject fills for slots the component never declares
    pub strict_slots: bool,

    /// Maximum nesting of components, includes and extends
    pub max_depth: usize,

    /// Directory that file-based templates are loaded from
    pub templates_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            context_behavior: ContextBehavior::Django,
            strict_slots: false,
            max_depth: 64,
            templates_dir: None,
        }
    }
}

/// A component declared in a settings file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComponentEntry {
    pub name: String,
    /// Template file name, resolved against `templates_dir`
    pub template: Option<String>,
    /// Template source
    pub inline: Option<String>,
    /// Required parameters, in positional order
    #[serde(default)]
    pub params: Vec<String>,
    /// Optional parameters with their defaults
    #[serde(default)]
    pub defaults: BTreeMap<String, Value>,
}

impl ComponentEntry {
    /// Build the component this entry describes
    pub fn build(&self) -> Result<TemplateComponent, ConfigError> {
        let mut component = match (&self.template, &self.inline) {
            (Some(file), None) => TemplateComponent::file(file.as_str()),
            (None, Some(source)) => TemplateComponent::inline(source)?,
            _ => {
                return Err(ConfigError::InvalidComponent {
                    name: self.name.clone(),
                    message: "needs exactly one of `template` or `inline`".to_string(),
                })
            }
        };
        for param in &self.params {
            component = component.param(param.as_str());
        }
        for (name, default) in &self.defaults {
            component = component.optional(name.as_str(), default.clone());
        }
        Ok(component)
    }
}

/// Everything read from one settings file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub components: Vec<ComponentEntry>,
}

impl Settings {
    /// Load from a TOML file
    ///
    /// A relative `templates_dir` resolves against the file's directory; without
    /// one, templates are looked up next to the file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut settings = Self::from_str(&content)?;
        if let Some(parent) = path.parent() {
            let dir = match settings.engine.templates_dir.take() {
                Some(dir) if dir.is_relative() => parent.join(dir),
                Some(dir) => dir,
                None => parent.to_path_buf(),
            };
            settings.engine.templates_dir = Some(dir);
        }
        Ok(settings)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Build every `[[components]]` entry and add it to `registry`
    pub fn register_components(&self, registry: &ComponentRegistry) -> Result<(), ConfigError> {
        for entry in &self.components {
            registry.register(entry.name.as_str(), entry.build()?)?;
        }
        Ok(())
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the `[engine]` table of a settings file (see [`Settings::from_file`])
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Settings::from_file(path).map(|settings| settings.engine)
    }

    /// Load from a TOML string with an optional `[engine]` table
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Settings::from_str(content).map(|settings| settings.engine)
    }

    /// Set the context behavior
    pub fn with_context_behavior(mut self, behavior: ContextBehavior) -> Self {
        self.context_behavior = behavior;
        self
    }

    /// Enable or disable strict slot checking
    pub fn with_strict_slots(mut self, strict: bool) -> Self {
        self.strict_slots = strict;
        self
    }

    /// Set the nesting limit
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the directory for file-based templates
    pub fn with_templates_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.templates_dir = Some(dir.into());
        self
    }
}
