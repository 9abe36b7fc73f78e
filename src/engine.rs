//! The engine ties configuration, templates and components together

use std::sync::Arc;

use crate::component::ComponentRegistry;
use crate::config::EngineConfig;
use crate::context::Context;
use crate::render::{RenderError, Rendered, Renderer};
use crate::template::{Template, TemplateError, TemplateStore};

/// Entry point for rendering templates with components
///
/// An engine is `Sync`; every call to one of the render methods gets its own
/// injection stack, so one engine can serve concurrent requests.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    templates: TemplateStore,
    registry: Arc<ComponentRegistry>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create an engine with the default configuration and an empty registry
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_registry(config, Arc::new(ComponentRegistry::new()))
    }

    /// Create an engine sharing an existing registry
    pub fn with_registry(config: EngineConfig, registry: Arc<ComponentRegistry>) -> Self {
        let templates = match &config.templates_dir {
            Some(dir) => TemplateStore::with_base_path(dir.clone()),
            None => TemplateStore::new(),
        };
        Self {
            config,
            templates,
            registry,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    /// Parse `source` and make it available under `name`
    pub fn add_template(&self, name: &str, source: &str) -> Result<Arc<Template>, TemplateError> {
        self.templates.add(name, source)
    }

    /// Get a named template, loading it from the templates directory if needed
    pub fn get_template(&self, name: &str) -> Result<Arc<Template>, TemplateError> {
        self.templates.get(name)
    }

    /// Parse an unnamed template
    pub fn parse(&self, source: &str) -> Result<Template, TemplateError> {
        Template::parse(None, source)
    }

    pub fn render(&self, template: &Template, context: Context) -> Result<Rendered, RenderError> {
        Renderer::new(&self.config, &self.templates, &self.registry).render(template, context)
    }

    pub fn render_template(&self, name: &str, context: Context) -> Result<Rendered, RenderError> {
        let template = self.get_template(name)?;
        self.render(&template, context)
    }

    pub fn render_str(&self, source: &str, context: Context) -> Result<Rendered, RenderError> {
        let template = self.parse(source)?;
        self.render(&template, context)
    }
}
