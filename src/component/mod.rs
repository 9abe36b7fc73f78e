//! Component definitions
//!
//! A component pairs a template with a data-building step. Call sites pass
//! arguments, which are bound against the component's [`Signature`] and
//! handed to [`Component::context_data`] together with an [`Injector`] for
//! values provided further up the render tree.

mod injection;
mod registry;
mod signature;

use std::fmt;
use std::sync::Arc;

use crate::context::Data;
use crate::render::RenderError;
use crate::template::{Template, TemplateError};

pub use injection::{InjectionScope, Injector};
pub use registry::{ComponentRegistry, RegistryError};
pub use signature::{ArgumentError, BoundArgs, Param, Signature};

/// Where a component's template comes from
#[derive(Debug, Clone)]
pub enum TemplateSource {
    /// Name resolved through the engine's template store
    File(String),
    /// Source parsed when the component was defined
    Inline(Arc<Template>),
}

/// A reusable template unit with its own data-building step
pub trait Component: Send + Sync {
    fn template(&self) -> TemplateSource;

    /// Parameters accepted at the call site
    fn signature(&self) -> Signature {
        Signature::new()
    }

    /// Build the variables the template renders with
    fn context_data(&self, args: &BoundArgs, injector: &Injector<'_>) -> Result<Data, RenderError> {
        let _ = injector;
        Ok(args.to_data())
    }
}

type DataFn = dyn Fn(&BoundArgs, &Injector<'_>) -> Result<Data, RenderError> + Send + Sync;

/// A component assembled from a template, parameters and an optional data closure
///
/// ```
/// use slotted::{TemplateComponent, Value};
///
/// let card = TemplateComponent::file("card.html")
///     .param("title")
///     .optional("subtitle", Value::None);
/// ```
#[derive(Clone)]
pub struct TemplateComponent {
    source: TemplateSource,
    signature: Signature,
    data: Option<Arc<DataFn>>,
}

impl fmt::Debug for TemplateComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateComponent")
            .field("source", &self.source)
            .field("signature", &self.signature)
            .field("data", &self.data.is_some())
            .finish()
    }
}

impl TemplateComponent {
    /// Component whose template is looked up by name at render time
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            source: TemplateSource::File(name.into()),
            signature: Signature::new(),
            data: None,
        }
    }

    /// Component with an inline template, parsed immediately
    pub fn inline(source: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            source: TemplateSource::Inline(Arc::new(Template::parse(None, source)?)),
            signature: Signature::new(),
            data: None,
        })
    }

    /// Add a required parameter
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.signature = self.signature.required(name);
        self
    }

    /// Add a parameter with a default
    pub fn optional(mut self, name: impl Into<String>, default: impl Into<crate::Value>) -> Self {
        self.signature = self.signature.optional(name, default);
        self
    }

    /// Accept keyword arguments beyond the declared parameters
    pub fn extra_kwargs(mut self) -> Self {
        self.signature = self.signature.with_extra_kwargs();
        self
    }

    /// Replace the default data step (bound arguments passed through unchanged)
    pub fn with_data<F>(mut self, f: F) -> Self
    where
        F: Fn(&BoundArgs, &Injector<'_>) -> Result<Data, RenderError> + Send + Sync + 'static,
    {
        self.data = Some(Arc::new(f));
        self
    }
}

impl Component for TemplateComponent {
    fn template(&self) -> TemplateSource {
        self.source.clone()
    }

    fn signature(&self) -> Signature {
        self.signature.clone()
    }

    fn context_data(&self, args: &BoundArgs, injector: &Injector<'_>) -> Result<Data, RenderError> {
        match &self.data {
            Some(f) => f(args, injector),
            None => Ok(args.to_data()),
        }
    }
}
