//! Errors raised while rendering

use thiserror::Error;

use crate::component::ArgumentError;
use crate::template::TemplateError;

/// Errors that abort a render
#[derive(Debug, Error)]
pub enum RenderError {
    /// Component name not present in the registry
    #[error("component not registered: {name}")]
    ComponentNotFound { name: String },

    /// Call-site arguments do not match the component's parameters
    #[error("invalid arguments for component {component}: {source}")]
    Arguments {
        component: String,
        #[source]
        source: ArgumentError,
    },

    /// Two fills for the same slot in one call
    #[error("multiple fills for slot '{name}' in component {component}")]
    DuplicateFill { component: String, name: String },

    /// A required slot rendered without a fill
    #[error("slot '{name}' of component {component} is required but was not filled")]
    MissingRequiredSlot { component: String, name: String },

    /// Two differently named slots both flagged `default`
    #[error("component {component} declares multiple default slots: '{first}' and '{second}'")]
    MultipleDefaultSlots {
        component: String,
        first: String,
        second: String,
    },

    /// Fill for a slot the component never declares (strict mode only)
    #[error("component {component} has no slot named '{name}'")]
    UnknownSlot { component: String, name: String },

    /// `slot` rendered outside of any component template
    #[error("slot '{name}' used outside of a component")]
    SlotOutsideComponent { name: String },

    /// `inject` for a key with no enclosing `provide`
    #[error("no value provided for key '{key}'")]
    MissingInjection { key: String },

    /// Nesting exceeded the configured depth
    #[error("maximum render depth of {limit} exceeded")]
    RecursionLimit { limit: usize },

    /// A component's data step failed
    #[error("failed to build data for component {component}: {message}")]
    ComponentData { component: String, message: String },

    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl RenderError {
    pub fn component_data(component: impl Into<String>, message: impl Into<String>) -> Self {
        RenderError::ComponentData {
            component: component.into(),
            message: message.into(),
        }
    }
}
