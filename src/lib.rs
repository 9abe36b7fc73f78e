//! Slotted - reusable template components with slots, fills and injection
//!
//! This library renders Django-style templates extended with component tags.
//! Components declare named `{% slot %}` placeholders; call sites supply
//! `{% fill %}` content for them. Fill content renders in the caller's scope,
//! component templates render in their own, and `{% block %}` overrides never
//! cross a component boundary.
//!
//! # Example
//!
//! ```rust
//! use slotted::{Context, Engine, TemplateComponent};
//!
//! let engine = Engine::new();
//! let card = TemplateComponent::inline(
//!     "<h1>{{ title }}</h1><div>{% slot \"body\" %}Nothing here{% endslot %}</div>",
//! )
//! .unwrap()
//! .param("title");
//! engine.registry().register("card", card).unwrap();
//!
//! let rendered = engine
//!     .render_str(
//!         "{% component \"card\" title=\"Hello\" %}{% fill \"body\" %}{{ who }}{% endfill %}{% endcomponent %}",
//!         Context::new().with("who", "World"),
//!     )
//!     .unwrap();
//! assert_eq!(rendered.output, "<h1>Hello</h1><div>World</div>");
//! ```

pub mod component;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod parser;
pub mod render;
pub mod template;
pub mod value;

pub use component::{
    ArgumentError, BoundArgs, Component, ComponentRegistry, InjectionScope, Injector,
    RegistryError, Signature, TemplateComponent, TemplateSource,
};
pub use config::{ComponentEntry, ConfigError, EngineConfig, Settings};
pub use context::{Context, ContextBehavior, Data};
pub use engine::Engine;
pub use error::ParseError;
pub use render::{RenderError, Rendered};
pub use template::{Template, TemplateError, TemplateStore};
pub use value::{Record, Value};
