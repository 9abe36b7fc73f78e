//! Shared helpers for integration tests

#![allow(dead_code)]

use std::path::PathBuf;

use slotted::{ContextBehavior, Engine, EngineConfig, TemplateComponent};

pub const BEHAVIORS: [ContextBehavior; 2] = [ContextBehavior::Django, ContextBehavior::Isolated];

pub fn templates_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/templates")
}

/// Engine loading fixtures from `tests/templates`
pub fn engine(behavior: ContextBehavior) -> Engine {
    Engine::with_config(
        EngineConfig::new()
            .with_context_behavior(behavior)
            .with_templates_dir(templates_dir()),
    )
}

/// Engine with `slotted_component` registered
pub fn slotted_engine(behavior: ContextBehavior) -> Engine {
    let engine = engine(behavior);
    engine
        .registry()
        .register(
            "slotted_component",
            TemplateComponent::file("slotted_template.html"),
        )
        .expect("Should register slotted_component");
    engine
}

pub fn inline(source: &str) -> TemplateComponent {
    TemplateComponent::inline(source).expect("Component template should parse")
}

/// Collapse whitespace so markup compares structurally
pub fn normalize_html(html: &str) -> String {
    let collapsed = html.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.replace("> ", ">").replace(" <", "<").trim().to_string()
}
