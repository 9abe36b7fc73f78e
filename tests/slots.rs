//! Slot and fill resolution

mod common;

use pretty_assertions::assert_eq;
use slotted::{Context, ContextBehavior, Engine, EngineConfig, RenderError, TemplateComponent};

use common::{inline, normalize_html, slotted_engine};

fn render(engine: &Engine, source: &str) -> String {
    let rendered = engine
        .render_str(source, Context::new())
        .expect("Should render");
    normalize_html(&rendered.output)
}

#[test]
fn test_fill_only_main_with_empty_defaults() {
    let engine = common::engine(ContextBehavior::Django);
    engine
        .registry()
        .register(
            "slotted",
            TemplateComponent::file("slotted_template_empty_defaults.html"),
        )
        .expect("Should register");

    let output = render(
        &engine,
        r#"{% component "slotted" %}{% fill "main" %}TEST{% endfill %}{% endcomponent %}"#,
    );
    assert_eq!(
        output,
        "<custom-template><header></header><main>TEST</main><footer></footer></custom-template>"
    );
}

#[test]
fn test_unfilled_slots_render_defaults() {
    let engine = slotted_engine(ContextBehavior::Django);
    let output = render(&engine, r#"{% component "slotted_component" / %}"#);
    insta::assert_snapshot!(output, @"<custom-template><header>Default header</header><main>Default main</main><footer>Default footer</footer></custom-template>");
}

#[test]
fn test_fill_replaces_default() {
    let engine = slotted_engine(ContextBehavior::Django);
    let output = render(
        &engine,
        r#"{% component "slotted_component" %}{% fill "header" %}Custom header{% endfill %}{% endcomponent %}"#,
    );
    assert!(output.contains("<header>Custom header</header>"));
    assert!(!output.contains("Default header"));
    assert!(output.contains("<main>Default main</main>"));
}

#[test]
fn test_fill_name_from_variable() {
    let engine = slotted_engine(ContextBehavior::Django);
    let rendered = engine
        .render_str(
            r#"{% component "slotted_component" %}{% fill which %}X{% endfill %}{% endcomponent %}"#,
            Context::new().with("which", "footer"),
        )
        .expect("Should render");
    assert!(normalize_html(&rendered.output).contains("<footer>X</footer>"));
}

#[test]
fn test_duplicate_fill_is_an_error() {
    let engine = slotted_engine(ContextBehavior::Django);
    let err = engine
        .render_str(
            r#"{% component "slotted_component" %}{% fill "main" %}a{% endfill %}{% fill "main" %}b{% endfill %}{% endcomponent %}"#,
            Context::new(),
        )
        .expect_err("Should fail");
    assert!(
        matches!(err, RenderError::DuplicateFill { ref name, .. } if name == "main"),
        "unexpected error: {err}"
    );
}

#[test]
fn test_implicit_content_fills_default_slot() {
    let engine = Engine::new();
    engine
        .registry()
        .register(
            "button",
            inline(r#"<button>{% slot "label" default %}Click{% endslot %}</button>"#),
        )
        .expect("Should register");

    assert_eq!(
        render(&engine, r#"{% component "button" %}Save {{ 1 }}{% endcomponent %}"#),
        "<button>Save 1</button>"
    );
    assert_eq!(
        render(&engine, r#"{% component "button" / %}"#),
        "<button>Click</button>"
    );
    assert_eq!(
        render(
            &engine,
            r#"{% component "button" %}{% fill "label" %}Named{% endfill %}{% endcomponent %}"#
        ),
        "<button>Named</button>"
    );
}

#[test]
fn test_fill_named_default_targets_default_slot() {
    let engine = Engine::new();
    engine
        .registry()
        .register(
            "button",
            inline(r#"<button>{% slot "label" default %}Click{% endslot %}</button>"#),
        )
        .expect("Should register");
    assert_eq!(
        render(
            &engine,
            r#"{% component "button" %}{% fill "default" %}Go{% endfill %}{% endcomponent %}"#
        ),
        "<button>Go</button>"
    );
}

#[test]
fn test_multiple_default_slots_is_an_error() {
    let engine = Engine::new();
    engine
        .registry()
        .register(
            "broken",
            inline(r#"{% slot "a" default %}{% endslot %}{% slot "b" default %}{% endslot %}"#),
        )
        .expect("Should register");
    let err = engine
        .render_str(r#"{% component "broken" / %}"#, Context::new())
        .expect_err("Should fail");
    assert!(matches!(err, RenderError::MultipleDefaultSlots { .. }));
}

#[test]
fn test_required_slot() {
    let engine = Engine::new();
    engine
        .registry()
        .register(
            "dialog",
            inline(r#"<dialog>{% slot "content" required %}{% endslot %}</dialog>"#),
        )
        .expect("Should register");

    let err = engine
        .render_str(r#"{% component "dialog" / %}"#, Context::new())
        .expect_err("Should fail");
    assert!(
        matches!(err, RenderError::MissingRequiredSlot { ref name, .. } if name == "content")
    );

    assert_eq!(
        render(
            &engine,
            r#"{% component "dialog" %}{% fill "content" %}Hi{% endfill %}{% endcomponent %}"#
        ),
        "<dialog>Hi</dialog>"
    );
}

#[test]
fn test_required_slot_off_the_rendered_path_is_not_checked() {
    let engine = Engine::new();
    engine
        .registry()
        .register(
            "maybe",
            inline(r#"{% if show %}{% slot "content" required %}{% endslot %}{% endif %}"#)
                .optional("show", false),
        )
        .expect("Should register");
    assert_eq!(render(&engine, r#"{% component "maybe" / %}"#), "");
}

#[test]
fn test_fill_data_binding() {
    let engine = Engine::new();
    engine
        .registry()
        .register(
            "list",
            inline(
                r#"<ul>{% for item in items %}<li>{% slot "item" item=item index=forloop.counter %}{{ item }}{% endslot %}</li>{% endfor %}</ul>"#,
            )
            .param("items"),
        )
        .expect("Should register");

    let rendered = engine
        .render_str(
            r#"{% component "list" items=names %}{% fill "item" data="d" %}{{ d.index }}. {{ d.item|upper }}{% endfill %}{% endcomponent %}"#,
            Context::new().with("names", vec!["ann", "bob"]),
        )
        .expect("Should render");
    assert_eq!(rendered.output, "<ul><li>1. ANN</li><li>2. BOB</li></ul>");
}

#[test]
fn test_fill_default_binding() {
    let engine = Engine::new();
    engine
        .registry()
        .register(
            "title",
            inline(r#"<h1>{% slot "text" %}<em>Untitled</em>{% endslot %}</h1>"#),
        )
        .expect("Should register");
    assert_eq!(
        render(
            &engine,
            r#"{% component "title" %}{% fill "text" default="original" %}Draft: {{ original }}{% endfill %}{% endcomponent %}"#
        ),
        normalize_html("<h1>Draft: <em>Untitled</em></h1>")
    );
}

#[test]
fn test_data_binding_does_not_leak_out_of_fill() {
    let engine = Engine::new();
    engine
        .registry()
        .register(
            "box",
            inline(r#"{% slot "s" value="inner" %}{% endslot %}[{{ d }}]"#),
        )
        .expect("Should register");
    let output = render(
        &engine,
        r#"{% component "box" %}{% fill "s" data="d" %}{{ d.value }}{% endfill %}{% endcomponent %}({{ d }})"#,
    );
    assert_eq!(output, "inner[]()");
}

#[test]
fn test_slot_names_do_not_leak_across_components() {
    let engine = Engine::new();
    engine
        .registry()
        .register("outer", inline(r#"<outer>{% slot "title" %}outer default{% endslot %}</outer>"#))
        .expect("Should register");
    engine
        .registry()
        .register("inner", inline(r#"<inner>{% slot "title" %}inner default{% endslot %}</inner>"#))
        .expect("Should register");

    let output = render(
        &engine,
        r#"
        {% component "outer" %}
            {% fill "title" %}
                {% component "inner" / %}
            {% endfill %}
        {% endcomponent %}
        "#,
    );
    assert_eq!(output, "<outer><inner>inner default</inner></outer>");
}

#[test]
fn test_slot_default_can_nest_components() {
    let engine = Engine::new();
    engine
        .registry()
        .register("badge", inline(r#"<b>{% slot "text" %}new{% endslot %}</b>"#))
        .expect("Should register");
    engine
        .registry()
        .register(
            "card",
            inline(
                r#"<div>{% slot "header" %}{% component "badge" %}{% fill "text" %}{% slot "badge_text" %}hot{% endslot %}{% endfill %}{% endcomponent %}{% endslot %}</div>"#,
            ),
        )
        .expect("Should register");

    assert_eq!(
        render(&engine, r#"{% component "card" / %}"#),
        "<div><b>hot</b></div>"
    );
    assert_eq!(
        render(
            &engine,
            r#"{% component "card" %}{% fill "badge_text" %}sale{% endfill %}{% endcomponent %}"#
        ),
        "<div><b>sale</b></div>"
    );
}

#[test]
fn test_unknown_fill_is_ignored_by_default() {
    let engine = slotted_engine(ContextBehavior::Django);
    let output = render(
        &engine,
        r#"{% component "slotted_component" %}{% fill "sidebar" %}nope{% endfill %}{% endcomponent %}"#,
    );
    assert!(!output.contains("nope"));
}

#[test]
fn test_unknown_fill_is_an_error_in_strict_mode() {
    let engine = Engine::with_config(
        EngineConfig::new()
            .with_strict_slots(true)
            .with_templates_dir(common::templates_dir()),
    );
    engine
        .registry()
        .register(
            "slotted_component",
            TemplateComponent::file("slotted_template.html"),
        )
        .expect("Should register");
    let err = engine
        .render_str(
            r#"{% component "slotted_component" %}{% fill "sidebar" %}nope{% endfill %}{% endcomponent %}"#,
            Context::new(),
        )
        .expect_err("Should fail");
    assert!(matches!(err, RenderError::UnknownSlot { ref name, .. } if name == "sidebar"));
}

#[test]
fn test_conditionally_unreached_slot_is_inert_in_strict_mode() {
    let engine = Engine::with_config(EngineConfig::new().with_strict_slots(true));
    engine
        .registry()
        .register(
            "maybe",
            inline(r#"{% if show %}{% slot "extra" %}{% endslot %}{% endif %}done"#)
                .optional("show", false),
        )
        .expect("Should register");
    assert_eq!(
        render(
            &engine,
            r#"{% component "maybe" %}{% fill "extra" %}X{% endfill %}{% endcomponent %}"#
        ),
        "done"
    );
}
