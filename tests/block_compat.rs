//! Blocks and slots interacting across component boundaries

mod common;

use pretty_assertions::assert_eq;
use slotted::{Context, Data, Engine};

use common::{inline, normalize_html, slotted_engine, BEHAVIORS};

fn assert_renders(engine: &Engine, source: &str, expected: &str) {
    let rendered = engine
        .render_str(source, Context::new())
        .expect("Should render");
    assert_eq!(normalize_html(&rendered.output), normalize_html(expected));
}

const SLOTTED_BODY_FROM_FILL: &str = r#"
    <!DOCTYPE html>
    <html lang="en">
    <body>
        <custom-template>
        <header></header>
        <main>BODY_FROM_FILL</main>
        <footer>Default footer</footer>
        </custom-template>
    </body>
    </html>
"#;

const GIRAFFES: &str = r#"
    <!DOCTYPE html>
    <html lang="en">
    <body>
        <custom-template>
        <header></header>
        <main>
            <div> 58 giraffes and 2 pantaloons </div>
        </main>
        <footer>Default footer</footer>
        </custom-template>
    </body>
    </html>
"#;

fn slot_inside_block_page(main: &str) -> String {
    format!(
        r#"
        <!DOCTYPE html>
        <html lang="en">
        <body>
            <custom-template>
            <header></header>
            <main>{}</main>
            <footer>Default footer</footer>
            </custom-template>
        </body>
        </html>
        "#,
        main
    )
}

#[test]
fn test_slots_inside_extends() {
    for behavior in BEHAVIORS {
        let engine = slotted_engine(behavior);
        engine
            .registry()
            .register(
                "slot_inside_extends",
                inline(r#"{% extends "block_in_slot_in_component.html" %}"#),
            )
            .expect("Should register");

        let template = r#"
            {% load component_tags %}
            {% component "slot_inside_extends" %}
                {% fill "body" %}
                    BODY_FROM_FILL
                {% endfill %}
            {% endcomponent %}
        "#;
        assert_renders(&engine, template, SLOTTED_BODY_FROM_FILL);
    }
}

#[test]
fn test_slots_inside_include() {
    for behavior in BEHAVIORS {
        let engine = slotted_engine(behavior);
        engine
            .registry()
            .register(
                "slot_inside_include",
                inline(r#"{% include "block_in_slot_in_component.html" %}"#),
            )
            .expect("Should register");

        let template = r#"
            {% load component_tags %}
            {% component "slot_inside_include" %}
                {% fill "body" %}
                    BODY_FROM_FILL
                {% endfill %}
            {% endcomponent %}
        "#;
        assert_renders(&engine, template, SLOTTED_BODY_FROM_FILL);
    }
}

#[test]
fn test_component_inside_block() {
    for behavior in BEHAVIORS {
        let engine = slotted_engine(behavior);
        let template = r#"
            {% extends "block.html" %}
            {% load component_tags %}
            {% block body %}
            {% component "slotted_component" %}
                {% fill "header" %}{% endfill %}
                {% fill "main" %}
                TEST
                {% endfill %}
                {% fill "footer" %}{% endfill %}
            {% endcomponent %}
            {% endblock %}
        "#;
        let expected = r#"
            <!DOCTYPE html>
            <html lang="en">
            <body>
            <main role="main">
            <div class='container main-container'>
                <custom-template>
                <header></header>
                <main>TEST</main>
                <footer></footer>
                </custom-template>
            </div>
            </main>
            </body>
            </html>
        "#;
        assert_renders(&engine, template, expected);
    }
}

#[test]
fn test_block_inside_component() {
    for behavior in BEHAVIORS {
        let engine = slotted_engine(behavior);
        let template = r#"
            {% extends "block_in_component.html" %}
            {% load component_tags %}
            {% block body %}
            <div>
                58 giraffes and 2 pantaloons
            </div>
            {% endblock %}
        "#;
        assert_renders(&engine, template, GIRAFFES);
    }
}

#[test]
fn test_block_inside_component_parent() {
    for behavior in BEHAVIORS {
        let engine = slotted_engine(behavior);
        engine
            .registry()
            .register(
                "block_in_component_parent",
                slotted::TemplateComponent::file("block_in_component_parent.html"),
            )
            .expect("Should register");

        let template = r#"
            {% load component_tags %}
            {% component "block_in_component_parent" %}{% endcomponent %}
        "#;
        assert_renders(&engine, template, GIRAFFES);
    }
}

#[test]
fn test_block_does_not_affect_inside_component() {
    for behavior in BEHAVIORS {
        let engine = slotted_engine(behavior);
        engine
            .registry()
            .register(
                "block_inside_slot_v1",
                slotted::TemplateComponent::file("block_in_slot_in_component.html"),
            )
            .expect("Should register");

        let template = r#"
            {% load component_tags %}
            {% component "block_inside_slot_v1" %}
                {% fill "body" %}
                    BODY_FROM_FILL
                {% endfill %}
            {% endcomponent %}
            {% block inner %}
                wow
            {% endblock %}
        "#;
        let expected = format!("{} wow", SLOTTED_BODY_FROM_FILL);
        assert_renders(&engine, template, &expected);
    }
}

#[test]
fn test_same_named_block_outside_does_not_replace_default_inside() {
    for behavior in BEHAVIORS {
        let engine = slotted_engine(behavior);
        engine
            .registry()
            .register(
                "block_inside_slot_v1",
                slotted::TemplateComponent::file("block_in_slot_in_component.html"),
            )
            .expect("Should register");

        // No fill: the slot default renders, including its own `inner` block
        let template = r#"
            {% component "block_inside_slot_v1" %}{% endcomponent %}
            {% block inner %}wow{% endblock %}
        "#;
        let expected = format!(
            "{} wow",
            slot_inside_block_page("Helloodiddoo Default inner")
        );
        assert_renders(&engine, template, &expected);
    }
}

#[test]
fn test_block_override_inside_component_does_not_reach_caller() {
    for behavior in BEHAVIORS {
        let engine = slotted_engine(behavior);
        engine
            .add_template(
                "base.html",
                "<base>{% block lead %}{% endblock %}{% block body %}ROOT{% endblock %}</base>",
            )
            .expect("Should add");
        engine
            .registry()
            .register(
                "overrider",
                inline(r#"{% extends "base.html" %}{% block body %}COMP{% endblock %}"#),
            )
            .expect("Should register");

        // The component's `body` override stays inside its own extends chain
        let template = r#"
            {% extends "base.html" %}
            {% block lead %}{% component "overrider" / %}{% endblock %}
        "#;
        assert_renders(&engine, template, "<base><base>COMP</base>ROOT</base>");
    }
}

#[test]
fn test_slot_inside_block_slot_default_block_default() {
    for behavior in BEHAVIORS {
        let engine = slotted_engine(behavior);
        engine
            .registry()
            .register(
                "slot_inside_block",
                inline(r#"{% extends "slot_inside_block.html" %}"#),
            )
            .expect("Should register");

        let template = r#"
            {% load component_tags %}
            {% component "slot_inside_block" %}{% endcomponent %}
        "#;
        assert_renders(
            &engine,
            template,
            &slot_inside_block_page("Helloodiddoo Default inner"),
        );
    }
}

#[test]
fn test_slot_inside_block_slot_default_block_override() {
    for behavior in BEHAVIORS {
        let engine = slotted_engine(behavior);
        engine
            .registry()
            .register(
                "slot_inside_block",
                inline(
                    r#"
                    {% extends "slot_inside_block.html" %}
                    {% block inner %}
                        INNER BLOCK OVERRIDEN
                    {% endblock %}
                    "#,
                ),
            )
            .expect("Should register");

        let template = r#"
            {% load component_tags %}
            {% component "slot_inside_block" %}{% endcomponent %}
        "#;
        assert_renders(
            &engine,
            template,
            &slot_inside_block_page("Helloodiddoo INNER BLOCK OVERRIDEN"),
        );
    }
}

#[test]
fn test_slot_inside_block_slot_overriden_block_default() {
    for behavior in BEHAVIORS {
        let engine = slotted_engine(behavior);
        engine
            .registry()
            .register(
                "slot_inside_block",
                inline(r#"{% extends "slot_inside_block.html" %}"#),
            )
            .expect("Should register");

        let template = r#"
            {% load component_tags %}
            {% component "slot_inside_block" %}
                {% fill "body" %}
                    SLOT OVERRIDEN
                {% endfill %}
            {% endcomponent %}
        "#;
        assert_renders(
            &engine,
            template,
            &slot_inside_block_page("Helloodiddoo SLOT OVERRIDEN"),
        );
    }
}

#[test]
fn test_slot_inside_block_slot_overriden_block_overriden() {
    for behavior in BEHAVIORS {
        let engine = slotted_engine(behavior);
        engine
            .registry()
            .register(
                "slot_inside_block",
                inline(
                    r#"
                    {% extends "slot_inside_block.html" %}
                    {% block inner %}
                        {% load component_tags %}
                        {% slot "new_slot" %}{% endslot %}
                    {% endblock %}
                    whut
                    "#,
                ),
            )
            .expect("Should register");

        // The "body" fill targets a slot the override removed, so it is inert
        let template = r#"
            {% load component_tags %}
            {% component "slot_inside_block" %}
                {% fill "body" %}
                    SLOT_BODY__OVERRIDEN
                {% endfill %}
                {% fill "new_slot" %}
                    SLOT_NEW__OVERRIDEN
                {% endfill %}
            {% endcomponent %}
        "#;
        assert_renders(
            &engine,
            template,
            &slot_inside_block_page("Helloodiddoo SLOT_NEW__OVERRIDEN"),
        );
    }
}

#[test]
fn test_inert_fill_is_not_an_error_in_strict_mode() {
    let engine = Engine::with_config(
        slotted::EngineConfig::new()
            .with_strict_slots(true)
            .with_templates_dir(common::templates_dir()),
    );
    engine
        .registry()
        .register(
            "slotted_component",
            slotted::TemplateComponent::file("slotted_template.html"),
        )
        .expect("Should register");
    engine
        .registry()
        .register(
            "slot_inside_block",
            inline(
                r#"{% extends "slot_inside_block.html" %}{% block inner %}{% slot "new_slot" %}{% endslot %}{% endblock %}"#,
            ),
        )
        .expect("Should register");

    let template = r#"
        {% component "slot_inside_block" %}
            {% fill "body" %}A{% endfill %}
            {% fill "new_slot" %}B{% endfill %}
        {% endcomponent %}
    "#;
    assert_renders(&engine, template, &slot_inside_block_page("Helloodiddoo B"));
}

#[test]
fn test_inject_inside_block() {
    for behavior in BEHAVIORS {
        let engine = slotted_engine(behavior);
        engine
            .registry()
            .register(
                "injectee",
                inline("<div> injected: {{ var|safe }} </div>").with_data(|_, injector| {
                    let mut data = Data::new();
                    data.insert("var".to_string(), injector.inject("block_provide")?);
                    Ok(data)
                }),
            )
            .expect("Should register");

        let template = r#"
            {% extends "block_in_component_provide.html" %}
            {% load component_tags %}
            {% block body %}
                {% component "injectee" %}
                {% endcomponent %}
            {% endblock %}
        "#;
        let expected = r#"
            <!DOCTYPE html>
            <html lang="en">
            <body>
                <custom-template>
                <header></header>
                <main>
                    <div> injected: DepInject(hello='from_block') </div>
                </main>
                <footer>Default footer</footer>
                </custom-template>
            </body>
            </html>
        "#;
        assert_renders(&engine, template, expected);
    }
}
