//! Rendering of parsed templates
//!
//! The renderer walks node trees with a [`Frame`]: the variables in scope,
//! the block overrides of the template unit being rendered and the fills of
//! the component call being rendered, if any. A component call captures the
//! caller's frame into each of its fills, so fill content always renders with
//! the caller's variables, blocks and slots, while the component's own
//! template renders in a fresh frame.

pub mod blocks;
mod error;
pub mod filters;
pub mod slots;

use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

use log::{debug, trace, warn};

use crate::component::{ComponentRegistry, InjectionScope, TemplateSource};
use crate::config::EngineConfig;
use crate::context::Context;
use crate::parser::{
    ComponentBody, ComponentNode, Condition, Expr, Filter, IncludeNode, Node, NodeList, Operand,
    ProvideNode, SlotNode,
};
use crate::template::{Template, TemplateError, TemplateStore};
use crate::value::{Record, Value};

use blocks::BlockContext;
use slots::{DeclaredSlots, Fill, SlotScope, DEFAULT_FILL};

pub use error::RenderError;

/// Type name of values created by `{% provide %}`
pub const PROVIDED_TYPE: &str = "DepInject";

/// Output of a top-level render
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub output: String,
    /// Named templates rendered along the way, in render order
    pub templates_used: Vec<String>,
}

/// Everything a node needs from its surroundings
#[derive(Debug, Clone)]
pub struct Frame {
    pub context: Context,
    pub blocks: Rc<BlockContext>,
    pub slots: Option<Rc<SlotScope>>,
}

impl Frame {
    pub fn new(context: Context, blocks: Rc<BlockContext>, slots: Option<Rc<SlotScope>>) -> Self {
        Self {
            context,
            blocks,
            slots,
        }
    }
}

/// State of one top-level render call
///
/// The injection stack lives here rather than in the engine so concurrent
/// renders never observe each other's provisions.
pub struct Renderer<'e> {
    config: &'e EngineConfig,
    templates: &'e TemplateStore,
    registry: &'e ComponentRegistry,
    injections: InjectionScope,
    templates_used: Vec<String>,
    depth: usize,
}

impl<'e> Renderer<'e> {
    pub fn new(
        config: &'e EngineConfig,
        templates: &'e TemplateStore,
        registry: &'e ComponentRegistry,
    ) -> Self {
        Self {
            config,
            templates,
            registry,
            injections: InjectionScope::new(),
            templates_used: Vec::new(),
            depth: 0,
        }
    }

    /// Render a template at the top level, outside of any component
    pub fn render(mut self, template: &Template, context: Context) -> Result<Rendered, RenderError> {
        let mut output = String::new();
        self.render_unit(template, context, None, &mut output)?;
        Ok(Rendered {
            output,
            templates_used: self.templates_used,
        })
    }

    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, RenderError>,
    ) -> Result<T, RenderError> {
        if self.depth >= self.config.max_depth {
            return Err(RenderError::RecursionLimit {
                limit: self.config.max_depth,
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Render one template unit: resolve its `extends` chain, build its
    /// block overrides, then render the root of the chain
    fn render_unit(
        &mut self,
        template: &Template,
        context: Context,
        slots: Option<Rc<SlotScope>>,
        out: &mut String,
    ) -> Result<(), RenderError> {
        let mut frame = Frame::new(context, Rc::new(BlockContext::new()), slots);
        let parents = self.resolve_parents(template, &frame)?;

        frame.blocks = Rc::new(BlockContext::from_chain(
            std::iter::once(&template.nodes).chain(parents.iter().map(|t| &t.nodes)),
        ));

        if let Some(name) = &template.name {
            self.templates_used.push(name.clone());
        }
        self.templates_used
            .extend(parents.iter().filter_map(|t| t.name.clone()));

        let root = parents
            .last()
            .map(|t| t.nodes.clone())
            .unwrap_or_else(|| template.nodes.clone());
        self.render_nodes(&root, &mut frame, out)
    }

    fn resolve_parents(
        &mut self,
        template: &Template,
        frame: &Frame,
    ) -> Result<Vec<Arc<Template>>, RenderError> {
        let mut parents: Vec<Arc<Template>> = Vec::new();
        let mut chain = vec![template.display_name().to_string()];
        let mut next = template.parent.clone();

        while let Some(expr) = next {
            let name = self.eval(&expr.node, frame)?.to_string();
            if chain.contains(&name) {
                chain.push(name);
                return Err(TemplateError::CircularExtends {
                    chain: chain.join(" -> "),
                }
                .into());
            }
            let parent = self.templates.get(&name)?;
            next = parent.parent.clone();
            chain.push(name);
            parents.push(parent);
        }

        Ok(parents)
    }

    fn render_nodes(
        &mut self,
        nodes: &NodeList,
        frame: &mut Frame,
        out: &mut String,
    ) -> Result<(), RenderError> {
        for node in nodes.iter() {
            self.render_node(&node.node, frame, out)?;
        }
        Ok(())
    }

    fn render_node(
        &mut self,
        node: &Node,
        frame: &mut Frame,
        out: &mut String,
    ) -> Result<(), RenderError> {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Output(expr) => out.push_str(&self.eval(expr, frame)?.render()),
            Node::Load(_) | Node::Extends(_) => {}
            Node::If(node) => {
                for (condition, body) in &node.branches {
                    if self.test(condition, frame)? {
                        return self.render_nodes(body, frame, out);
                    }
                }
                if let Some(otherwise) = &node.otherwise {
                    self.render_nodes(otherwise, frame, out)?;
                }
            }
            Node::For(node) => {
                let items = self.eval(&node.iterable, frame)?.iter_items();
                if items.is_empty() {
                    if let Some(empty) = &node.empty {
                        self.render_nodes(empty, frame, out)?;
                    }
                    return Ok(());
                }
                let count = items.len();
                for (index, item) in items.into_iter().enumerate() {
                    frame.context.push_layer([
                        (node.variable.clone(), item),
                        ("forloop".to_string(), forloop(index, count)),
                    ]);
                    let result = self.render_nodes(&node.body, frame, out);
                    frame.context.pop();
                    result?;
                }
            }
            Node::With(node) => {
                let bindings = self.eval_kwargs(&node.bindings, frame)?;
                frame.context.push_layer(bindings);
                let result = self.render_nodes(&node.body, frame, out);
                frame.context.pop();
                result?;
            }
            Node::Block(block) => {
                let body = frame
                    .blocks
                    .get(&block.name)
                    .cloned()
                    .unwrap_or_else(|| block.body.clone());
                self.render_nodes(&body, frame, out)?;
            }
            Node::Include(node) => self.render_include(node, frame, out)?,
            Node::Component(node) => self.render_component(node, frame, out)?,
            Node::Slot(node) => self.render_slot(node, frame, out)?,
            Node::Provide(node) => self.render_provide(node, frame, out)?,
        }
        Ok(())
    }

    fn render_include(
        &mut self,
        node: &IncludeNode,
        frame: &Frame,
        out: &mut String,
    ) -> Result<(), RenderError> {
        let name = self.eval(&node.template, frame)?.to_string();
        let template = self.templates.get(&name)?;
        let bindings = self.eval_kwargs(&node.bindings, frame)?;

        let context = if node.only {
            Context::from_data(bindings)
        } else {
            let mut context = frame.context.clone();
            context.push_layer(bindings);
            context
        };

        // Slots inside an included template still belong to the enclosing component
        let slots = frame.slots.clone();
        self.nested(|r| r.render_unit(&template, context, slots, out))
    }

    fn render_component(
        &mut self,
        node: &ComponentNode,
        frame: &Frame,
        out: &mut String,
    ) -> Result<(), RenderError> {
        let name = self.eval(&node.name, frame)?.to_string();
        let component = self
            .registry
            .get(&name)
            .ok_or_else(|| RenderError::ComponentNotFound { name: name.clone() })?;

        let mut args = Vec::with_capacity(node.args.len());
        for arg in &node.args {
            args.push(self.eval(arg, frame)?);
        }
        let kwargs = self.eval_kwargs(&node.kwargs, frame)?;
        let bound = component
            .signature()
            .bind(args, kwargs)
            .map_err(|source| RenderError::Arguments {
                component: name.clone(),
                source,
            })?;

        let data = component.context_data(&bound, &self.injections.injector())?;
        let context = self
            .config
            .context_behavior
            .component_context(&frame.context, data, node.only);

        let scope = Rc::new(self.fill_scope(&name, &node.body, frame)?);
        let template = match component.template() {
            TemplateSource::File(file) => self.templates.get(&file)?,
            TemplateSource::Inline(template) => template,
        };

        debug!(
            "Rendering component {} ({}, {} fill(s))",
            name,
            template.display_name(),
            scope.len()
        );
        let fills = Rc::clone(&scope);
        self.nested(|r| r.render_unit(&template, context, Some(fills), out))?;
        self.check_unconsumed(&scope, &template)
    }

    /// Collect the fills of one call site, each capturing the caller's frame
    fn fill_scope(
        &mut self,
        component: &str,
        body: &ComponentBody,
        frame: &Frame,
    ) -> Result<SlotScope, RenderError> {
        let mut scope = SlotScope::new(component);
        match body {
            ComponentBody::Empty => {}
            ComponentBody::Default(nodes) => scope.add_fill(Fill {
                name: DEFAULT_FILL.to_string(),
                data: None,
                default: None,
                body: nodes.clone(),
                frame: frame.clone(),
            })?,
            ComponentBody::Fills(fills) => {
                for fill in fills {
                    let name = self.eval(&fill.node.name, frame)?.to_string();
                    scope.add_fill(Fill {
                        name,
                        data: fill.node.data.clone(),
                        default: fill.node.default.clone(),
                        body: fill.node.body.clone(),
                        frame: frame.clone(),
                    })?;
                }
            }
        }
        Ok(scope)
    }

    /// Fills no rendered slot asked for are inert when the slot exists off the
    /// rendered path, and unknown otherwise
    fn check_unconsumed(&self, scope: &SlotScope, template: &Template) -> Result<(), RenderError> {
        let unconsumed = scope.unconsumed();
        if unconsumed.is_empty() {
            return Ok(());
        }

        let declared = self.declared_slots(template);
        for name in unconsumed {
            if declared.accepts(name) {
                debug!(
                    "Fill '{}' of component {} targets a slot outside the rendered path",
                    name, scope.component
                );
            } else if self.config.strict_slots {
                return Err(RenderError::UnknownSlot {
                    component: scope.component.clone(),
                    name: name.to_string(),
                });
            } else {
                warn!(
                    "Component {} has no slot named '{}', fill ignored",
                    scope.component, name
                );
            }
        }
        Ok(())
    }

    /// Every slot declared in the template or in templates it statically
    /// extends or includes
    fn declared_slots(&self, template: &Template) -> DeclaredSlots {
        let mut declared = DeclaredSlots::default();
        let mut visited = HashSet::new();
        let mut pending = declared.scan(&template.nodes);

        while let Some(name) = pending.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }
            match self.templates.get(&name) {
                Ok(linked) => pending.extend(declared.scan(&linked.nodes)),
                Err(e) => debug!("Skipping {} while collecting slots: {}", name, e),
            }
        }
        declared
    }

    fn render_slot(
        &mut self,
        node: &SlotNode,
        frame: &mut Frame,
        out: &mut String,
    ) -> Result<(), RenderError> {
        let scope = frame
            .slots
            .clone()
            .ok_or_else(|| RenderError::SlotOutsideComponent {
                name: node.name.clone(),
            })?;

        let Some(fill) = scope.take(&node.name, node.is_default)? else {
            if node.required {
                return Err(RenderError::MissingRequiredSlot {
                    component: scope.component.clone(),
                    name: node.name.clone(),
                });
            }
            trace!("Slot '{}' of {} renders its default", node.name, scope.component);
            return self.render_nodes(&node.body, frame, out);
        };

        trace!(
            "Slot '{}' of {} filled by '{}'",
            node.name,
            scope.component,
            fill.name
        );
        let mut bindings = Vec::new();
        if let Some(var) = &fill.data {
            let data = self.eval_kwargs(&node.kwargs, frame)?;
            bindings.push((var.clone(), Value::Map(data.into_iter().collect())));
        }
        if let Some(var) = &fill.default {
            let mut default = String::new();
            self.render_nodes(&node.body, frame, &mut default)?;
            bindings.push((var.clone(), Value::safe(default)));
        }

        let mut fill_frame = fill.frame.clone();
        fill_frame.context.push_layer(bindings);
        self.render_nodes(&fill.body, &mut fill_frame, out)
    }

    fn render_provide(
        &mut self,
        node: &ProvideNode,
        frame: &mut Frame,
        out: &mut String,
    ) -> Result<(), RenderError> {
        let fields = self.eval_kwargs(&node.kwargs, frame)?;
        let mark = self.injections.mark();
        self.injections
            .provide(node.key.clone(), Record::new(PROVIDED_TYPE, fields).into());
        let result = self.render_nodes(&node.body, frame, out);
        self.injections.restore(mark);
        result
    }

    fn eval(&mut self, expr: &Expr, frame: &Frame) -> Result<Value, RenderError> {
        let mut value = self.eval_operand(&expr.operand, frame)?;
        for filter in &expr.filters {
            let arg = match filter {
                Filter::Default(arg) | Filter::Join(arg) => {
                    Some(self.eval_operand(arg, frame)?)
                }
                _ => None,
            };
            value = filters::apply(filter, value, arg);
        }
        Ok(value)
    }

    fn eval_operand(&mut self, operand: &Operand, frame: &Frame) -> Result<Value, RenderError> {
        Ok(match operand {
            Operand::Literal(value) => value.clone(),
            Operand::Variable(path) => frame.context.resolve(path).cloned().unwrap_or(Value::None),
            Operand::Translated(text) => Value::String(text.clone()),
            Operand::Template(nodes) => {
                let mut inner = frame.clone();
                let mut rendered = String::new();
                self.render_nodes(nodes, &mut inner, &mut rendered)?;
                Value::safe(rendered)
            }
        })
    }

    fn eval_kwargs(
        &mut self,
        kwargs: &[(String, Expr)],
        frame: &Frame,
    ) -> Result<Vec<(String, Value)>, RenderError> {
        let mut values = Vec::with_capacity(kwargs.len());
        for (name, expr) in kwargs {
            values.push((name.clone(), self.eval(expr, frame)?));
        }
        Ok(values)
    }

    fn test(&mut self, condition: &Condition, frame: &Frame) -> Result<bool, RenderError> {
        Ok(match condition {
            Condition::Test(expr) => self.eval(expr, frame)?.is_truthy(),
            Condition::Not(inner) => !self.test(inner, frame)?,
            Condition::Equal(a, b) => {
                filters::loosely_equal(&self.eval(a, frame)?, &self.eval(b, frame)?)
            }
            Condition::NotEqual(a, b) => {
                !filters::loosely_equal(&self.eval(a, frame)?, &self.eval(b, frame)?)
            }
            Condition::And(a, b) => self.test(a, frame)? && self.test(b, frame)?,
            Condition::Or(a, b) => self.test(a, frame)? || self.test(b, frame)?,
        })
    }
}

fn forloop(index: usize, count: usize) -> Value {
    let fields = [
        ("counter", Value::Int(index as i64 + 1)),
        ("counter0", Value::Int(index as i64)),
        ("first", Value::Bool(index == 0)),
        ("last", Value::Bool(index + 1 == count)),
    ];
    Value::Map(
        fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::TemplateComponent;

    fn render(source: &str, context: Context) -> Result<Rendered, RenderError> {
        render_with(source, context, &ComponentRegistry::new(), &TemplateStore::new())
    }

    fn render_with(
        source: &str,
        context: Context,
        registry: &ComponentRegistry,
        templates: &TemplateStore,
    ) -> Result<Rendered, RenderError> {
        let config = EngineConfig::default();
        let template = Template::parse(Some("root"), source)?;
        Renderer::new(&config, templates, registry).render(&template, context)
    }

    #[test]
    fn test_output_is_escaped() {
        let rendered = render("<p>{{ v }}</p>", Context::new().with("v", "<b>&")).expect("Should render");
        assert_eq!(rendered.output, "<p>&lt;b&gt;&amp;</p>");
    }

    #[test]
    fn test_missing_variable_renders_empty() {
        let rendered = render("[{{ missing.path }}]", Context::new()).expect("Should render");
        assert_eq!(rendered.output, "[]");
    }

    #[test]
    fn test_if_elif_else() {
        let source = "{% if a %}A{% elif b == 2 %}B{% else %}C{% endif %}";
        let ctx = Context::new().with("b", 2i64);
        assert_eq!(render(source, ctx).expect("Should render").output, "B");
        assert_eq!(render(source, Context::new()).expect("Should render").output, "C");
    }

    #[test]
    fn test_for_with_forloop_and_empty() {
        let source = "{% for x in xs %}{{ forloop.counter }}:{{ x }}{% if not forloop.last %},{% endif %}{% empty %}none{% endfor %}";
        let ctx = Context::new().with("xs", vec!["a", "b"]);
        assert_eq!(render(source, ctx).expect("Should render").output, "1:a,2:b");
        assert_eq!(render(source, Context::new()).expect("Should render").output, "none");
    }

    #[test]
    fn test_with_scopes_bindings() {
        let source = "{% with name=\"in\" %}{{ name }}{% endwith %}-{{ name }}";
        let ctx = Context::new().with("name", "out");
        assert_eq!(render(source, ctx).expect("Should render").output, "in-out");
    }

    #[test]
    fn test_slot_outside_component() {
        let err = render("{% slot \"a\" %}{% endslot %}", Context::new()).expect_err("Should fail");
        assert!(matches!(err, RenderError::SlotOutsideComponent { .. }));
    }

    #[test]
    fn test_unknown_component() {
        let err = render("{% component \"nope\" / %}", Context::new()).expect_err("Should fail");
        assert!(matches!(err, RenderError::ComponentNotFound { name } if name == "nope"));
    }

    #[test]
    fn test_fill_renders_in_caller_context() {
        let registry = ComponentRegistry::new();
        registry
            .register(
                "card",
                TemplateComponent::inline("[{{ who }}|{% slot \"body\" %}{% endslot %}]")
                    .expect("Should parse")
                    .optional("who", "component"),
            )
            .expect("Should register");
        let source = "{% component \"card\" %}{% fill \"body\" %}{{ who }}{% endfill %}{% endcomponent %}";
        let ctx = Context::new().with("who", "caller");
        let rendered =
            render_with(source, ctx, &registry, &TemplateStore::new()).expect("Should render");
        assert_eq!(rendered.output, "[component|caller]");
    }

    #[test]
    fn test_recursion_limit() {
        let registry = ComponentRegistry::new();
        registry
            .register(
                "loop",
                TemplateComponent::inline("{% component \"loop\" / %}").expect("Should parse"),
            )
            .expect("Should register");
        let err = render_with("{% component \"loop\" / %}", Context::new(), &registry, &TemplateStore::new())
            .expect_err("Should fail");
        assert!(matches!(err, RenderError::RecursionLimit { limit: 64 }));
    }

    #[test]
    fn test_circular_extends() {
        let templates = TemplateStore::new();
        templates
            .add("a.html", "{% extends \"b.html\" %}")
            .expect("Should add");
        templates
            .add("b.html", "{% extends \"a.html\" %}")
            .expect("Should add");
        let err = render_with(
            "{% extends \"a.html\" %}",
            Context::new(),
            &ComponentRegistry::new(),
            &templates,
        )
        .expect_err("Should fail");
        assert!(matches!(
            err,
            RenderError::Template(TemplateError::CircularExtends { .. })
        ));
    }

    #[test]
    fn test_render_is_idempotent() {
        let template = Template::parse(None, "{% for x in xs %}{{ x|upper }}{% endfor %}")
            .expect("Should parse");
        let config = EngineConfig::default();
        let templates = TemplateStore::new();
        let registry = ComponentRegistry::new();
        let ctx = Context::new().with("xs", vec!["a", "b"]);
        let first = Renderer::new(&config, &templates, &registry)
            .render(&template, ctx.clone())
            .expect("Should render");
        let second = Renderer::new(&config, &templates, &registry)
            .render(&template, ctx)
            .expect("Should render");
        assert_eq!(first, second);
    }
}
