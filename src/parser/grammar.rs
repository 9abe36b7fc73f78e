//! Parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::value::Value;

type Extra<'a> = extra::Err<Rich<'a, Token>>;

/// Argument of a component or slot tag before validation
#[derive(Debug, Clone)]
enum TagArg {
    Positional(Expr),
    Keyword(String, Expr),
}

/// Item of a component body before validation
#[derive(Debug, Clone)]
enum BodyItem {
    Fill(Spanned<FillNode>),
    Node(Spanned<Node>),
}

/// Parse template source into a node list
pub fn parse(input: &str) -> Result<NodeList, Vec<crate::ParseError>> {
    let len = input.len();

    let token_iter = crate::parser::lexer::lex(input)
        .into_iter()
        .map(|(tok, span)| (tok, span.into()));

    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    template_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn ident<'a, I>() -> impl Parser<'a, I, String, Extra<'a>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    select! { Token::Ident(s) => s }
}

fn string_literal<'a, I>() -> impl Parser<'a, I, String, Extra<'a>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    select! { Token::Str(s) => s }
}

/// A specific identifier used as a keyword (`endblock`, `in`, `only`, ...)
fn keyword<'a, I>(name: &'static str) -> impl Parser<'a, I, (), Extra<'a>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    just(Token::Ident(name.to_string())).ignored()
}

/// `{% name`
fn open_tag<'a, I>(name: &'static str) -> impl Parser<'a, I, (), Extra<'a>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    just(Token::TagOpen).ignore_then(keyword(name))
}

/// `{% name %}`
fn end_tag<'a, I>(name: &'static str) -> impl Parser<'a, I, (), Extra<'a>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    open_tag(name).ignore_then(just(Token::TagClose)).ignored()
}

/// Operand: literal, variable path, `_("...")` or nested template string
fn operand<'a, I>() -> impl Parser<'a, I, Operand, Extra<'a>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let translated = keyword("_")
        .ignore_then(string_literal().delimited_by(just(Token::ParenOpen), just(Token::ParenClose)))
        .map(Operand::Translated);

    // Strings containing tags are templates in their own right
    let string = string_literal().try_map(|s, span| {
        if s.contains("{%") || s.contains("{{") {
            parse(&s).map(Operand::Template).map_err(|errors| {
                let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                Rich::custom(span, format!("invalid nested template: {}", messages.join("; ")))
            })
        } else {
            Ok(Operand::Literal(Value::String(s)))
        }
    });

    let number = select! {
        Token::Int(n) => Operand::Literal(Value::Int(n)),
        Token::Float(n) => Operand::Literal(Value::Float(n)),
    };

    let segment = choice((ident(), select! { Token::Int(n) => n.to_string() }));

    let path = ident()
        .then(
            just(Token::Dot)
                .ignore_then(segment)
                .repeated()
                .collect::<Vec<_>>(),
        )
        .map(|(head, rest)| match (head.as_str(), rest.is_empty()) {
            ("True", true) => Operand::Literal(Value::Bool(true)),
            ("False", true) => Operand::Literal(Value::Bool(false)),
            ("None", true) => Operand::Literal(Value::None),
            _ => {
                let mut segments = vec![head];
                segments.extend(rest);
                Operand::Variable(segments)
            }
        });

    choice((translated, string, number, path))
}

/// Expression: operand followed by `|filter[:arg]` chain
fn expression<'a, I>() -> impl Parser<'a, I, Expr, Extra<'a>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let filter = just(Token::Pipe)
        .ignore_then(ident())
        .then(just(Token::Colon).ignore_then(operand()).or_not())
        .try_map(|(name, arg), span| match (name.as_str(), arg) {
            ("upper", None) => Ok(Filter::Upper),
            ("lower", None) => Ok(Filter::Lower),
            ("title", None) => Ok(Filter::Title),
            ("length", None) => Ok(Filter::Length),
            ("safe", None) => Ok(Filter::Safe),
            ("escape", None) => Ok(Filter::Escape),
            ("default", Some(arg)) => Ok(Filter::Default(arg)),
            ("join", Some(arg)) => Ok(Filter::Join(arg)),
            ("default" | "join", None) => Err(Rich::custom(
                span,
                format!("filter '{}' requires an argument", name),
            )),
            (_, Some(_)) if is_known_filter(&name) => Err(Rich::custom(
                span,
                format!("filter '{}' does not take an argument", name),
            )),
            _ => Err(Rich::custom(span, format!("unknown filter '{}'", name))),
        });

    operand()
        .then(filter.repeated().collect::<Vec<_>>())
        .map(|(operand, filters)| Expr { operand, filters })
}

fn is_known_filter(name: &str) -> bool {
    matches!(name, "upper" | "lower" | "title" | "length" | "safe" | "escape")
}

/// `name=expr`
fn keyword_argument<'a, I>() -> impl Parser<'a, I, (String, Expr), Extra<'a>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    ident().then_ignore(just(Token::Equals)).then(expression())
}

/// `if` condition with `not`, `==`, `!=`, `and`, `or` (`and` binds tighter)
fn condition<'a, I>() -> impl Parser<'a, I, Condition, Extra<'a>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let comparison = expression()
        .then(
            choice((just(Token::EqEq).to(true), just(Token::NotEq).to(false)))
                .then(expression())
                .or_not(),
        )
        .map(|(left, comparison)| match comparison {
            None => Condition::Test(left),
            Some((true, right)) => Condition::Equal(left, right),
            Some((false, right)) => Condition::NotEqual(left, right),
        });

    let negation = keyword("not")
        .repeated()
        .collect::<Vec<_>>()
        .then(comparison)
        .map(|(nots, condition)| {
            if nots.len() % 2 == 1 {
                Condition::Not(Box::new(condition))
            } else {
                condition
            }
        });

    let conjunction = negation
        .clone()
        .then(
            keyword("and")
                .ignore_then(negation)
                .repeated()
                .collect::<Vec<_>>(),
        )
        .map(|(first, rest)| {
            rest.into_iter().fold(first, |left, right| {
                Condition::And(Box::new(left), Box::new(right))
            })
        });

    conjunction
        .clone()
        .then(
            keyword("or")
                .ignore_then(conjunction)
                .repeated()
                .collect::<Vec<_>>(),
        )
        .map(|(first, rest)| {
            rest.into_iter().fold(first, |left, right| {
                Condition::Or(Box::new(left), Box::new(right))
            })
        })
}

fn template_parser<'a, I>() -> impl Parser<'a, I, NodeList, Extra<'a>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let close = just(Token::TagClose);

    let node = recursive(|node| {
        let body = node
            .clone()
            .repeated()
            .collect::<Vec<Spanned<Node>>>()
            .map(NodeList::from);

        let text = select! { Token::Text(s) => Node::Text(s) };

        let output = expression()
            .delimited_by(just(Token::OutputOpen), just(Token::OutputClose))
            .map(Node::Output);

        let load = open_tag("load")
            .ignore_then(ident().repeated().collect::<Vec<_>>())
            .then_ignore(close.clone())
            .map(Node::Load);

        let if_node = open_tag("if")
            .ignore_then(condition())
            .then_ignore(close.clone())
            .then(body.clone())
            .then(
                open_tag("elif")
                    .ignore_then(condition())
                    .then_ignore(close.clone())
                    .then(body.clone())
                    .repeated()
                    .collect::<Vec<_>>(),
            )
            .then(
                open_tag("else")
                    .ignore_then(close.clone())
                    .ignore_then(body.clone())
                    .or_not(),
            )
            .then_ignore(end_tag("endif"))
            .map(|(((test, first), elifs), otherwise)| {
                let mut branches = vec![(test, first)];
                branches.extend(elifs);
                Node::If(IfNode {
                    branches,
                    otherwise,
                })
            });

        let for_node = open_tag("for")
            .ignore_then(ident())
            .then_ignore(keyword("in"))
            .then(expression())
            .then_ignore(close.clone())
            .then(body.clone())
            .then(
                open_tag("empty")
                    .ignore_then(close.clone())
                    .ignore_then(body.clone())
                    .or_not(),
            )
            .then_ignore(end_tag("endfor"))
            .map(|(((variable, iterable), body), empty)| {
                Node::For(ForNode {
                    variable,
                    iterable,
                    body,
                    empty,
                })
            });

        let with_node = open_tag("with")
            .ignore_then(keyword_argument().repeated().at_least(1).collect::<Vec<_>>())
            .then_ignore(close.clone())
            .then(body.clone())
            .then_ignore(end_tag("endwith"))
            .map(|(bindings, body)| Node::With(WithNode { bindings, body }));

        let extends = open_tag("extends")
            .ignore_then(
                expression().map_with(|expr, e| Spanned::new(expr, span_range(&e.span()))),
            )
            .then_ignore(close.clone())
            .map(Node::Extends);

        // `{% endblock %}` may repeat the block's name, which must then match
        let block = open_tag("block")
            .ignore_then(ident())
            .then_ignore(close.clone())
            .then(body.clone())
            .then(
                open_tag("endblock")
                    .ignore_then(ident().or_not())
                    .then_ignore(close.clone()),
            )
            .try_map(|((name, body), closing), span| match closing {
                Some(closing) if closing != name => Err(Rich::custom(
                    span,
                    format!("endblock '{}' does not match block '{}'", closing, name),
                )),
                _ => Ok(Node::Block(BlockNode { name, body })),
            });

        let include = open_tag("include")
            .ignore_then(expression())
            .then(
                keyword("with")
                    .ignore_then(keyword_argument().repeated().at_least(1).collect::<Vec<_>>())
                    .or_not(),
            )
            .then(keyword("only").or_not())
            .then_ignore(close.clone())
            .map(|((template, bindings), only)| {
                Node::Include(IncludeNode {
                    template,
                    bindings: bindings.unwrap_or_default(),
                    only: only.is_some(),
                })
            });

        let provide = open_tag("provide")
            .ignore_then(string_literal())
            .then(keyword_argument().repeated().collect::<Vec<_>>())
            .then_ignore(close.clone())
            .then(body.clone())
            .then_ignore(end_tag("endprovide"))
            .map(|((key, kwargs), body)| Node::Provide(ProvideNode { key, kwargs, body }));

        let tag_arg = choice((
            keyword_argument().map(|(name, value)| TagArg::Keyword(name, value)),
            expression().map(TagArg::Positional),
        ));

        // Slot: {% slot "name" default required key=value %}
        let slot = open_tag("slot")
            .ignore_then(string_literal())
            .then(tag_arg.clone().repeated().collect::<Vec<_>>())
            .then_ignore(close.clone())
            .then(body.clone())
            .then_ignore(end_tag("endslot"))
            .try_map(|((name, args), body), span| {
                let mut slot = SlotNode {
                    name,
                    is_default: false,
                    required: false,
                    kwargs: Vec::new(),
                    body,
                };
                for arg in args {
                    match arg {
                        TagArg::Keyword(key, value) => slot.kwargs.push((key, value)),
                        TagArg::Positional(expr) => match expr.as_bare_identifier() {
                            Some("default") => slot.is_default = true,
                            Some("required") => slot.required = true,
                            _ => {
                                return Err(Rich::custom(
                                    span,
                                    format!("unexpected argument to slot '{}'", slot.name),
                                ))
                            }
                        },
                    }
                }
                Ok(Node::Slot(slot))
            });

        // Fill: {% fill "name" data="var" default="var" %}
        let fill = open_tag("fill")
            .ignore_then(expression())
            .then(keyword_argument().repeated().collect::<Vec<_>>())
            .then_ignore(close.clone())
            .then(body.clone())
            .then_ignore(end_tag("endfill"))
            .try_map(|((name, kwargs), body), span| {
                let mut fill = FillNode {
                    name,
                    data: None,
                    default: None,
                    body,
                };
                for (key, value) in kwargs {
                    let Some(var) = value.as_str_literal() else {
                        return Err(Rich::custom(
                            span,
                            format!("fill argument '{}' must be a string literal", key),
                        ));
                    };
                    match key.as_str() {
                        "data" => fill.data = Some(var.to_string()),
                        "default" => fill.default = Some(var.to_string()),
                        other => {
                            return Err(Rich::custom(
                                span,
                                format!("unknown fill argument '{}'", other),
                            ))
                        }
                    }
                }
                Ok(fill)
            })
            .map_with(|fill, e| Spanned::new(fill, span_range(&e.span())));

        // Component header: {% component name args kwargs [only]
        let component_header = open_tag("component")
            .ignore_then(expression())
            .then(tag_arg.repeated().collect::<Vec<_>>());

        let self_closing = component_header
            .clone()
            .then_ignore(just(Token::Slash))
            .then_ignore(close.clone())
            .map(|(name, args)| (name, args, Vec::new()));

        let with_body = component_header
            .then_ignore(close.clone())
            .then(
                choice((fill.map(BodyItem::Fill), node.clone().map(BodyItem::Node)))
                    .repeated()
                    .collect::<Vec<_>>(),
            )
            .then_ignore(end_tag("endcomponent"))
            .map(|((name, args), items)| (name, args, items));

        let component = choice((self_closing, with_body))
            .try_map(|(name, args, items), span| build_component(name, args, items, span));

        choice((
            text,
            output,
            load,
            if_node,
            for_node,
            with_node,
            extends,
            block,
            include,
            provide,
            slot,
            component,
        ))
        .map_with(|n, e| Spanned::new(n, span_range(&e.span())))
        .boxed()
    });

    node.repeated()
        .collect::<Vec<Spanned<Node>>>()
        .then_ignore(end())
        .map(NodeList::from)
}

/// Validate component arguments and body, producing the call-site node
fn build_component<'a>(
    name: Expr,
    args: Vec<TagArg>,
    items: Vec<BodyItem>,
    span: SimpleSpan,
) -> Result<Node, Rich<'a, Token>> {
    let mut positional = Vec::new();
    let mut kwargs: Vec<(String, Expr)> = Vec::new();
    let mut only = false;

    for arg in args {
        match arg {
            TagArg::Positional(expr) if expr.as_bare_identifier() == Some("only") => only = true,
            TagArg::Positional(expr) => {
                if !kwargs.is_empty() {
                    return Err(Rich::custom(
                        span,
                        "positional argument follows keyword argument",
                    ));
                }
                positional.push(expr);
            }
            TagArg::Keyword(key, value) => {
                if kwargs.iter().any(|(k, _)| k == &key) {
                    return Err(Rich::custom(
                        span,
                        format!("keyword argument '{}' repeated", key),
                    ));
                }
                kwargs.push((key, value));
            }
        }
    }

    let has_fills = items.iter().any(|item| matches!(item, BodyItem::Fill(_)));
    let body = if has_fills {
        let mut fills = Vec::new();
        for item in items {
            match item {
                BodyItem::Fill(fill) => fills.push(fill),
                BodyItem::Node(node) if node.node.is_blank() => {}
                BodyItem::Node(_) => {
                    return Err(Rich::custom(
                        span,
                        "component body mixes fill tags with other content",
                    ))
                }
            }
        }
        ComponentBody::Fills(fills)
    } else {
        let nodes: Vec<Spanned<Node>> = items
            .into_iter()
            .filter_map(|item| match item {
                BodyItem::Node(node) => Some(node),
                BodyItem::Fill(_) => None,
            })
            .collect();
        if nodes.iter().all(|n| n.node.is_blank()) {
            ComponentBody::Empty
        } else {
            ComponentBody::Default(NodeList::from(nodes))
        }
    };

    Ok(Node::Component(ComponentNode {
        name,
        args: positional,
        kwargs,
        only,
        body,
    }))
}
