//! Lexer for the template language using logos
//!
//! Lexing runs in two stages. The outer stage splits the source into text,
//! `{{ ... }}` outputs, `{% ... %}` tags and `{# ... #}` comments. The inner
//! stage tokenizes the contents of outputs and tags.

use logos::Logos;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Outer segments of a template source
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum Segment {
    #[regex(r"\{\{([^}]|\}[^}])*\}\}")]
    Output,

    // Quoted strings may contain `%}` (nested tags in arguments)
    #[regex(r#"\{%([^%"']|%[^}"']|"[^"]*"|'[^']*')*%\}"#)]
    Tag,

    #[regex(r"\{#([^#]|#[^}])*#\}")]
    Comment,

    #[regex(r"[^{]+")]
    Text,

    #[token("{")]
    Brace,
}

/// Tokens inside `{{ }}` and `{% %}`
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
enum TagToken {
    // Operators (longer patterns first)
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("=")]
    Equals,
    #[token("|")]
    Pipe,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token("/")]
    Slash,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unquote(lex.slice()))]
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| unquote(lex.slice()))]
    Str(String),

    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r"-?[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),
}

/// Token stream consumed by the grammar
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Literal text outside of tags (adjacent runs merged)
    Text(String),
    /// `{{`
    OutputOpen,
    /// `}}`
    OutputClose,
    /// `{%`
    TagOpen,
    /// `%}`
    TagClose,
    Ident(String),
    Str(String),
    Int(i64),
    Float(f64),
    Equals,
    EqEq,
    NotEq,
    Pipe,
    Colon,
    Dot,
    Comma,
    ParenOpen,
    ParenClose,
    Slash,
    /// Input the tag lexer could not read (stray character, out-of-range number)
    Error(String),
}

impl From<TagToken> for Token {
    fn from(tok: TagToken) -> Self {
        match tok {
            TagToken::EqEq => Token::EqEq,
            TagToken::NotEq => Token::NotEq,
            TagToken::Equals => Token::Equals,
            TagToken::Pipe => Token::Pipe,
            TagToken::Colon => Token::Colon,
            TagToken::Dot => Token::Dot,
            TagToken::Comma => Token::Comma,
            TagToken::ParenOpen => Token::ParenOpen,
            TagToken::ParenClose => Token::ParenClose,
            TagToken::Slash => Token::Slash,
            TagToken::Ident(s) => Token::Ident(s),
            TagToken::Str(s) => Token::Str(s),
            TagToken::Int(n) => Token::Int(n),
            TagToken::Float(n) => Token::Float(n),
        }
    }
}

/// Strip the surrounding quotes and resolve backslash escapes
fn unquote(slice: &str) -> String {
    let inner = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Lex template source into tokens with spans
pub fn lex(input: &str) -> Vec<(Token, Span)> {
    let mut tokens: Vec<(Token, Span)> = Vec::new();
    let mut segments = Segment::lexer(input);

    while let Some(segment) = segments.next() {
        let span = segments.span();
        let slice = segments.slice();
        match segment {
            Ok(Segment::Comment) => {}
            Ok(Segment::Output) => {
                tokens.push((Token::OutputOpen, span.start..span.start + 2));
                lex_inner(&slice[2..slice.len() - 2], span.start + 2, &mut tokens);
                tokens.push((Token::OutputClose, span.end - 2..span.end));
            }
            Ok(Segment::Tag) => {
                tokens.push((Token::TagOpen, span.start..span.start + 2));
                lex_inner(&slice[2..slice.len() - 2], span.start + 2, &mut tokens);
                tokens.push((Token::TagClose, span.end - 2..span.end));
            }
            Ok(Segment::Text) | Ok(Segment::Brace) | Err(_) => push_text(&mut tokens, slice, span),
        }
    }

    tokens
}

fn lex_inner(source: &str, offset: usize, tokens: &mut Vec<(Token, Span)>) {
    tokens.extend(TagToken::lexer(source).spanned().map(|(tok, span)| {
        let token = match tok {
            Ok(tok) => tok.into(),
            Err(()) => Token::Error(source[span.clone()].to_string()),
        };
        (token, span.start + offset..span.end + offset)
    }));
}

fn push_text(tokens: &mut Vec<(Token, Span)>, slice: &str, span: Span) {
    if let Some((Token::Text(prev), prev_span)) = tokens.last_mut() {
        if prev_span.end == span.start {
            prev.push_str(slice);
            prev_span.end = span.end;
            return;
        }
    }
    tokens.push((Token::Text(slice.to_string()), span));
}
