//! Output filters and comparisons

use crate::parser::Filter;
use crate::value::{escape_html, Value};

/// Apply one filter; `arg` is the evaluated filter argument, if it takes one
pub fn apply(filter: &Filter, value: Value, arg: Option<Value>) -> Value {
    match filter {
        Filter::Upper => Value::String(value.to_string().to_uppercase()),
        Filter::Lower => Value::String(value.to_string().to_lowercase()),
        Filter::Title => Value::String(title_case(&value.to_string())),
        Filter::Length => Value::Int(value.len() as i64),
        Filter::Safe => match value {
            Value::Safe(_) => value,
            other => Value::Safe(other.to_string()),
        },
        Filter::Escape => match value {
            Value::Safe(_) => value,
            other => Value::Safe(escape_html(&other.to_string())),
        },
        Filter::Default(_) => {
            if value.is_truthy() {
                value
            } else {
                arg.unwrap_or(Value::None)
            }
        }
        Filter::Join(_) => {
            let separator = arg.map(|a| a.render()).unwrap_or_default();
            let joined = value
                .iter_items()
                .iter()
                .map(Value::render)
                .collect::<Vec<_>>()
                .join(&separator);
            Value::Safe(joined)
        }
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphanumeric() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = c != '\'';
        }
    }
    out
}

/// Equality used by `==` and `!=`; numbers compare by value, strings ignore safeness
pub fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => (*x as f64) == *y,
        (Value::String(x) | Value::Safe(x), Value::String(y) | Value::Safe(y)) => x == y,
        _ => a == b,
    }
}
