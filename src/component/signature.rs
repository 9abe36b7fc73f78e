//! Binding call-site arguments to a component's declared parameters

use thiserror::Error;

use crate::context::Data;
use crate::value::Value;

/// Errors binding call-site arguments to parameters
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ArgumentError {
    #[error("missing required argument '{name}'")]
    Missing { name: String },

    #[error("unexpected keyword argument '{name}'")]
    Unexpected { name: String },

    #[error("takes {expected} positional arguments but {given} were given")]
    TooMany { expected: usize, given: usize },

    #[error("got multiple values for argument '{name}'")]
    Duplicate { name: String },
}

/// A declared parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    /// `None` marks a required parameter
    pub default: Option<Value>,
}

/// The parameters a component's data-building step accepts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    params: Vec<Param>,
    /// Accept keyword arguments with no matching parameter
    extra_kwargs: bool,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required parameter
    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param {
            name: name.into(),
            default: None,
        });
        self
    }

    /// Add a parameter with a default value
    pub fn optional(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.params.push(Param {
            name: name.into(),
            default: Some(default.into()),
        });
        self
    }

    /// Accept arbitrary extra keyword arguments
    pub fn with_extra_kwargs(mut self) -> Self {
        self.extra_kwargs = true;
        self
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Bind positional and keyword arguments, applying defaults
    pub fn bind(
        &self,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> Result<BoundArgs, ArgumentError> {
        if args.len() > self.params.len() {
            return Err(ArgumentError::TooMany {
                expected: self.params.len(),
                given: args.len(),
            });
        }

        let mut slots: Vec<Option<Value>> = vec![None; self.params.len()];
        for (slot, value) in slots.iter_mut().zip(args) {
            *slot = Some(value);
        }

        let mut extra = Vec::new();
        for (name, value) in kwargs {
            match self.params.iter().position(|p| p.name == name) {
                Some(index) if slots[index].is_some() => {
                    return Err(ArgumentError::Duplicate { name });
                }
                Some(index) => slots[index] = Some(value),
                None if self.extra_kwargs => {
                    if extra.iter().any(|(n, _): &(String, Value)| *n == name) {
                        return Err(ArgumentError::Duplicate { name });
                    }
                    extra.push((name, value));
                }
                None => return Err(ArgumentError::Unexpected { name }),
            }
        }

        let mut values = Vec::with_capacity(self.params.len() + extra.len());
        for (param, slot) in self.params.iter().zip(slots) {
            let value = match (slot, &param.default) {
                (Some(value), _) => value,
                (None, Some(default)) => default.clone(),
                (None, None) => {
                    return Err(ArgumentError::Missing {
                        name: param.name.clone(),
                    })
                }
            };
            values.push((param.name.clone(), value));
        }
        values.extend(extra);

        Ok(BoundArgs { values })
    }
}

/// Arguments after binding, in parameter order followed by extra keywords
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArgs {
    values: Vec<(String, Value)>,
}

impl BoundArgs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// All bound arguments as template data
    pub fn to_data(&self) -> Data {
        self.values.iter().cloned().collect()
    }
}
