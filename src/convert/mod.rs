//! Token → typed value conversion.
//!
//! A `ConverterSet` is an ordered list of `ParameterConverter`s. The first
//! converter that claims a parameter type parses the token; when none does,
//! a generic fallback handles strings, chars and longs.

pub mod builtin;

use crate::error::ConsoleError;
use crate::model::{ParamType, Value};
use crate::scene::ObjectDirectory;

pub use builtin::{
    BoolConverter, DoubleConverter, EnumConverter, FloatConverter, IntConverter, ObjectConverter,
    VectorConverter,
};

/// What a converter may consult while parsing.
pub struct ParseContext<'a> {
    pub directory: &'a dyn ObjectDirectory,
}

pub trait ParameterConverter: Send + Sync {
    fn can_parse(&self, ty: &ParamType) -> bool;

    /// Parse `token` for the parameter `param_name` of type `ty`.
    fn parse(
        &self,
        token: &str,
        ty: &ParamType,
        param_name: &str,
        ctx: &ParseContext<'_>,
    ) -> Result<Value, ConsoleError>;
}

pub struct ConverterSet {
    converters: Vec<Box<dyn ParameterConverter>>,
}

impl ConverterSet {
    /// No converters; only the fallback applies.
    pub fn empty() -> Self {
        Self {
            converters: Vec::new(),
        }
    }

    /// Append a converter. Earlier converters keep precedence.
    pub fn push(&mut self, converter: impl ParameterConverter + 'static) {
        self.converters.push(Box::new(converter));
    }

    pub fn with(mut self, converter: impl ParameterConverter + 'static) -> Self {
        self.push(converter);
        self
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    pub fn parse(
        &self,
        token: &str,
        ty: &ParamType,
        param_name: &str,
        ctx: &ParseContext<'_>,
    ) -> Result<Value, ConsoleError> {
        match self.converters.iter().find(|c| c.can_parse(ty)) {
            Some(converter) => converter.parse(token, ty, param_name, ctx),
            None => fallback(token, ty, param_name),
        }
    }
}

impl Default for ConverterSet {
    /// The built-in converters, in lookup order.
    fn default() -> Self {
        Self::empty()
            .with(BoolConverter)
            .with(IntConverter)
            .with(FloatConverter)
            .with(DoubleConverter)
            .with(VectorConverter)
            .with(EnumConverter)
            .with(ObjectConverter)
    }
}

/// Generic conversion for types no converter claims.
fn fallback(token: &str, ty: &ParamType, param_name: &str) -> Result<Value, ConsoleError> {
    match ty {
        ParamType::String => Ok(Value::Str(token.to_string())),
        ParamType::Char => {
            let mut chars = token.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Char(c)),
                _ => Err(ConsoleError::parse(param_name, token, "expected a single character")),
            }
        }
        ParamType::Long => token
            .parse::<i64>()
            .map(Value::Long)
            .map_err(|e| ConsoleError::parse(param_name, token, e.to_string())),
        other => Err(ConsoleError::UnsupportedParameterType {
            parameter: param_name.to_string(),
            type_name: other.display_name(),
        }),
    }
}
