use std::fmt;

use serde::{Deserialize, Serialize};

use super::value::{EnumValue, Value};
use super::vector::{Vector2, Vector2Int, Vector3, Vector3Int};

/// Stable identity of a declaring type. Built from `std::any::type_name`, so
/// it survives restarts as long as the type keeps its path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeKey(String);

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self(std::any::type_name::<T>().to_string())
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment, e.g. `Player` for `game::player::Player`.
    pub fn short_name(&self) -> &str {
        self.0.rsplit("::").next().unwrap_or(&self.0)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A closed set of named variants a parameter accepts, matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    pub variants: Vec<String>,
}

impl EnumType {
    /// Canonical spelling of `token`, if it names a variant.
    pub fn variant(&self, token: &str) -> Option<&str> {
        self.variants
            .iter()
            .find(|v| v.eq_ignore_ascii_case(token))
            .map(String::as_str)
    }
}

/// The declared type of a command parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Bool,
    Int,
    Long,
    Float,
    Double,
    Char,
    String,
    Vector2,
    Vector2Int,
    Vector3,
    Vector3Int,
    Enum(EnumType),
    /// A named live object, optionally narrowed to one of its components.
    Object(Option<TypeKey>),
    /// Any other type. Only an appended converter can claim it.
    Named(String),
}

impl ParamType {
    /// Enum parameter whose variant names follow the serde spelling of `T`.
    pub fn enumeration<T: Serialize>(name: &str, variants: &[T]) -> Self {
        ParamType::Enum(EnumType {
            name: name.to_string(),
            variants: crate::util::serde_variant_names(variants),
        })
    }

    /// Object reference narrowed to the component `T`.
    pub fn component<T: 'static>() -> Self {
        ParamType::Object(Some(TypeKey::of::<T>()))
    }

    /// Identity string persisted in the command cache.
    pub fn identity(&self) -> String {
        match self {
            ParamType::Bool => "bool".into(),
            ParamType::Int => "int".into(),
            ParamType::Long => "long".into(),
            ParamType::Float => "float".into(),
            ParamType::Double => "double".into(),
            ParamType::Char => "char".into(),
            ParamType::String => "string".into(),
            ParamType::Vector2 => "vector2".into(),
            ParamType::Vector2Int => "vector2int".into(),
            ParamType::Vector3 => "vector3".into(),
            ParamType::Vector3Int => "vector3int".into(),
            ParamType::Enum(e) => format!("enum:{}", e.name),
            ParamType::Object(None) => "object".into(),
            ParamType::Object(Some(key)) => format!("object:{key}"),
            ParamType::Named(name) => format!("named:{name}"),
        }
    }

    /// Short name used in parameter signatures.
    pub fn display_name(&self) -> String {
        match self {
            ParamType::Vector2 => "Vector2".into(),
            ParamType::Vector2Int => "Vector2Int".into(),
            ParamType::Vector3 => "Vector3".into(),
            ParamType::Vector3Int => "Vector3Int".into(),
            ParamType::Enum(e) => e.name.clone(),
            ParamType::Object(None) => "object".into(),
            ParamType::Object(Some(key)) => key.short_name().to_string(),
            ParamType::Named(name) => name.clone(),
            other => other.identity(),
        }
    }

    /// Value an optional parameter takes when it declares no default.
    pub fn zero_value(&self) -> Value {
        match self {
            ParamType::Bool => Value::Bool(false),
            ParamType::Int => Value::Int(0),
            ParamType::Long => Value::Long(0),
            ParamType::Float => Value::Float(0.0),
            ParamType::Double => Value::Double(0.0),
            ParamType::Char => Value::Char('\0'),
            ParamType::String => Value::Str(String::new()),
            ParamType::Vector2 => Value::Vector2(Vector2::ZERO),
            ParamType::Vector2Int => Value::Vector2Int(Vector2Int::ZERO),
            ParamType::Vector3 => Value::Vector3(Vector3::ZERO),
            ParamType::Vector3Int => Value::Vector3Int(Vector3Int::ZERO),
            ParamType::Enum(e) => e.variants.first().map_or(Value::Null, |v| {
                Value::Enum(EnumValue {
                    ty: e.name.clone(),
                    variant: v.clone(),
                })
            }),
            ParamType::Object(_) | ParamType::Named(_) => Value::Null,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}
