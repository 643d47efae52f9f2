use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use super::vector::{Vector2, Vector2Int, Vector3, Vector3Int};
use super::Instance;

/// A parsed command argument.
#[derive(Debug, Clone)]
pub enum Value {
    /// Zero value of reference-like types (objects, custom types).
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    Str(String),
    Vector2(Vector2),
    Vector2Int(Vector2Int),
    Vector3(Vector3),
    Vector3Int(Vector3Int),
    Enum(EnumValue),
    Object(ObjectRef),
    /// Produced by converters appended outside this crate.
    Custom(Arc<dyn Any + Send + Sync>),
}

/// A variant of an enum parameter, in its canonical spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub ty: String,
    pub variant: String,
}

impl EnumValue {
    /// Deserialize the variant into a Rust enum using serde's own rules.
    pub fn to<T: DeserializeOwned>(&self) -> Option<T> {
        crate::util::from_serde_str(&self.variant)
    }
}

/// A live object found by name, optionally narrowed to one component.
#[derive(Debug, Clone)]
pub struct ObjectRef {
    pub name: String,
    pub component: Option<Instance>,
}

impl ObjectRef {
    pub fn component<T: Any>(&self) -> Option<&T> {
        self.component.as_ref()?.downcast_ref::<T>()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && match (&self.component, &other.component) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            }
    }
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_custom<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Custom(v) => v.downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Vector2(a), Value::Vector2(b)) => a == b,
            (Value::Vector2Int(a), Value::Vector2Int(b)) => a == b,
            (Value::Vector3(a), Value::Vector3(b)) => a == b,
            (Value::Vector3Int(a), Value::Vector3Int(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Custom(a), Value::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Char(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
            Value::Vector2(v) => write!(f, "{v}"),
            Value::Vector2Int(v) => write!(f, "{v}"),
            Value::Vector3(v) => write!(f, "{v}"),
            Value::Vector3Int(v) => write!(f, "{v}"),
            Value::Enum(v) => f.write_str(&v.variant),
            Value::Object(v) => f.write_str(&v.name),
            Value::Custom(_) => f.write_str("<custom>"),
        }
    }
}

/// Typed extraction of an argument inside command code.
pub trait FromValue: Sized {
    /// Name used in "expected ..." messages.
    const EXPECTED: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! from_value_copy {
    ($($ty:ty => $variant:ident, $name:literal;)*) => {
        $(
            impl FromValue for $ty {
                const EXPECTED: &'static str = $name;

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(*v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

from_value_copy! {
    bool => Bool, "bool";
    i32 => Int, "int";
    f32 => Float, "float";
    char => Char, "char";
    Vector2 => Vector2, "Vector2";
    Vector2Int => Vector2Int, "Vector2Int";
    Vector3 => Vector3, "Vector3";
    Vector3Int => Vector3Int, "Vector3Int";
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "long";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Long(v) => Some(*v),
            Value::Int(v) => Some(i64::from(*v)),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "double";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Double(v) => Some(*v),
            Value::Float(v) => Some(f64::from(*v)),
            _ => None,
        }
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "string";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(ToString::to_string)
    }
}

impl FromValue for EnumValue {
    const EXPECTED: &'static str = "enum";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Enum(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromValue for ObjectRef {
    const EXPECTED: &'static str = "object";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_object().cloned()
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_value(value: &Value) -> Option<Self> {
        if value.is_null() {
            Some(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}
