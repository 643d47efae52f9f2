use std::str::FromStr;

use crate::error::ConsoleError;
use crate::model::{
    EnumValue, ObjectRef, ParamType, Value, Vector2, Vector2Int, Vector3, Vector3Int,
};
use crate::registry::validation::validate_finite;

use super::{ParameterConverter, ParseContext};

/// `1/0`, `true/false`, `yes/no`, `on/off`, any case.
pub struct BoolConverter;

impl ParameterConverter for BoolConverter {
    fn can_parse(&self, ty: &ParamType) -> bool {
        matches!(ty, ParamType::Bool)
    }

    fn parse(&self, token: &str, _: &ParamType, param_name: &str, _: &ParseContext<'_>) -> Result<Value, ConsoleError> {
        match token.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Value::Bool(true)),
            "0" | "false" | "no" | "off" => Ok(Value::Bool(false)),
            _ => Err(ConsoleError::parse(
                param_name,
                token,
                "expected one of 1/0, true/false, yes/no, on/off",
            )),
        }
    }
}

pub struct IntConverter;

impl ParameterConverter for IntConverter {
    fn can_parse(&self, ty: &ParamType) -> bool {
        matches!(ty, ParamType::Int)
    }

    fn parse(&self, token: &str, _: &ParamType, param_name: &str, _: &ParseContext<'_>) -> Result<Value, ConsoleError> {
        token
            .parse::<i32>()
            .map(Value::Int)
            .map_err(|e| ConsoleError::parse(param_name, token, e.to_string()))
    }
}

pub struct FloatConverter;

impl ParameterConverter for FloatConverter {
    fn can_parse(&self, ty: &ParamType) -> bool {
        matches!(ty, ParamType::Float)
    }

    fn parse(&self, token: &str, _: &ParamType, param_name: &str, _: &ParseContext<'_>) -> Result<Value, ConsoleError> {
        parse_finite::<f32>(token, param_name).map(Value::Float)
    }
}

pub struct DoubleConverter;

impl ParameterConverter for DoubleConverter {
    fn can_parse(&self, ty: &ParamType) -> bool {
        matches!(ty, ParamType::Double)
    }

    fn parse(&self, token: &str, _: &ParamType, param_name: &str, _: &ParseContext<'_>) -> Result<Value, ConsoleError> {
        parse_finite::<f64>(token, param_name).map(Value::Double)
    }
}

/// Comma-separated components with the exact arity of the vector type,
/// e.g. `1,2,3` for a 3D vector. No spaces inside the token.
pub struct VectorConverter;

impl ParameterConverter for VectorConverter {
    fn can_parse(&self, ty: &ParamType) -> bool {
        matches!(
            ty,
            ParamType::Vector2 | ParamType::Vector2Int | ParamType::Vector3 | ParamType::Vector3Int
        )
    }

    fn parse(&self, token: &str, ty: &ParamType, param_name: &str, _: &ParseContext<'_>) -> Result<Value, ConsoleError> {
        match ty {
            ParamType::Vector2 => {
                let [x, y] = components::<f32, 2>(token, param_name)?;
                Ok(Value::Vector2(Vector2::new(x, y)))
            }
            ParamType::Vector2Int => {
                let [x, y] = components::<i32, 2>(token, param_name)?;
                Ok(Value::Vector2Int(Vector2Int::new(x, y)))
            }
            ParamType::Vector3 => {
                let [x, y, z] = components::<f32, 3>(token, param_name)?;
                Ok(Value::Vector3(Vector3::new(x, y, z)))
            }
            ParamType::Vector3Int => {
                let [x, y, z] = components::<i32, 3>(token, param_name)?;
                Ok(Value::Vector3Int(Vector3Int::new(x, y, z)))
            }
            other => Err(ConsoleError::UnsupportedParameterType {
                parameter: param_name.to_string(),
                type_name: other.display_name(),
            }),
        }
    }
}

/// Variant names, case-insensitive; the value carries the canonical spelling.
pub struct EnumConverter;

impl ParameterConverter for EnumConverter {
    fn can_parse(&self, ty: &ParamType) -> bool {
        matches!(ty, ParamType::Enum(_))
    }

    fn parse(&self, token: &str, ty: &ParamType, param_name: &str, _: &ParseContext<'_>) -> Result<Value, ConsoleError> {
        let ParamType::Enum(enum_type) = ty else {
            return Err(ConsoleError::UnsupportedParameterType {
                parameter: param_name.to_string(),
                type_name: ty.display_name(),
            });
        };
        let variant = enum_type.variant(token).ok_or_else(|| {
            ConsoleError::parse(
                param_name,
                token,
                format!("expected one of {}", enum_type.variants.join(", ")),
            )
        })?;
        Ok(Value::Enum(EnumValue {
            ty: enum_type.name.clone(),
            variant: variant.to_string(),
        }))
    }
}

/// Looks the token up as the name of an active live object. When the
/// parameter names a component type, the object must carry one.
pub struct ObjectConverter;

impl ParameterConverter for ObjectConverter {
    fn can_parse(&self, ty: &ParamType) -> bool {
        matches!(ty, ParamType::Object(_))
    }

    fn parse(&self, token: &str, ty: &ParamType, param_name: &str, ctx: &ParseContext<'_>) -> Result<Value, ConsoleError> {
        let object = ctx
            .directory
            .find_object(token)
            .ok_or_else(|| ConsoleError::parse(param_name, token, "no active object with that name"))?;

        let component = match ty {
            ParamType::Object(Some(key)) => {
                let found = object.component(key).cloned().ok_or_else(|| {
                    ConsoleError::parse(
                        param_name,
                        token,
                        format!("object has no component of type '{}'", key.short_name()),
                    )
                })?;
                Some(found)
            }
            _ => None,
        };

        Ok(Value::Object(ObjectRef {
            name: object.name,
            component,
        }))
    }
}

fn parse_finite<T>(token: &str, param_name: &str) -> Result<T, ConsoleError>
where
    T: FromStr + Into<f64> + Copy,
    T::Err: std::fmt::Display,
{
    let value = token
        .parse::<T>()
        .map_err(|e| ConsoleError::parse(param_name, token, e.to_string()))?;
    validate_finite(value.into(), param_name).map_err(|reason| ConsoleError::parse(param_name, token, reason))?;
    Ok(value)
}

fn components<T, const N: usize>(token: &str, param_name: &str) -> Result<[T; N], ConsoleError>
where
    T: FromStr + Default + Copy,
    T::Err: std::fmt::Display,
{
    let parts: Vec<&str> = token.split(',').collect();
    if parts.len() != N {
        return Err(ConsoleError::parse(
            param_name,
            token,
            format!("expected {N} comma-separated components, got {}", parts.len()),
        ));
    }
    let mut out = [T::default(); N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part
            .trim()
            .parse::<T>()
            .map_err(|e| ConsoleError::parse(param_name, token, e.to_string()))?;
    }
    Ok(out)
}
