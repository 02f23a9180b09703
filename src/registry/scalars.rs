//! Input parsing and output coercion of the built-in scalars.
//!
//! Int is 32-bit range-checked per the GraphQL spec; ID accepts strings and
//! integers and always coerces to a string. Unknown scalar names pass values
//! through unchanged so custom scalars without closures behave like JSON.

use crate::{
    error::{Error, Result},
    value::{ConstValue, Number},
};

/// Coerce an input literal or variable value. The value is never `Null`;
/// nullability is handled by the surrounding coercion.
pub(crate) fn parse_by_name(name: &str, value: ConstValue) -> Result<ConstValue> {
    match name {
        "Int" => match &value {
            ConstValue::Number(number) if as_int(number).is_some() => Ok(value),
            _ => Err(parse_error(name, &value)),
        },
        "Float" => match &value {
            ConstValue::Number(_) => Ok(value),
            _ => Err(parse_error(name, &value)),
        },
        "String" => match &value {
            ConstValue::String(_) => Ok(value),
            _ => Err(parse_error(name, &value)),
        },
        "Boolean" => match &value {
            ConstValue::Boolean(_) => Ok(value),
            _ => Err(parse_error(name, &value)),
        },
        "ID" => match value {
            ConstValue::String(_) => Ok(value),
            ConstValue::Number(number) if number.is_i64() || number.is_u64() => {
                Ok(ConstValue::String(number.to_string()))
            }
            _ => Err(parse_error(name, &value)),
        },
        _ => Ok(value),
    }
}

/// Coerce a resolved value for output. `None` completes to `null`.
pub(crate) fn coerce_by_name(name: &str, value: &ConstValue) -> Option<ConstValue> {
    match name {
        "Int" => match value {
            ConstValue::Number(number) => {
                as_int(number).map(|int| ConstValue::Number(int.into()))
            }
            _ => None,
        },
        "Float" => match value {
            ConstValue::Number(_) => Some(value.clone()),
            _ => None,
        },
        "String" => match value {
            ConstValue::String(_) => Some(value.clone()),
            _ => None,
        },
        "Boolean" => match value {
            ConstValue::Boolean(_) => Some(value.clone()),
            _ => None,
        },
        "ID" => match value {
            ConstValue::String(_) => Some(value.clone()),
            ConstValue::Number(number) if number.is_i64() || number.is_u64() => {
                Some(ConstValue::String(number.to_string()))
            }
            _ => None,
        },
        _ => Some(value.clone()),
    }
}

fn as_int(number: &Number) -> Option<i32> {
    number.as_i64().and_then(|int| i32::try_from(int).ok())
}

fn parse_error(name: &str, value: &ConstValue) -> Error {
    Error::new(format!("cannot parse a {} into a {name}", value.kind_str()))
}
