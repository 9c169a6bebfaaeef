//! Builtin coercers for [`Contract::coerce`](super::Contract::coerce).
//!
//! Each coercer takes ownership of the argument and returns the converted
//! value, or an error that the guard passes through unchanged.

use thiserror::Error;

use crate::error::BoxError;
use crate::repr::{class_repr, short_repr};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoerceError {
    #[error("invalid literal for {target}(): {literal}")]
    InvalidLiteral {
        target: &'static str,
        literal: String,
    },

    #[error("{target}() argument must be a string or a number, not '{actual}'")]
    Unsupported {
        target: &'static str,
        actual: String,
    },

    #[error("cannot convert float {0} to integer")]
    NotFinite(String),

    #[error("float {0} is out of range for int")]
    OutOfRange(String),
}

fn unsupported(target: &'static str, value: &Value) -> BoxError {
    Box::new(CoerceError::Unsupported {
        target,
        actual: class_repr(&value.class()),
    })
}

fn invalid_literal(target: &'static str, value: &Value) -> BoxError {
    Box::new(CoerceError::InvalidLiteral {
        target,
        literal: short_repr(value),
    })
}

/// Drop digit separators. An underscore must sit between two digits.
fn strip_separators(literal: &str) -> Option<String> {
    let bytes = literal.as_bytes();
    let digit_at = |i: Option<usize>| i.and_then(|i| bytes.get(i)).is_some_and(u8::is_ascii_digit);
    let well_placed = bytes
        .iter()
        .enumerate()
        .filter(|&(_, &b)| b == b'_')
        .all(|(i, _)| digit_at(i.checked_sub(1)) && digit_at(Some(i + 1)));
    well_placed.then(|| literal.replace('_', ""))
}

/// Convert to `int`. Floats truncate toward zero; strings are parsed.
pub fn to_int(value: Value) -> Result<Value, BoxError> {
    match value {
        Value::Int(_) => Ok(value),
        Value::Bool(b) => Ok(Value::Int(i64::from(b))),
        Value::Float(f) => {
            if !f.is_finite() {
                return Err(Box::new(CoerceError::NotFinite(format!("{f}"))));
            }
            let truncated = f.trunc();
            // i64::MAX rounds up to 2^63 as a float, so the upper bound is exclusive.
            if truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
                Ok(Value::Int(truncated as i64))
            } else {
                Err(Box::new(CoerceError::OutOfRange(format!("{f}"))))
            }
        }
        Value::Str(ref s) => strip_separators(s.trim())
            .and_then(|digits| digits.parse::<i64>().ok())
            .map(Value::Int)
            .ok_or_else(|| invalid_literal("int", &value)),
        other => Err(unsupported("int", &other)),
    }
}

/// Convert to `float`. Strings are parsed, including `inf` and `nan`.
pub fn to_float(value: Value) -> Result<Value, BoxError> {
    match value {
        Value::Float(_) => Ok(value),
        Value::Int(i) => Ok(Value::Float(i as f64)),
        Value::Bool(b) => Ok(Value::Float(if b { 1.0 } else { 0.0 })),
        Value::Str(ref s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| invalid_literal("float", &value)),
        other => Err(unsupported("float", &other)),
    }
}

/// Convert to `str`. Strings are kept; anything else uses its display form.
pub fn to_str(value: Value) -> Result<Value, BoxError> {
    match value {
        Value::Str(_) => Ok(value),
        other => Ok(Value::Str(other.to_string())),
    }
}

/// Convert to `bool` by truthiness: zero, `None` and empty containers are false.
pub fn to_bool(value: Value) -> Result<Value, BoxError> {
    let truthy = match &value {
        Value::None => false,
        Value::Bool(b) => *b,
        Value::Int(i) => *i != 0,
        Value::Float(f) => *f != 0.0,
        Value::Str(s) => !s.is_empty(),
        Value::Bytes(b) => !b.is_empty(),
        Value::List(items) | Value::Tuple(items) => !items.is_empty(),
        Value::Dict(pairs) => !pairs.is_empty(),
        Value::Class(_) | Value::Object(_) => true,
    };
    Ok(Value::Bool(truthy))
}
