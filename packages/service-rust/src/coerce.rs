//! Conversion of loosely-typed argument values to declared parameter types.
//!
//! Lossy transports deliver numbers as text, characters as one-letter
//! strings, timestamps as formatted text. Coercion recovers the declared
//! types where a conversion is unambiguous and rejects everything else.
//! `null` is accepted for every parameter.

use mrl_core::time::parse_timestamp;
use mrl_core::Value;

use crate::descriptor::{ParamKind, ParamType};

/// Why an argument list does not fit a parameter list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoercionError {
    #[error("expected {expected} arguments, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },
    #[error("argument {index}: {value_type} is not convertible to {param_type}")]
    Incompatible {
        index: usize,
        value_type: String,
        param_type: String,
    },
    #[error("argument {index}: {value} is out of range for {param_type}")]
    OutOfRange {
        index: usize,
        value: String,
        param_type: String,
    },
}

enum Mismatch {
    Incompatible,
    OutOfRange,
}

fn integer_in_range(i: i64, kind: ParamKind) -> Result<Value, Mismatch> {
    let fits = match kind {
        ParamKind::I8 => i8::try_from(i).is_ok(),
        ParamKind::I16 => i16::try_from(i).is_ok(),
        ParamKind::I32 => i32::try_from(i).is_ok(),
        _ => true,
    };
    if fits {
        Ok(Value::Int(i))
    } else {
        Err(Mismatch::OutOfRange)
    }
}

fn float_in_range(f: f64, kind: ParamKind) -> Result<Value, Mismatch> {
    if kind == ParamKind::F32 && f.is_finite() && f.abs() > f64::from(f32::MAX) {
        Err(Mismatch::OutOfRange)
    } else {
        Ok(Value::Float(f))
    }
}

fn same_type_name(value_type: &str, param_type: &str) -> bool {
    value_type == param_type
        || mrl_core::naming::simple_name(value_type) == mrl_core::naming::simple_name(param_type)
}

#[allow(clippy::cast_precision_loss)]
fn coerce_value(value: &Value, param: &ParamType) -> Result<Value, Mismatch> {
    let kind = param.kind();
    match (kind, value) {
        (_, Value::Null) => Ok(Value::Null),

        (ParamKind::Bool, Value::Bool(b)) => Ok(Value::Bool(*b)),
        (ParamKind::Bool, Value::String(s)) => match s.to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(Mismatch::Incompatible),
        },

        (ParamKind::Char, Value::Char(c)) => Ok(Value::Char(*c)),
        (ParamKind::Char, Value::String(s)) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Char(c)),
                _ => Err(Mismatch::Incompatible),
            }
        }

        (ParamKind::I8 | ParamKind::I16 | ParamKind::I32 | ParamKind::I64, Value::Int(i)) => {
            integer_in_range(*i, kind)
        }
        (ParamKind::I8 | ParamKind::I16 | ParamKind::I32 | ParamKind::I64, Value::String(s)) => {
            let i = s.trim().parse::<i64>().map_err(|_| Mismatch::Incompatible)?;
            integer_in_range(i, kind)
        }

        (ParamKind::F32 | ParamKind::F64, Value::Float(f)) => float_in_range(*f, kind),
        (ParamKind::F32 | ParamKind::F64, Value::Int(i)) => float_in_range(*i as f64, kind),
        (ParamKind::F32 | ParamKind::F64, Value::String(s)) => {
            let f = s.trim().parse::<f64>().map_err(|_| Mismatch::Incompatible)?;
            float_in_range(f, kind)
        }

        (ParamKind::Text, Value::String(s)) => Ok(Value::String(s.clone())),
        (ParamKind::Text, Value::Char(c)) => Ok(Value::String(c.to_string())),

        (ParamKind::Listener, Value::Listener(l)) => Ok(Value::Listener(l.clone())),

        (ParamKind::Timestamp, Value::Timestamp(ms) | Value::Int(ms)) => Ok(Value::Timestamp(*ms)),
        (ParamKind::Timestamp, Value::String(s)) => parse_timestamp(s)
            .map(Value::Timestamp)
            .ok_or(Mismatch::Incompatible),

        (ParamKind::Other, Value::Object { type_name, .. }) => {
            if same_type_name(type_name, param.type_name()) {
                Ok(value.clone())
            } else {
                Err(Mismatch::Incompatible)
            }
        }
        (ParamKind::Other, Value::Map(_) | Value::Array(_) | Value::Bytes(_)) => Ok(value.clone()),

        _ => Err(Mismatch::Incompatible),
    }
}

/// Whether `value` can be passed for `param`.
#[must_use]
pub fn accepts(param: &ParamType, value: &Value) -> bool {
    coerce_value(value, param).is_ok()
}

/// Coerces `args` positionally to `params`.
///
/// # Errors
///
/// Returns [`CoercionError`] naming the first argument that does not fit, or
/// an arity mismatch.
pub fn coerce_args(args: &[Value], params: &[ParamType]) -> Result<Vec<Value>, CoercionError> {
    if args.len() != params.len() {
        return Err(CoercionError::ArityMismatch {
            expected: params.len(),
            actual: args.len(),
        });
    }
    args.iter()
        .zip(params)
        .enumerate()
        .map(|(index, (value, param))| {
            coerce_value(value, param).map_err(|mismatch| match mismatch {
                Mismatch::Incompatible => CoercionError::Incompatible {
                    index,
                    value_type: value.type_name().to_string(),
                    param_type: param.type_name().to_string(),
                },
                Mismatch::OutOfRange => CoercionError::OutOfRange {
                    index,
                    value: value.simple_text().unwrap_or_default(),
                    param_type: param.type_name().to_string(),
                },
            })
        })
        .collect()
}
