//! Shape-directed type coercion.

use serde_json::{Number, Value};

use crate::context::ConversionContext;
use crate::error::{ConversionCause, ConversionError, FieldPath};
use crate::shape::{PrimitiveKind, TypeShape};

/// Runtime type name of a value, for diagnostics.
pub(crate) fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "object",
    }
}

/// Coerces a parsed value against a declared shape, producing a value tree
/// that conforms to the shape exactly.
///
/// Dispatch is an explicit match over the closed [`TypeShape`] union. In
/// strict mode only exact runtime-type matches pass. Flexible mode permits
/// a narrow, enumerated conversion set: integral string → int, numeric
/// string → float, case-insensitive `"true"`/`"false"` → bool, number →
/// string. A fractional value never coerces into an int field, in either
/// mode.
///
/// The first failure aborts the whole coercion with the path to the
/// offending value; no partial result is ever produced.
pub fn coerce(
    value: &Value,
    shape: &TypeShape,
    ctx: &ConversionContext,
    path: &FieldPath,
) -> Result<Value, ConversionError> {
    match shape {
        TypeShape::Primitive(kind) => coerce_primitive(value, *kind, ctx, path),

        TypeShape::Optional(inner) => {
            if value.is_null() {
                Ok(Value::Null)
            } else {
                coerce(value, inner, ctx, path)
            }
        }

        TypeShape::List(element) => {
            let items = value.as_array().ok_or_else(|| {
                ConversionError::new(
                    path.clone(),
                    ConversionCause::ExpectedSequence {
                        found: value_type_name(value),
                    },
                )
            })?;
            let mut out = Vec::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                out.push(coerce(item, element, ctx, &path.index(idx))?);
            }
            Ok(Value::Array(out))
        }

        TypeShape::Union(alternatives) => {
            let mut reasons = Vec::with_capacity(alternatives.len());
            for alternative in alternatives {
                match coerce(value, alternative, ctx, path) {
                    Ok(conformed) => return Ok(conformed),
                    Err(err) => reasons.push(format!("{}: {}", alternative.type_name(), err.cause)),
                }
            }
            Err(ConversionError::new(
                path.clone(),
                ConversionCause::NoUnionMatch { reasons },
            ))
        }

        TypeShape::Enum { name, values } => coerce_enum(value, name, values, path),

        TypeShape::Composite(composite) => super::convert_composite(value, composite, ctx, path),
    }
}

fn coerce_primitive(
    value: &Value,
    kind: PrimitiveKind,
    ctx: &ConversionContext,
    path: &FieldPath,
) -> Result<Value, ConversionError> {
    let mismatch = || ConversionError::type_mismatch(path.clone(), kind.name(), value_type_name(value));

    match kind {
        PrimitiveKind::String => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(n) if !ctx.strict => Ok(Value::String(n.to_string())),
            _ => Err(mismatch()),
        },
        PrimitiveKind::Int => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
            Value::String(s) if !ctx.strict => parse_int(s).ok_or_else(mismatch),
            _ => Err(mismatch()),
        },
        PrimitiveKind::Float => match value {
            // An integral literal is an exact member of the float domain.
            Value::Number(_) => Ok(value.clone()),
            Value::String(s) if !ctx.strict => parse_float(s).ok_or_else(mismatch),
            _ => Err(mismatch()),
        },
        PrimitiveKind::Bool => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::String(s) if !ctx.strict => match s.trim().to_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(mismatch()),
            },
            _ => Err(mismatch()),
        },
    }
}

/// Parses an integral string. Fractional text is rejected rather than
/// truncated.
fn parse_int(s: &str) -> Option<Value> {
    let trimmed = s.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(Value::Number(n.into()));
    }
    if let Ok(n) = trimmed.parse::<u64>() {
        return Some(Value::Number(n.into()));
    }
    None
}

fn parse_float(s: &str) -> Option<Value> {
    let parsed = s.trim().parse::<f64>().ok()?;
    Number::from_f64(parsed).map(Value::Number)
}

fn coerce_enum(
    value: &Value,
    enum_name: &str,
    declared: &[String],
    path: &FieldPath,
) -> Result<Value, ConversionError> {
    if let Value::String(s) = value {
        if declared.iter().any(|v| v == s) {
            return Ok(value.clone());
        }
    }
    let rendered = match value {
        Value::Array(_) | Value::Object(_) => value_type_name(value).to_string(),
        scalar => scalar.to_string(),
    };
    Err(ConversionError::new(
        path.clone(),
        ConversionCause::InvalidEnumValue {
            enum_name: enum_name.to_string(),
            value: rendered,
        },
    ))
}
