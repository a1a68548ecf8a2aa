//! Structural conversion of parsed trees onto declared shapes.
//!
//! The converter walks a composite shape's field descriptors in declaration
//! order, resolves each against the parsed mapping (coercing through
//! [`coerce`]), and enforces the extra-field policy. Conversion is
//! fail-fast: the first non-conforming value aborts the whole operation
//! with its path; no partial instance is ever produced.

mod coerce;

pub use coerce::coerce;
pub(crate) use coerce::value_type_name;

use serde_json::{Map, Value};

use crate::context::ConversionContext;
use crate::error::{ConversionCause, ConversionError, FieldPath};
use crate::shape::CompositeShape;

/// Builds a conforming mapping for a composite shape from a parsed value.
///
/// Re-entered by the coercion engine for nested composite fields; this is
/// the only recursion path in the engine, bounded by the declared nesting
/// depth.
pub(crate) fn convert_composite(
    value: &Value,
    composite: &CompositeShape,
    ctx: &ConversionContext,
    path: &FieldPath,
) -> Result<Value, ConversionError> {
    let mapping = value.as_object().ok_or_else(|| {
        ConversionError::new(
            path.clone(),
            ConversionCause::ExpectedObject {
                found: value_type_name(value),
            },
        )
    })?;

    let mut out = Map::new();
    for field in &composite.fields {
        let field_path = path.child(&field.name);
        match mapping.get(&field.name) {
            None => {
                if let Some(default) = &field.default {
                    out.insert(field.name.clone(), default.clone());
                } else if field.shape.is_optional() {
                    out.insert(field.name.clone(), Value::Null);
                } else {
                    return Err(ConversionError::missing_field(field_path, &field.name));
                }
            }
            Some(found) if found.is_null() && field.shape.is_optional() => {
                out.insert(
                    field.name.clone(),
                    field.default.clone().unwrap_or(Value::Null),
                );
            }
            Some(found) => {
                out.insert(
                    field.name.clone(),
                    coerce(found, &field.shape, ctx, &field_path)?,
                );
            }
        }
    }

    for key in mapping.keys() {
        if !composite.covers(key) {
            if !ctx.ignore_extra_fields {
                return Err(ConversionError::unexpected_field(path.clone(), key));
            }
            tracing::debug!(field = %key, composite = %composite.name, "dropping extra field");
        }
    }

    Ok(Value::Object(out))
}
