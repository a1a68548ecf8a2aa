//! Shape representation for declared target types.
//!
//! This module provides the [`TypeShape`] tagged union and the [`Reflect`]
//! trait that compiles a declared Rust type into an explicit shape tree.
//! All downstream logic (coercion, structural conversion, prompt
//! generation) works on shapes, never on the native type system directly.
//!
//! Shapes are built once per distinct target type and memoized by
//! [`reflect`]; they are read-only after construction and safe to share
//! across threads.

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::error::SchemaError;

/// The scalar kinds a [`TypeShape::Primitive`] can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    /// UTF-8 text.
    String,
    /// Integral number; fractional values never coerce into it.
    Int,
    /// Floating-point number; accepts any numeric value.
    Float,
    /// Boolean.
    Bool,
}

impl PrimitiveKind {
    /// Human-readable kind name, used in error messages.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
        }
    }
}

/// The expected shape of a target type.
///
/// A closed tagged union: the coercion engine dispatches on it with an
/// explicit `match`, so every variant is known at compile time of the
/// engine itself.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeShape {
    /// A scalar of the given kind.
    Primitive(PrimitiveKind),

    /// A value that may be null/absent; `Option<T>` annotations map here.
    Optional(Box<TypeShape>),

    /// An ordered sequence with a uniform element shape.
    List(Box<TypeShape>),

    /// Alternatives tried in declaration order; the first match wins.
    Union(Vec<TypeShape>),

    /// A closed set of scalar values, matched by serialized value.
    Enum {
        /// Name of the enum type.
        name: String,
        /// Declared values in declaration order.
        values: Vec<String>,
    },

    /// A record with named, typed fields.
    Composite(CompositeShape),
}

impl TypeShape {
    /// Returns a human-readable name for the shape, used in diagnostics.
    pub fn type_name(&self) -> String {
        match self {
            Self::Primitive(kind) => kind.name().to_string(),
            Self::Optional(inner) => format!("optional<{}>", inner.type_name()),
            Self::List(element) => format!("list<{}>", element.type_name()),
            Self::Union(alternatives) => {
                let names = alternatives
                    .iter()
                    .map(TypeShape::type_name)
                    .collect::<Vec<_>>()
                    .join(" | ");
                format!("union<{names}>")
            }
            Self::Enum { name, .. } => name.clone(),
            Self::Composite(composite) => composite.name.clone(),
        }
    }

    /// Returns the composite view of this shape, if it is one.
    #[inline]
    pub fn as_composite(&self) -> Option<&CompositeShape> {
        match self {
            Self::Composite(composite) => Some(composite),
            _ => None,
        }
    }

    /// True if the shape tolerates a null/absent value.
    #[inline]
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }
}

/// A record shape: name plus fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeShape {
    /// Name of the record type.
    pub name: String,
    /// Fields in declaration order. Names are unique.
    pub fields: Vec<FieldDescriptor>,
}

impl CompositeShape {
    /// Looks up a field descriptor by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// True if some descriptor covers the given mapping key.
    #[inline]
    pub fn covers(&self, key: &str) -> bool {
        self.field(key).is_some()
    }
}

/// One named field of a composite shape.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field name; matching against mapping keys is by this name.
    pub name: String,
    /// Declared shape of the field.
    pub shape: TypeShape,
    /// Declared default, bound when the field is absent.
    pub default: Option<Value>,
}

impl FieldDescriptor {
    /// Creates a required field with no default.
    pub fn new(name: impl Into<String>, shape: TypeShape) -> Self {
        Self {
            name: name.into(),
            shape,
            default: None,
        }
    }

    /// Declares a default value for this field.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// True if the field declares a default.
    #[inline]
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// Trait for types that can be compiled into a [`TypeShape`].
///
/// Typically derived with `#[derive(Reflect)]`; manual implementations are
/// the escape hatch for shapes the derive does not cover. Reflection fails
/// with [`SchemaError`] when a type cannot be mapped to a supported shape —
/// a programming-time misuse, raised before any record is converted.
pub trait Reflect {
    /// Compiles this type into its shape tree.
    fn reflect() -> Result<TypeShape, SchemaError>;
}

/// Serializes a field type's `Default` value for use as a declared default.
///
/// Used by the derive macro for `#[remold(default)]` fields; a value that
/// cannot be serialized is a reflection-time error.
pub fn default_value<T: Default + serde::Serialize>(field: &str) -> Result<Value, SchemaError> {
    serde_json::to_value(T::default()).map_err(|source| SchemaError::DefaultValue {
        field: field.to_string(),
        source,
    })
}

thread_local! {
    // Composite names currently being reflected on this thread. A name
    // reappearing on the stack means the declared type graph is cyclic.
    static IN_PROGRESS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

struct StackGuard;

impl Drop for StackGuard {
    fn drop(&mut self) {
        IN_PROGRESS.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Builds a composite shape, enforcing the reflection-time invariants.
///
/// Rejects cyclic type graphs (a composite containing itself, directly or
/// transitively) and duplicate field names, both as [`SchemaError`].
/// Derive-generated `Reflect` impls route through here.
pub fn reflect_composite(
    name: &str,
    build: impl FnOnce() -> Result<Vec<FieldDescriptor>, SchemaError>,
) -> Result<TypeShape, SchemaError> {
    let cyclic = IN_PROGRESS.with(|stack| stack.borrow().iter().any(|n| n == name));
    if cyclic {
        return Err(SchemaError::cyclic(name));
    }

    IN_PROGRESS.with(|stack| stack.borrow_mut().push(name.to_string()));
    let _guard = StackGuard;
    let fields = build()?;

    for (idx, field) in fields.iter().enumerate() {
        if fields[..idx].iter().any(|f| f.name == field.name) {
            return Err(SchemaError::DuplicateField {
                type_name: name.to_string(),
                field: field.name.clone(),
            });
        }
    }

    Ok(TypeShape::Composite(CompositeShape {
        name: name.to_string(),
        fields,
    }))
}

static SHAPE_CACHE: Lazy<RwLock<HashMap<TypeId, Arc<TypeShape>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Reflects a target type into its shape, memoized by type identity.
///
/// The cache is process-wide and read-mostly: the first reflection of a
/// type populates its slot, later calls share the same `Arc`. Two racing
/// reflections of one type both compute, but only one result is kept.
///
/// # Examples
///
/// ```
/// use remold::shape::{reflect, PrimitiveKind, TypeShape};
///
/// let shape = reflect::<Vec<i64>>().unwrap();
/// assert_eq!(
///     *shape,
///     TypeShape::List(Box::new(TypeShape::Primitive(PrimitiveKind::Int)))
/// );
/// ```
pub fn reflect<T: Reflect + 'static>() -> Result<Arc<TypeShape>, SchemaError> {
    let id = TypeId::of::<T>();

    {
        let cache = SHAPE_CACHE.read().unwrap_or_else(|e| e.into_inner());
        if let Some(shape) = cache.get(&id) {
            return Ok(Arc::clone(shape));
        }
    }

    let shape = Arc::new(T::reflect()?);
    let mut cache = SHAPE_CACHE.write().unwrap_or_else(|e| e.into_inner());
    Ok(Arc::clone(cache.entry(id).or_insert(shape)))
}

// ============================================================================
// Manual Reflect implementations for primitive and container types
// ============================================================================

macro_rules! reflect_primitive {
    ($kind:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl Reflect for $ty {
                fn reflect() -> Result<TypeShape, SchemaError> {
                    Ok(TypeShape::Primitive($kind))
                }
            }
        )+
    };
}

reflect_primitive!(PrimitiveKind::String => String);
reflect_primitive!(PrimitiveKind::Int =>
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
reflect_primitive!(PrimitiveKind::Float => f32, f64);
reflect_primitive!(PrimitiveKind::Bool => bool);

impl Reflect for &str {
    fn reflect() -> Result<TypeShape, SchemaError> {
        Ok(TypeShape::Primitive(PrimitiveKind::String))
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn reflect() -> Result<TypeShape, SchemaError> {
        Ok(TypeShape::Optional(Box::new(T::reflect()?)))
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn reflect() -> Result<TypeShape, SchemaError> {
        Ok(TypeShape::List(Box::new(T::reflect()?)))
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn reflect() -> Result<TypeShape, SchemaError> {
        T::reflect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_primitive_shapes() {
        assert_eq!(
            String::reflect().unwrap(),
            TypeShape::Primitive(PrimitiveKind::String)
        );
        assert_eq!(
            i32::reflect().unwrap(),
            TypeShape::Primitive(PrimitiveKind::Int)
        );
        assert_eq!(
            u64::reflect().unwrap(),
            TypeShape::Primitive(PrimitiveKind::Int)
        );
        assert_eq!(
            f64::reflect().unwrap(),
            TypeShape::Primitive(PrimitiveKind::Float)
        );
        assert_eq!(
            bool::reflect().unwrap(),
            TypeShape::Primitive(PrimitiveKind::Bool)
        );
    }

    #[test]
    fn test_optional_shape() {
        assert_eq!(
            Option::<String>::reflect().unwrap(),
            TypeShape::Optional(Box::new(TypeShape::Primitive(PrimitiveKind::String)))
        );
    }

    #[test]
    fn test_list_shape() {
        assert_eq!(
            Vec::<i64>::reflect().unwrap(),
            TypeShape::List(Box::new(TypeShape::Primitive(PrimitiveKind::Int)))
        );
    }

    #[test]
    fn test_nested_shapes() {
        assert_eq!(
            Vec::<Option<String>>::reflect().unwrap(),
            TypeShape::List(Box::new(TypeShape::Optional(Box::new(
                TypeShape::Primitive(PrimitiveKind::String)
            ))))
        );
    }

    #[test]
    fn test_box_delegates() {
        assert_eq!(
            Box::<i64>::reflect().unwrap(),
            TypeShape::Primitive(PrimitiveKind::Int)
        );
    }

    #[test]
    fn test_type_names() {
        assert_eq!(
            TypeShape::List(Box::new(TypeShape::Primitive(PrimitiveKind::String))).type_name(),
            "list<string>"
        );
        assert_eq!(
            TypeShape::Union(vec![
                TypeShape::Primitive(PrimitiveKind::Int),
                TypeShape::Primitive(PrimitiveKind::String),
            ])
            .type_name(),
            "union<int | string>"
        );
    }

    #[test]
    fn test_reflect_composite() {
        let shape = reflect_composite("User", || {
            Ok(vec![
                FieldDescriptor::new("name", TypeShape::Primitive(PrimitiveKind::String)),
                FieldDescriptor::new("age", TypeShape::Primitive(PrimitiveKind::Int)),
            ])
        })
        .unwrap();

        let composite = shape.as_composite().unwrap();
        assert_eq!(composite.name, "User");
        assert_eq!(composite.fields.len(), 2);
        assert!(composite.covers("name"));
        assert!(!composite.covers("email"));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let result = reflect_composite("Bad", || {
            Ok(vec![
                FieldDescriptor::new("x", TypeShape::Primitive(PrimitiveKind::Int)),
                FieldDescriptor::new("x", TypeShape::Primitive(PrimitiveKind::Int)),
            ])
        });
        assert!(matches!(result, Err(SchemaError::DuplicateField { .. })));
    }

    #[test]
    fn test_cyclic_composite_rejected() {
        fn reflect_node() -> Result<TypeShape, SchemaError> {
            reflect_composite("Node", || {
                Ok(vec![FieldDescriptor::new("next", reflect_node()?)])
            })
        }

        let result = reflect_node();
        assert!(matches!(result, Err(SchemaError::CyclicType { .. })));
    }

    #[test]
    fn test_cycle_stack_unwinds_after_failure() {
        fn reflect_node() -> Result<TypeShape, SchemaError> {
            reflect_composite("Looping", || {
                Ok(vec![FieldDescriptor::new("next", reflect_node()?)])
            })
        }

        assert!(reflect_node().is_err());
        // The in-progress stack must be clean again for unrelated types.
        let ok = reflect_composite("Looping", || {
            Ok(vec![FieldDescriptor::new(
                "leaf",
                TypeShape::Primitive(PrimitiveKind::Bool),
            )])
        });
        assert!(ok.is_ok());
    }

    #[test]
    fn test_field_default() {
        let field = FieldDescriptor::new("count", TypeShape::Primitive(PrimitiveKind::Int))
            .with_default(json!(0));
        assert!(field.has_default());
        assert_eq!(field.default, Some(json!(0)));
    }

    #[test]
    fn test_default_value_helper() {
        assert_eq!(default_value::<u32>("count").unwrap(), json!(0));
        assert_eq!(default_value::<String>("label").unwrap(), json!(""));
    }

    #[test]
    fn test_reflect_cache_shares_arc() {
        let first = reflect::<Vec<bool>>().unwrap();
        let second = reflect::<Vec<bool>>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
