//! Error types for payload extraction and schema conversion.

use std::fmt;

use crate::extract::ExtractionStrategy;

/// Result type alias for remold operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error returned by the facade.
///
/// Extraction and conversion failures are deliberately kept apart: the
/// caller can always distinguish "no structured payload found" from
/// "payload found, but it does not match the schema".
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No extraction tactic produced a syntactically valid payload.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// A value did not conform to its declared shape.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// A target type could not be reflected into a shape.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// JSON parsing error from serde_json.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML parsing error from roxmltree.
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),
}

/// No tactic in the cascading extractor produced parseable output.
#[derive(Debug, Clone, thiserror::Error)]
#[error("no valid {strategy} payload found after {attempts} extraction tactics")]
pub struct ExtractionError {
    /// The grammar that was targeted.
    pub strategy: ExtractionStrategy,
    /// Number of tactics attempted before giving up.
    pub attempts: usize,
}

impl ExtractionError {
    /// Creates a new extraction error.
    #[inline]
    pub fn new(strategy: ExtractionStrategy, attempts: usize) -> Self {
        Self { strategy, attempts }
    }
}

/// A value did not conform to its declared shape.
///
/// Carries the path from the conversion root to the offending value, so a
/// failure deep inside a nested composite is attributable to one field.
#[derive(Debug, Clone, thiserror::Error)]
#[error("at `{path}`: {cause}")]
pub struct ConversionError {
    /// Path from the conversion root to the value that failed.
    pub path: FieldPath,
    /// Why the value was rejected.
    pub cause: ConversionCause,
}

impl ConversionError {
    /// Creates a new conversion error at the given path.
    #[inline]
    pub fn new(path: FieldPath, cause: ConversionCause) -> Self {
        Self { path, cause }
    }

    /// Creates a type mismatch error.
    #[inline]
    pub fn type_mismatch(path: FieldPath, expected: &'static str, found: &'static str) -> Self {
        Self::new(path, ConversionCause::TypeMismatch { expected, found })
    }

    /// Creates a missing required field error. The path already ends in the
    /// field's name.
    #[inline]
    pub fn missing_field(path: FieldPath, field: impl Into<String>) -> Self {
        Self::new(
            path,
            ConversionCause::MissingField {
                field: field.into(),
            },
        )
    }

    /// Creates an unexpected field error.
    #[inline]
    pub fn unexpected_field(path: FieldPath, field: impl Into<String>) -> Self {
        Self::new(
            path,
            ConversionCause::UnexpectedField {
                field: field.into(),
            },
        )
    }
}

/// The cause carried by a [`ConversionError`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionCause {
    /// Runtime type of the value does not match the declared shape.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Declared shape name.
        expected: &'static str,
        /// Runtime type name of the value.
        found: &'static str,
    },

    /// A required field was absent and declared no default.
    #[error("missing required field: {field}")]
    MissingField {
        /// Name of the missing field.
        field: String,
    },

    /// The mapping contained a key no field descriptor covers.
    #[error("unexpected field: {field}")]
    UnexpectedField {
        /// The first offending key in mapping order.
        field: String,
    },

    /// A composite shape requires a mapping.
    #[error("expected object, found {found}")]
    ExpectedObject {
        /// Runtime type name of the value.
        found: &'static str,
    },

    /// A list shape requires a sequence.
    #[error("expected sequence, found {found}")]
    ExpectedSequence {
        /// Runtime type name of the value.
        found: &'static str,
    },

    /// A scalar did not match any declared enum value.
    #[error("not a valid enum value for {enum_name}: {value}")]
    InvalidEnumValue {
        /// Name of the enum shape.
        enum_name: String,
        /// Rendering of the rejected value.
        value: String,
    },

    /// Every union alternative rejected the value.
    #[error("no union alternative matched: {}", .reasons.join("; "))]
    NoUnionMatch {
        /// One failure reason per alternative, in declaration order.
        reasons: Vec<String>,
    },
}

/// A declared type could not be reflected into a supported shape.
///
/// This is a configuration-time misuse, raised when a schema is first
/// reflected, never while converting a record.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The type's structure maps to no supported shape variant.
    #[error("type `{type_name}` cannot be mapped to a supported shape: {reason}")]
    Unsupported {
        /// Name of the offending type.
        type_name: String,
        /// What made it unsupported.
        reason: String,
    },

    /// A composite contains itself, directly or transitively.
    #[error("cyclic schema: composite `{type_name}` contains itself")]
    CyclicType {
        /// Name of the composite on the cycle.
        type_name: String,
    },

    /// Two fields of one composite share a name.
    #[error("duplicate field `{field}` in composite `{type_name}`")]
    DuplicateField {
        /// Name of the composite.
        type_name: String,
        /// The repeated field name.
        field: String,
    },

    /// A declared default could not be serialized into the value model.
    #[error("default value for field `{field}` is not serializable")]
    DefaultValue {
        /// The field carrying the default.
        field: String,
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },
}

impl SchemaError {
    /// Creates an unsupported-type error.
    #[inline]
    pub fn unsupported(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unsupported {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a cyclic-schema error.
    #[inline]
    pub fn cyclic(type_name: impl Into<String>) -> Self {
        Self::CyclicType {
            type_name: type_name.into(),
        }
    }
}

/// Path from a conversion root to a value, as field names and indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Descent into a named field.
    Name(String),
    /// Descent into a sequence element.
    Index(usize),
}

impl FieldPath {
    /// The empty path, rendered as `$`.
    #[inline]
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns a new path extended by a field name.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Name(name.into()));
        Self { segments }
    }

    /// Returns a new path extended by a sequence index.
    pub fn index(&self, idx: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(idx));
        Self { segments }
    }

    /// The path's segments from root to leaf.
    #[inline]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// The final named segment, if the path ends in a field name.
    pub fn leaf_name(&self) -> Option<&str> {
        match self.segments.last() {
            Some(PathSegment::Name(name)) => Some(name),
            _ => None,
        }
    }

    /// True for the conversion root.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for segment in &self.segments {
            match segment {
                PathSegment::Name(name) => write!(f, ".{name}")?,
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}
