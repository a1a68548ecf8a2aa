//! # remold
//!
//! Remolds messy LLM responses into strongly-typed Rust records.
//!
//! The pipeline has two stages:
//! - a cascading extractor that locates a well-formed JSON or XML payload
//!   inside arbitrarily noisy surrounding text (prose, code fences,
//!   decorative characters), and
//! - a schema-driven converter that maps the parsed value tree onto a
//!   declared record type, coercing values under a configurable policy.
//!
//! ## Quick Start
//!
//! ```rust
//! use remold::{extract, ExtractionStrategy, Reflect};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize, Reflect)]
//! struct User {
//!     name: String,
//!     age: i64,
//!     email: Option<String>,
//! }
//!
//! let response = r#"Sure! Here is the record: {"name": "Alice", "age": 30}. Anything else?"#;
//!
//! let user: User = extract(response, ExtractionStrategy::Json).unwrap();
//! assert_eq!(user.name, "Alice");
//! assert_eq!(user.age, 30);
//! assert_eq!(user.email, None);
//! ```
//!
//! ## Strict and flexible conversion
//!
//! Strict mode (the default) requires exact runtime-type matches. Flexible
//! mode permits a narrow coercion set: `"30"` fills an integer field,
//! `"true"` fills a boolean one; `"12.5"` never fills an integer field in
//! either mode.
//!
//! ```rust
//! use remold::{extract_with, ConversionContext, ExtractionStrategy, Reflect};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize, Reflect)]
//! struct Answer {
//!     score: i64,
//! }
//!
//! let ctx = ConversionContext::flexible();
//! let answer: Answer =
//!     extract_with(r#"{"score": "42"}"#, ExtractionStrategy::Json, &ctx).unwrap();
//! assert_eq!(answer.score, 42);
//! ```

pub mod context;
pub mod convert;
pub mod error;
pub mod extract;
pub mod shape;

pub use context::ConversionContext;
pub use error::{
    ConversionCause, ConversionError, Error, ExtractionError, FieldPath, Result, SchemaError,
};
pub use extract::ExtractionStrategy;
pub use shape::{reflect, Reflect, TypeShape};

/// Derive macro generating a [`Reflect`] implementation.
#[cfg(feature = "derive")]
pub use remold_derive::Reflect;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Extracts a structured payload from text and converts it into `T` under
/// the default (strict) conversion policy.
///
/// # Errors
///
/// Returns [`Error::Extraction`] when no tactic finds a syntactically
/// valid payload, [`Error::Conversion`] when the payload does not conform
/// to `T`'s schema, and [`Error::Schema`] when `T` itself cannot be
/// reflected. The classes are never conflated.
pub fn extract<T>(text: &str, strategy: ExtractionStrategy) -> Result<T>
where
    T: Reflect + DeserializeOwned + 'static,
{
    extract_with(text, strategy, &ConversionContext::default())
}

/// Extracts a structured payload from text and converts it into `T` under
/// the given conversion policy.
///
/// # Examples
///
/// ```
/// use remold::{extract_with, ConversionContext, ExtractionStrategy, Reflect};
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, Reflect)]
/// struct Item {
///     id: i64,
/// }
///
/// let items: Vec<Item> = extract_with(
///     "ids follow: [{\"id\": 1}, {\"id\": 2}]",
///     ExtractionStrategy::Json,
///     &ConversionContext::strict(),
/// )
/// .unwrap();
/// assert_eq!(items.len(), 2);
/// ```
pub fn extract_with<T>(
    text: &str,
    strategy: ExtractionStrategy,
    ctx: &ConversionContext,
) -> Result<T>
where
    T: Reflect + DeserializeOwned + 'static,
{
    let tree = match strategy {
        ExtractionStrategy::Json => extract::json_tree(text)?,
        ExtractionStrategy::Xml => extract::xml_tree(text)?,
    };
    convert_value(&tree, ctx)
}

/// Converts an already-parsed value tree into `T` under the given policy.
///
/// This is the conversion entry point for callers that hold a tree from
/// elsewhere; [`extract_with`] is this plus the extraction stage.
pub fn convert_value<T>(value: &Value, ctx: &ConversionContext) -> Result<T>
where
    T: Reflect + DeserializeOwned + 'static,
{
    let shape = shape::reflect::<T>()?;
    let conformed = convert::coerce(value, &shape, ctx, &FieldPath::root())?;
    Ok(serde_json::from_value(conformed)?)
}

/// Extracts a syntactically valid payload string without converting it.
///
/// Useful as a standalone "clean only" utility when the caller wants the
/// raw payload text rather than a typed record.
pub fn clean_payload(
    text: &str,
    strategy: ExtractionStrategy,
) -> std::result::Result<String, ExtractionError> {
    extract::extract_payload(text, strategy)
}
