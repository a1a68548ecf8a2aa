//! Extracting a typed record from a noisy LLM response.
//!
//! Run with `RUST_LOG=remold=debug` to see which extraction tactic wins.

use remold::{extract, extract_with, ConversionContext, ExtractionStrategy, Reflect};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize, Reflect)]
struct User {
    name: String,
    age: i64,
    email: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Extraction Example ===\n");

    // Clean payload, strict mode.
    let clean = r#"{"name": "Alice", "age": 30, "email": "alice@example.com"}"#;
    let user: User = extract(clean, ExtractionStrategy::Json).unwrap();
    println!("1. Clean payload: {user:?}\n");

    // Payload buried in prose: the balanced span scan digs it out.
    let prose = r#"Sure thing! The record you asked for is {"name": "Bob", "age": 25} - let me know if you need more."#;
    let user: User = extract(prose, ExtractionStrategy::Json).unwrap();
    println!("2. From prose: {user:?}\n");

    // Fenced code block with stringly-typed numbers: flexible mode coerces.
    let fenced = "Here you go:\n```json\n{\"name\": \"Carol\", \"age\": \"33\"}\n```\n";
    let user: User = extract_with(
        fenced,
        ExtractionStrategy::Json,
        &ConversionContext::flexible(),
    )
    .unwrap();
    println!("3. Fenced, coerced: {user:?}\n");

    // A response with no recoverable structure fails with a typed error.
    let err = extract::<User>("I'm sorry, I can't do that.", ExtractionStrategy::Json).unwrap_err();
    println!("4. No structure: {err}");
}
