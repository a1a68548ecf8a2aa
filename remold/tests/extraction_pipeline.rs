//! End-to-end extraction tests over the full pipeline.
//!
//! These exercise the cascading extractor through the facade: clean
//! payloads, fenced blocks, prose-embedded spans, decorated payloads and
//! top-level lists.

use pretty_assertions::assert_eq;
use remold::{clean_payload, extract, Error, ExtractionStrategy, Reflect};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize, PartialEq, Reflect)]
struct User {
    name: String,
    age: i64,
    email: Option<String>,
}

#[test]
fn test_clean_json() {
    let user: User = extract(r#"{"name": "Alice", "age": 30}"#, ExtractionStrategy::Json).unwrap();
    assert_eq!(
        user,
        User {
            name: "Alice".into(),
            age: 30,
            email: None,
        }
    );
}

#[test]
fn test_fenced_block_with_prose() {
    let response = "\
Let me put that together for you.

```json
{\"name\": \"Charlie\", \"age\": 35}
```

Anything else I can help with?";
    let user: User = extract(response, ExtractionStrategy::Json).unwrap();
    assert_eq!(user.name, "Charlie");
    assert_eq!(user.age, 35);
}

#[test]
fn test_untagged_fence() {
    let response = "Result:\n```\n{\"name\": \"Dana\", \"age\": 28}\n```\n";
    let user: User = extract(response, ExtractionStrategy::Json).unwrap();
    assert_eq!(user.name, "Dana");
}

#[test]
fn test_payload_embedded_in_prose() {
    let response = r#"Certainly! The user is {"name": "Eve", "age": 41} according to the data."#;
    let user: User = extract(response, ExtractionStrategy::Json).unwrap();
    assert_eq!(user.name, "Eve");
}

#[test]
fn test_payload_wrapped_in_decorative_characters() {
    let response = "\u{201C}{\"name\": \"Fay\", \"age\": 52}\u{201D}";
    let user: User = extract(response, ExtractionStrategy::Json).unwrap();
    assert_eq!(user.name, "Fay");
}

#[test]
fn test_top_level_list() {
    let response = "Found these: [{\"name\": \"A\", \"age\": 1}, {\"name\": \"B\", \"age\": 2}]";
    let users: Vec<User> = extract(response, ExtractionStrategy::Json).unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[1].name, "B");
}

#[test]
fn test_fence_wrap_preserves_payload_content() {
    // prefix + fence-wrap(P) + suffix must parse to the same tree as P.
    let payload = r#"{"name": "Gil", "age": 19, "email": null}"#;
    let wrapped = format!("Here you go:\n```json\n{payload}\n```\nHope this helps!");

    let cleaned = clean_payload(&wrapped, ExtractionStrategy::Json).unwrap();
    let original: Value = serde_json::from_str(payload).unwrap();
    let extracted: Value = serde_json::from_str(&cleaned).unwrap();
    assert_eq!(original, extracted);
}

#[test]
fn test_no_structure_is_an_extraction_error() {
    let err = extract::<User>("I could not produce the record, sorry.", ExtractionStrategy::Json)
        .unwrap_err();
    match err {
        Error::Extraction(extraction) => {
            assert_eq!(extraction.strategy, ExtractionStrategy::Json);
            assert_eq!(extraction.attempts, 5);
        }
        other => panic!("expected extraction error, got {other:?}"),
    }
}

#[test]
fn test_extraction_commits_before_conversion() {
    // The payload parses, so extraction succeeds; the schema mismatch must
    // surface as a conversion error, never as an extraction one.
    let err = extract::<User>(r#"{"wrong": true}"#, ExtractionStrategy::Json).unwrap_err();
    assert!(matches!(err, Error::Conversion(_)));
}

#[test]
fn test_clean_payload_standalone() {
    let cleaned = clean_payload("noise [1, 2, 3] more noise", ExtractionStrategy::Json).unwrap();
    assert_eq!(cleaned, "[1, 2, 3]");
}
