//! Cascading payload extraction from messy surrounding text.
//!
//! Given raw text (typically an LLM response) and a target grammar, the
//! extractor runs a fixed, ordered sequence of tactics until one produces
//! text that parses under that grammar. Extraction and conversion are
//! separate fallibility boundaries: once a tactic's output parses, the
//! extractor commits to it, even if the schema conversion downstream later
//! rejects the content.

mod tactics;
pub(crate) mod xml;

use std::fmt;

use serde_json::Value;

use crate::error::{Error, ExtractionError};
use tactics::{ArraySpanTactic, BalancedSpanTactic, CharFilterTactic, DirectTactic, FencedBlockTactic, TagSpanTactic};

/// The structured-text grammar targeted by one extraction call.
///
/// Selects both the tactic sequence and the tree parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionStrategy {
    /// A JSON object or array payload.
    Json,
    /// An XML element payload.
    Xml,
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "JSON"),
            Self::Xml => write!(f, "XML"),
        }
    }
}

/// One fallback method in the extractor's ordered attempt sequence.
///
/// Tactics locate candidate text; the extractor parses each candidate
/// under the target grammar and commits to the first one that is
/// syntactically valid. A tactic that can see several candidates (fenced
/// blocks) uses the same grammar check to pick among them.
pub(crate) trait Tactic {
    /// Name of this tactic for diagnostics.
    fn name(&self) -> &'static str;

    /// Produces a candidate payload, or `None` when not applicable.
    fn apply(&self, input: &str) -> Option<String>;
}

/// Returns the fixed tactic sequence for a strategy.
fn tactics_for(strategy: ExtractionStrategy) -> Vec<Box<dyn Tactic>> {
    match strategy {
        ExtractionStrategy::Json => vec![
            Box::new(DirectTactic),
            Box::new(FencedBlockTactic::json()),
            Box::new(BalancedSpanTactic),
            Box::new(CharFilterTactic::json()),
            Box::new(ArraySpanTactic),
        ],
        ExtractionStrategy::Xml => vec![
            Box::new(DirectTactic),
            Box::new(FencedBlockTactic::xml()),
            Box::new(TagSpanTactic),
            Box::new(CharFilterTactic::xml()),
        ],
    }
}

/// True when the payload is syntactically valid under the strategy's grammar.
pub(crate) fn grammar_parses(payload: &str, strategy: ExtractionStrategy) -> bool {
    match strategy {
        ExtractionStrategy::Json => serde_json::from_str::<Value>(payload).is_ok(),
        ExtractionStrategy::Xml => roxmltree::Document::parse(payload).is_ok(),
    }
}

/// Extracts a syntactically valid payload string from arbitrary text.
///
/// Tactics run in fixed order; the first one whose candidate parses under
/// the target grammar wins. Returns the cleaned payload string.
///
/// # Examples
///
/// ```
/// use remold::extract::{extract_payload, ExtractionStrategy};
///
/// let text = "Sure! Here you go: {\"name\": \"Alice\"} hope that helps.";
/// let payload = extract_payload(text, ExtractionStrategy::Json).unwrap();
/// assert_eq!(payload, "{\"name\": \"Alice\"}");
/// ```
///
/// # Errors
///
/// Returns [`ExtractionError`] with the attempted tactic count when no
/// tactic produces parseable output.
pub fn extract_payload(text: &str, strategy: ExtractionStrategy) -> Result<String, ExtractionError> {
    let tactics = tactics_for(strategy);
    let attempts = tactics.len();

    for tactic in &tactics {
        if let Some(candidate) = tactic.apply(text) {
            if grammar_parses(&candidate, strategy) {
                tracing::debug!(tactic = tactic.name(), %strategy, "extraction tactic succeeded");
                return Ok(candidate);
            }
        }
    }

    Err(ExtractionError::new(strategy, attempts))
}

/// Extracts a JSON payload and parses it into a value tree.
pub fn json_tree(text: &str) -> Result<Value, Error> {
    let payload = extract_payload(text, ExtractionStrategy::Json)?;
    Ok(serde_json::from_str(&payload)?)
}

/// Extracts an XML payload and converts it into a value tree.
///
/// The root element's content becomes the root mapping; the
/// element-to-value conventions live in `extract::xml`.
pub fn xml_tree(text: &str) -> Result<Value, Error> {
    let payload = extract_payload(text, ExtractionStrategy::Xml)?;
    xml::tree_from_payload(&payload)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_direct_json() {
        let payload = extract_payload(r#"{"a": 1}"#, ExtractionStrategy::Json).unwrap();
        assert_eq!(payload.trim(), r#"{"a": 1}"#);
    }

    #[test]
    fn test_fenced_json() {
        let text = "Here is the result:\n```json\n{\"a\": 1}\n```\nDone.";
        let payload = extract_payload(text, ExtractionStrategy::Json).unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&payload).unwrap(),
            json!({"a": 1})
        );
    }

    #[test]
    fn test_embedded_object() {
        let text = r#"The answer is {"a": [1, 2]} as requested."#;
        let payload = extract_payload(text, ExtractionStrategy::Json).unwrap();
        assert_eq!(payload, r#"{"a": [1, 2]}"#);
    }

    #[test]
    fn test_embedded_array() {
        let text = "The list: [1, 2, 3] as you can see.";
        let payload = extract_payload(text, ExtractionStrategy::Json).unwrap();
        assert_eq!(payload, "[1, 2, 3]");
    }

    #[test]
    fn test_no_payload_counts_tactics() {
        let err = extract_payload("just prose, nothing else", ExtractionStrategy::Json).unwrap_err();
        assert_eq!(err.attempts, 5);
        assert_eq!(err.strategy, ExtractionStrategy::Json);

        let err = extract_payload("just prose, nothing else", ExtractionStrategy::Xml).unwrap_err();
        assert_eq!(err.attempts, 4);
    }

    #[test]
    fn test_xml_direct() {
        let payload = extract_payload("<user><name>Alice</name></user>", ExtractionStrategy::Xml)
            .unwrap();
        assert!(payload.starts_with("<user>"));
    }

    #[test]
    fn test_xml_in_prose() {
        let text = "Model says: <user><name>Alice</name></user> end of answer.";
        let payload = extract_payload(text, ExtractionStrategy::Xml).unwrap();
        assert_eq!(payload, "<user><name>Alice</name></user>");
    }

    #[test]
    fn test_json_tree_roundtrip() {
        let tree = json_tree("noise ```json\n{\"x\": true}\n``` noise").unwrap();
        assert_eq!(tree, json!({"x": true}));
    }

    #[test]
    fn test_xml_tree_root_content() {
        let tree = xml_tree("<user><name>Alice</name><age>30</age></user>").unwrap();
        assert_eq!(tree, json!({"name": "Alice", "age": "30"}));
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(ExtractionStrategy::Json.to_string(), "JSON");
        assert_eq!(ExtractionStrategy::Xml.to_string(), "XML");
    }
}
