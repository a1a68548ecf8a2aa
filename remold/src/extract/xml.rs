//! XML payload to value tree conversion.
//!
//! XML carries no scalar typing, so every leaf becomes a string; typed
//! numeric or boolean fields are reached through flexible-mode coercion.
//! Conventions: an element with element children becomes an ordered
//! mapping, repeated child tags collapse into a sequence, a text-only
//! element becomes its text, attributes become leading string entries.
//! Mixed content (text beside child elements) is dropped.

use roxmltree::Node;
use serde_json::{Map, Value};

use crate::error::Error;

/// Parses a validated XML payload and converts the root element's content
/// into the engine's value tree.
pub(crate) fn tree_from_payload(payload: &str) -> Result<Value, Error> {
    let doc = roxmltree::Document::parse(payload)?;
    Ok(element_value(doc.root_element()))
}

fn element_value(node: Node<'_, '_>) -> Value {
    let children: Vec<Node<'_, '_>> = node.children().filter(Node::is_element).collect();
    let has_attributes = node.attributes().next().is_some();

    if children.is_empty() && !has_attributes {
        let text = node.text().unwrap_or("").trim();
        return Value::String(text.to_string());
    }

    let mut map = Map::new();
    for attribute in node.attributes() {
        map.insert(
            attribute.name().to_string(),
            Value::String(attribute.value().to_string()),
        );
    }

    for child in children {
        let key = child.tag_name().name().to_string();
        let value = element_value(child);
        match map.get_mut(&key) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key, value);
            }
        }
    }

    Value::Object(map)
}
