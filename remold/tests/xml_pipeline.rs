//! XML extraction and conversion over the full pipeline.
//!
//! XML leaves are strings by grammar, so typed fields are reached with a
//! flexible-mode context.

use pretty_assertions::assert_eq;
use remold::{clean_payload, extract_with, ConversionContext, Error, ExtractionStrategy, Reflect};
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq, Reflect)]
struct Book {
    title: String,
    year: i64,
    isbn: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq, Reflect)]
struct Library {
    name: String,
    book: Vec<Book>,
}

fn flexible() -> ConversionContext {
    ConversionContext::flexible()
}

#[test]
fn test_direct_xml() {
    let response = "<book><title>Dune</title><year>1965</year></book>";
    let book: Book = extract_with(response, ExtractionStrategy::Xml, &flexible()).unwrap();
    assert_eq!(
        book,
        Book {
            title: "Dune".into(),
            year: 1965,
            isbn: None,
        }
    );
}

#[test]
fn test_xml_in_prose() {
    let response = "Here is the record: <book><title>Dune</title><year>1965</year></book> done.";
    let book: Book = extract_with(response, ExtractionStrategy::Xml, &flexible()).unwrap();
    assert_eq!(book.title, "Dune");
}

#[test]
fn test_fenced_xml_block() {
    let response = "\
The catalog entry:

```xml
<book><title>Solaris</title><year>1961</year></book>
```
";
    let book: Book = extract_with(response, ExtractionStrategy::Xml, &flexible()).unwrap();
    assert_eq!(book.title, "Solaris");
    assert_eq!(book.year, 1961);
}

#[test]
fn test_repeated_tags_fill_a_list() {
    let response = "\
<library>
  <name>Central</name>
  <book><title>Dune</title><year>1965</year></book>
  <book><title>Solaris</title><year>1961</year></book>
</library>";
    let library: Library = extract_with(response, ExtractionStrategy::Xml, &flexible()).unwrap();
    assert_eq!(library.name, "Central");
    assert_eq!(library.book.len(), 2);
    assert_eq!(library.book[1].title, "Solaris");
}

#[test]
fn test_prolog_is_skipped() {
    let response = "<?xml version=\"1.0\"?>\n<book><title>Dune</title><year>1965</year></book>";
    let book: Book = extract_with(response, ExtractionStrategy::Xml, &flexible()).unwrap();
    assert_eq!(book.year, 1965);
}

#[test]
fn test_strict_mode_rejects_string_leaves() {
    let response = "<book><title>Dune</title><year>1965</year></book>";
    let err = extract_with::<Book>(response, ExtractionStrategy::Xml, &ConversionContext::strict())
        .unwrap_err();
    assert!(matches!(err, Error::Conversion(_)));
}

#[test]
fn test_missing_element_is_missing_field() {
    let response = "<book><title>Dune</title></book>";
    let err = extract_with::<Book>(response, ExtractionStrategy::Xml, &flexible()).unwrap_err();
    assert!(err.to_string().contains("missing required field"));
    assert!(err.to_string().contains("$.year"));
}

#[test]
fn test_no_xml_is_an_extraction_error() {
    let err = extract_with::<Book>("plain prose only", ExtractionStrategy::Xml, &flexible())
        .unwrap_err();
    match err {
        Error::Extraction(extraction) => assert_eq!(extraction.attempts, 4),
        other => panic!("expected extraction error, got {other:?}"),
    }
}

#[test]
fn test_clean_payload_xml() {
    let cleaned = clean_payload(
        "before <note><to>Ada</to></note> after",
        ExtractionStrategy::Xml,
    )
    .unwrap();
    assert_eq!(cleaned, "<note><to>Ada</to></note>");
}
