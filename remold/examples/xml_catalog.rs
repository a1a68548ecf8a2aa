//! Converting an XML response into typed records.
//!
//! XML leaves carry no scalar typing, so the conversion runs in flexible
//! mode to fill numeric fields from text.

use remold::{extract_with, ConversionContext, ExtractionStrategy, Reflect};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize, Reflect)]
struct Catalog {
    name: String,
    book: Vec<Book>,
}

#[derive(Debug, Deserialize, Reflect)]
struct Book {
    title: String,
    year: i64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let response = "\
The catalog you asked about:

<catalog>
  <name>Science Fiction</name>
  <book><title>Dune</title><year>1965</year></book>
  <book><title>Solaris</title><year>1961</year></book>
  <book><title>Neuromancer</title><year>1984</year></book>
</catalog>

Let me know if you want more titles.";

    let catalog: Catalog = extract_with(
        response,
        ExtractionStrategy::Xml,
        &ConversionContext::flexible(),
    )
    .unwrap();

    println!("{} ({} books)", catalog.name, catalog.book.len());
    for book in &catalog.book {
        println!("  {} - {}", book.year, book.title);
    }
}
