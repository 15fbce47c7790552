//! Helpers shared by the tests of the parser and serializer modules.

#![allow(dead_code, missing_docs)]

use crate::element::Element;
use crate::parse::{parse_str, Parsed};
use crate::primitives::Format;
use crate::write::write_elements;

/// Parses a document, panicking on fatal errors.
pub fn parse_all(input: &str) -> Parsed {
    parse_str(input).expect("while parsing test input")
}

/// Parses a document that must yield exactly one element without salvage.
pub fn parse_one(input: &str) -> Element {
    let mut parsed = parse_all(input);
    assert!(!parsed.salvaged, "unexpected salvage for: {input}");
    assert_eq!(parsed.elements.len(), 1, "expected one element: {input}");
    parsed.elements.remove(0)
}

/// Serializes elements in the raw format.
pub fn raw(elements: &[Element]) -> String {
    write_elements(elements, Format::Raw).expect("while emitting test elements")
}

/// One emit-parse-emit cycle; both emissions must be byte-identical and the
/// reparse must reproduce the elements.
pub fn assert_round_trip(elements: &[Element]) {
    let first = raw(elements);
    let reparsed = parse_all(&first);
    assert!(!reparsed.salvaged, "salvage while reparsing: {first}");
    assert_eq!(&reparsed.elements, elements, "tree changed by: {first}");
    let second = raw(&reparsed.elements);
    assert_eq!(first, second, "second emission differs");
}
