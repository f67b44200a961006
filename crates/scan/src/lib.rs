//! Byte-level partial parsing for tagged record text
//!
//! This crate locates sub-regions of a serialized record without building a
//! parse tree:
//! - TagSpan: offsets of one tagged region (begin, end of open tag, end)
//! - find_element / next_element: locate a named element, resume past a match
//! - attribute: extract one attribute value from an open tag by linear scan
//! - children: iterate the direct child elements of a region
//! - splice: byte-buffer edits (remove/replace spans, set/remove attributes)
//!
//! Historical data is known to be imperfect, so a malformed, truncated, or
//! absent region always resolves to `None` — never an error or a panic.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod splice;

mod scanner;

pub use scanner::{
    attribute, attribute_range, children, content_end, element_at, element_is_empty, find_element,
    inner, next_element, ChildIter, Element, TagSpan,
};
