//! Byte-buffer edits over serialized record text
//!
//! Records are immutable blobs; a mutation rebuilds the buffer and the caller
//! stages the rebuilt form through the store. These helpers keep rebuilds to a
//! single copy each.

use crate::scanner::{attribute_range, TagSpan};
use std::ops::Range;

/// Remove `range` from the buffer.
pub fn remove_span(buf: &[u8], range: Range<usize>) -> Vec<u8> {
    let mut out = Vec::with_capacity(buf.len().saturating_sub(range.len()));
    out.extend_from_slice(&buf[..range.start]);
    out.extend_from_slice(&buf[range.end..]);
    out
}

/// Replace `range` with `replacement`.
pub fn replace_span(buf: &[u8], range: Range<usize>, replacement: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(buf.len() - range.len() + replacement.len());
    out.extend_from_slice(&buf[..range.start]);
    out.extend_from_slice(replacement);
    out.extend_from_slice(&buf[range.end..]);
    out
}

/// Insert `bytes` at `offset`.
pub fn insert_at(buf: &[u8], offset: usize, bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(buf.len() + bytes.len());
    out.extend_from_slice(&buf[..offset]);
    out.extend_from_slice(bytes);
    out.extend_from_slice(&buf[offset..]);
    out
}

/// Set attribute `name` on the open tag of `span`, replacing an existing
/// value or inserting the attribute before the tag's closing `>`/`/>`.
pub fn set_attribute(buf: &[u8], span: &TagSpan, name: &str, value: &str) -> Vec<u8> {
    if let Some(range) = attribute_range(buf, span, name) {
        return replace_span(buf, range, value.as_bytes());
    }
    let insert_before = if span.is_self_closing() {
        // Just before the `/` of `/>`.
        span.open_end - 2
    } else {
        span.open_end - 1
    };
    let attr = format!(" {name}=\"{value}\"");
    insert_at(buf, insert_before, attr.as_bytes())
}

/// Remove attribute `name` (and its preceding whitespace) from the open tag
/// of `span`. The buffer is returned unchanged when the attribute is absent.
pub fn remove_attribute(buf: &[u8], span: &TagSpan, name: &str) -> Vec<u8> {
    match attribute_range(buf, span, name) {
        Some(value) => {
            // value excludes quotes; widen to cover ` name="value"`.
            let mut begin = value.start - name.len() - 2 /* ="  */;
            while begin > span.begin && buf[begin - 1].is_ascii_whitespace() {
                begin -= 1;
            }
            let end = value.end + 1; // trailing quote
            remove_span(buf, begin..end)
        }
        None => buf.to_vec(),
    }
}
