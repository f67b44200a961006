//! Linear element and attribute scanning over raw record bytes
//!
//! Every operation here is a single forward pass over a byte window. Nothing
//! allocates per element, and nothing fails: a region that cannot be located
//! (absent, truncated, unbalanced) is reported as `None`, which callers must
//! treat as "structurally optional".

use std::ops::Range;

/// Offsets of one tagged region inside a byte buffer.
///
/// `begin` points at the `<` of the open tag, `open_end` just past the `>`
/// that closes the open tag, and `end` just past the final `>` of the region
/// (the close tag, or the open tag itself when self-closing).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagSpan {
    /// Offset of the `<` of the open tag.
    pub begin: usize,
    /// Offset just past the `>` of the open tag.
    pub open_end: usize,
    /// Offset just past the last byte of the region.
    pub end: usize,
}

impl TagSpan {
    /// Whole region as a byte range.
    pub fn range(&self) -> Range<usize> {
        self.begin..self.end
    }

    /// True when the element was written `<tag .../>` with no content.
    pub fn is_self_closing(&self) -> bool {
        self.open_end == self.end
    }
}

/// One element located by a generic (any-name) scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Byte range of the tag name inside the open tag.
    pub name: Range<usize>,
    /// Offsets of the whole element.
    pub span: TagSpan,
}

impl Element {
    /// The tag name as a string slice, if it is valid UTF-8.
    pub fn name_str<'a>(&self, buf: &'a [u8]) -> Option<&'a str> {
        std::str::from_utf8(buf.get(self.name.clone())?).ok()
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.' || b == b':'
}

/// Scan past the open tag starting at `begin` (which must point at `<`).
///
/// Returns `(open_end, self_closing)`, honoring quoted attribute values so a
/// `>` inside a value does not terminate the tag. `None` if the tag never
/// closes before the end of the buffer.
fn open_tag_end(buf: &[u8], begin: usize) -> Option<(usize, bool)> {
    let mut i = begin + 1;
    let mut quote: Option<u8> = None;
    while i < buf.len() {
        let b = buf[i];
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => {
                    let self_closing = i > begin + 1 && buf[i - 1] == b'/';
                    return Some((i + 1, self_closing));
                }
                _ => {}
            },
        }
        i += 1;
    }
    None
}

/// Locate the element whose open tag starts exactly at `offset`.
///
/// `offset` must point at a `<` that is not a close tag. Handles self-closing
/// elements and same-name nesting by depth counting. Returns `None` for
/// anything truncated or unbalanced.
pub fn element_at(buf: &[u8], offset: usize) -> Option<Element> {
    if offset >= buf.len() || buf[offset] != b'<' {
        return None;
    }
    let name_begin = offset + 1;
    if name_begin >= buf.len() || buf[name_begin] == b'/' || buf[name_begin] == b'!' {
        return None;
    }
    let mut name_end = name_begin;
    while name_end < buf.len() && is_name_byte(buf[name_end]) {
        name_end += 1;
    }
    if name_end == name_begin {
        return None;
    }
    let (open_end, self_closing) = open_tag_end(buf, offset)?;
    if self_closing {
        return Some(Element {
            name: name_begin..name_end,
            span: TagSpan {
                begin: offset,
                open_end,
                end: open_end,
            },
        });
    }
    let name = &buf[name_begin..name_end];
    let end = close_of(buf, name, open_end)?;
    Some(Element {
        name: name_begin..name_end,
        span: TagSpan {
            begin: offset,
            open_end,
            end,
        },
    })
}

/// Find the end offset (just past `>`) of the close tag matching an element
/// named `name` whose content starts at `from`. Depth-counts same-name
/// nesting; self-closing nested occurrences do not change depth.
fn close_of(buf: &[u8], name: &[u8], from: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut i = from;
    while i < buf.len() {
        if buf[i] != b'<' {
            i += 1;
            continue;
        }
        if starts_close_tag(buf, i, name) {
            let gt = find_byte(buf, i, b'>')?;
            depth -= 1;
            if depth == 0 {
                return Some(gt + 1);
            }
            i = gt + 1;
        } else if starts_open_tag(buf, i, name) {
            let (open_end, self_closing) = open_tag_end(buf, i)?;
            if !self_closing {
                depth += 1;
            }
            i = open_end;
        } else {
            i += 1;
        }
    }
    None
}

fn find_byte(buf: &[u8], from: usize, byte: u8) -> Option<usize> {
    buf[from..].iter().position(|&b| b == byte).map(|p| from + p)
}

/// True when `buf[at..]` starts an open tag named exactly `name`.
fn starts_open_tag(buf: &[u8], at: usize, name: &[u8]) -> bool {
    if buf.get(at) != Some(&b'<') {
        return false;
    }
    let rest = &buf[at + 1..];
    if rest.len() < name.len() || &rest[..name.len()] != name {
        return false;
    }
    match rest.get(name.len()) {
        Some(&b) => !is_name_byte(b),
        None => false,
    }
}

/// True when `buf[at..]` starts a close tag named exactly `name`.
fn starts_close_tag(buf: &[u8], at: usize, name: &[u8]) -> bool {
    if buf.get(at) != Some(&b'<') || buf.get(at + 1) != Some(&b'/') {
        return false;
    }
    let rest = &buf[at + 2..];
    if rest.len() < name.len() || &rest[..name.len()] != name {
        return false;
    }
    matches!(rest.get(name.len()), Some(&b'>') | Some(&b' ') | Some(&b'\t'))
}

/// Locate the first element named `tag` whose open tag begins inside
/// `window`. The region itself may extend past the window end; only the
/// starting `<` is constrained. Returns `None` when absent or malformed.
pub fn find_element(buf: &[u8], tag: &str, window: Range<usize>) -> Option<TagSpan> {
    let name = tag.as_bytes();
    let lim = window.end.min(buf.len());
    let mut i = window.start;
    while i < lim {
        if buf[i] == b'<' && starts_open_tag(buf, i, name) {
            if let Some(elem) = element_at(buf, i) {
                return Some(elem.span);
            }
            // Truncated open tag at this position: nothing later can match
            // either, since the buffer ends inside it.
            return None;
        }
        i += 1;
    }
    None
}

/// Resume scanning for the next sibling element named `tag` at or after
/// `after` (typically the `end` of the previous match).
pub fn next_element(buf: &[u8], tag: &str, after: usize) -> Option<TagSpan> {
    find_element(buf, tag, after..buf.len())
}

/// Byte range of the value of `name="..."` inside the open tag of `span`.
///
/// The range excludes the quotes. Honors single or double quoting and only
/// searches the open tag. `None` when the attribute is absent or its quote
/// never closes.
pub fn attribute_range(buf: &[u8], span: &TagSpan, name: &str) -> Option<Range<usize>> {
    let tag = buf.get(span.begin..span.open_end)?;
    let pat = name.as_bytes();
    let mut i = 0;
    while i + pat.len() + 1 < tag.len() {
        // Attribute names are preceded by whitespace and followed by `=`.
        if tag[i].is_ascii_whitespace()
            && tag[i + 1..].starts_with(pat)
            && tag.get(i + 1 + pat.len()) == Some(&b'=')
        {
            let q_at = i + 2 + pat.len();
            let quote = match tag.get(q_at) {
                Some(&q @ (b'"' | b'\'')) => q,
                _ => {
                    i += 1;
                    continue;
                }
            };
            let val_begin = q_at + 1;
            let val_len = tag[val_begin..].iter().position(|&b| b == quote)?;
            let abs = span.begin + val_begin;
            return Some(abs..abs + val_len);
        }
        i += 1;
    }
    None
}

/// Value of `name="..."` inside the open tag of `span`, as a string slice.
pub fn attribute<'a>(buf: &'a [u8], span: &TagSpan, name: &str) -> Option<&'a str> {
    let range = attribute_range(buf, span, name)?;
    std::str::from_utf8(&buf[range]).ok()
}

/// Offset of the `<` of the element's close tag — the end of its content.
///
/// Equals `open_end` for self-closing elements.
pub fn content_end(buf: &[u8], span: &TagSpan) -> usize {
    if span.is_self_closing() {
        return span.open_end;
    }
    // Walk back from `end` to the `<` of the close tag; the close tag
    // itself contains no `<`.
    let mut at = span.end;
    while at > span.open_end && buf[at - 1] != b'<' {
        at -= 1;
    }
    at.saturating_sub(1).max(span.open_end)
}

/// Content of the element, between its open and close tags.
///
/// Empty for self-closing elements.
pub fn inner<'a>(buf: &'a [u8], span: &TagSpan) -> &'a [u8] {
    &buf[span.open_end..content_end(buf, span)]
}

/// True when the element has no attributes and no non-whitespace content.
pub fn element_is_empty(buf: &[u8], elem: &Element) -> bool {
    // Anything between the tag name and the closing `>`/`/>` other than
    // whitespace is an attribute.
    let tag_close = if elem.span.is_self_closing() {
        elem.span.open_end.saturating_sub(2)
    } else {
        elem.span.open_end.saturating_sub(1)
    };
    let after_name = &buf[elem.name.end..tag_close];
    if after_name.iter().any(|b| !b.is_ascii_whitespace()) {
        return false;
    }
    inner(buf, &elem.span).iter().all(|b| b.is_ascii_whitespace())
}

/// Iterator over the direct child elements of a region.
pub struct ChildIter<'a> {
    buf: &'a [u8],
    at: usize,
    content_end: usize,
}

impl<'a> Iterator for ChildIter<'a> {
    type Item = Element;

    fn next(&mut self) -> Option<Element> {
        while self.at < self.content_end {
            if self.buf[self.at] == b'<' {
                if self.buf.get(self.at + 1) == Some(&b'/') {
                    // Close tag of the parent (or of malformed residue); in
                    // either case there are no further direct children.
                    return None;
                }
                let elem = element_at(self.buf, self.at)?;
                self.at = elem.span.end;
                return Some(elem);
            }
            self.at += 1;
        }
        None
    }
}

/// Iterate the direct child elements of `parent`, skipping nested content.
///
/// Yields nothing for a self-closing parent. Malformed children terminate the
/// iteration early rather than erroring.
pub fn children<'a>(buf: &'a [u8], parent: &TagSpan) -> ChildIter<'a> {
    ChildIter {
        buf,
        at: parent.open_end,
        content_end: parent.end.min(buf.len()),
    }
}
