//! Shared form-surgery helpers for delint and the ownership patterns

use recast_core::{wire, Identity};
use recast_scan::{attribute, children, content_end, find_element, splice, Element, TagSpan};
use std::ops::Range;

/// Locate the owning pointer to `target` inside a record form, returning the
/// containing property element and the pointer's span. At most one exists by
/// the single-owner convention; the first in document order is returned.
pub(crate) fn find_owning_pointer(buf: &[u8], target: Identity) -> Option<(Element, TagSpan)> {
    let root = find_element(buf, wire::RT_TAG, 0..buf.len())?;
    for property in children(buf, &root) {
        let mut at = property.span.open_end;
        while let Some(span) = find_element(buf, wire::OBJSUR_TAG, at..property.span.end) {
            at = span.end;
            if attribute(buf, &span, wire::OBJSUR_KIND_ATTR) == Some(wire::OBJSUR_OWNING)
                && attribute(buf, &span, wire::GUID_ATTR).and_then(Identity::parse)
                    == Some(target)
            {
                return Some((property, span));
            }
        }
    }
    None
}

/// Would the property be empty (no attributes, whitespace-only content) once
/// the given ranges are deleted from it?
pub(crate) fn collapses_without(buf: &[u8], property: &Element, deletions: &[Range<usize>]) -> bool {
    // Attributes survive deletion of content ranges.
    let tag_close = if property.span.is_self_closing() {
        property.span.open_end.saturating_sub(2)
    } else {
        property.span.open_end.saturating_sub(1)
    };
    let after_name = &buf[property.name.end..tag_close];
    if after_name.iter().any(|b| !b.is_ascii_whitespace()) {
        return false;
    }
    let content = property.span.open_end..content_end(buf, &property.span);
    content
        .filter(|i| !deletions.iter().any(|d| d.contains(i)))
        .all(|i| buf[i].is_ascii_whitespace())
}

/// Rewrite every `objsur` pointing at `old` to point at `new` instead.
///
/// Returns the rebuilt form, or None when no pointer matched. Each rewrite
/// restarts the scan, so shifting offsets from differently-sized textual
/// guid forms are never a problem.
pub(crate) fn rewrite_pointer_targets(buf: &[u8], old: Identity, new: Identity) -> Option<Vec<u8>> {
    if old == new {
        return None;
    }
    let mut form = buf.to_vec();
    let mut changed = false;
    loop {
        let mut hit: Option<TagSpan> = None;
        let mut at = 0;
        while let Some(span) = find_element(&form, wire::OBJSUR_TAG, at..form.len()) {
            at = span.end;
            if attribute(&form, &span, wire::GUID_ATTR).and_then(Identity::parse) == Some(old) {
                hit = Some(span);
                break;
            }
        }
        match hit {
            Some(span) => {
                form = splice::set_attribute(&form, &span, wire::GUID_ATTR, &new.to_string());
                changed = true;
            }
            None => break,
        }
    }
    changed.then_some(form)
}
