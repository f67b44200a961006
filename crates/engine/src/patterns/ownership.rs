//! Ownership transfer and identifier remapping
//!
//! Changing a record's owner touches three forms: the old owner loses its
//! owning pointer (and the containing property, if that empties it), the new
//! owner gains one, and the record's own `ownerguid` back-pointer moves.
//!
//! Changing a record's identity is remove-plus-add — identities are
//! immutable — and every pointer at the old identity must be rewritten. The
//! owner and owned descendants are found from record-local data; pointers
//! from anywhere else come from a caller-supplied candidate set, because the
//! engine deliberately maintains no full reverse-reference index.

use crate::forms::{collapses_without, find_owning_pointer, rewrite_pointer_targets};
use recast_core::{wire, Error, Identity, Record, Result};
use recast_scan::{children, content_end, find_element, splice};
use recast_store::RecordStore;
use tracing::debug;

/// Move `id` from its current owner (if any) to `new_owner`, housing the
/// owning pointer in the new owner's property `property_name` (created when
/// absent).
pub fn transfer_ownership(
    store: &mut RecordStore,
    id: Identity,
    new_owner: Identity,
    property_name: &str,
) -> Result<()> {
    store.get(id)?;
    store.get(new_owner)?;

    debug!(
        target: "recast::ownership",
        id = %id,
        to = %new_owner,
        property = property_name,
        "transfer ownership"
    );

    // (i) Remove the owning pointer from the old owner, collapsing the
    // property if that leaves it with no attributes and no content.
    let old_owner = store.get(id)?.owner_identity().and_then(|o| {
        store.try_get(o).map(|r| r.clone())
    });
    if let Some(old) = old_owner {
        if let Some((property, pointer)) = find_owning_pointer(old.form(), id) {
            let range = if collapses_without(old.form(), &property, &[pointer.range()]) {
                property.span.range()
            } else {
                pointer.range()
            };
            let form = splice::remove_span(old.form(), range);
            store.update(old.with_form(form))?;
        }
    }

    // (ii) Insert an owning pointer into the new owner's property.
    let owner = store.get(new_owner)?.clone();
    let form = insert_owning_pointer(owner.form(), id, property_name)?;
    store.update(owner.with_form(form))?;

    // (iii) Move the record's own back-pointer.
    let record = store.get(id)?.clone();
    let root = record
        .root_span()
        .ok_or_else(|| Error::InvalidRecord(format!("record {id} has no rt element")))?;
    let form = splice::set_attribute(record.form(), &root, wire::OWNER_ATTR, &new_owner.to_string());
    store.update(record.with_form(form))?;
    Ok(())
}

/// Build the new owner's form with an owning pointer to `target` appended to
/// `property_name`, creating the property element when absent.
fn insert_owning_pointer(buf: &[u8], target: Identity, property_name: &str) -> Result<Vec<u8>> {
    let root = find_element(buf, wire::RT_TAG, 0..buf.len())
        .ok_or_else(|| Error::InvalidRecord("owner form has no rt element".to_string()))?;
    let pointer = format!("<objsur t=\"o\" guid=\"{target}\"/>");

    let existing = children(buf, &root)
        .find(|c| c.name_str(buf) == Some(property_name))
        .map(|c| c.span);
    match existing {
        Some(span) if span.is_self_closing() => {
            // Expand `<Name/>` into a paired tag holding the pointer.
            let open = &buf[span.begin..span.open_end - 2];
            let mut replacement = open.to_vec();
            replacement.extend_from_slice(b">");
            replacement.extend_from_slice(pointer.as_bytes());
            replacement.extend_from_slice(format!("</{property_name}>").as_bytes());
            Ok(splice::replace_span(buf, span.range(), &replacement))
        }
        Some(span) => Ok(splice::insert_at(
            buf,
            content_end(buf, &span),
            pointer.as_bytes(),
        )),
        None => {
            let element = format!("<{property_name}>{pointer}</{property_name}>");
            Ok(splice::insert_at(
                buf,
                content_end(buf, &root),
                element.as_bytes(),
            ))
        }
    }
}

/// Replace a record's identity with `new`, carrying over all properties.
///
/// Rewrites the owner's owning pointer and every owned descendant's
/// back-pointer automatically; reference-only pointers elsewhere are
/// rewritten for each record in `candidates`. Fails when `new` is already
/// live, or when `old` is absent.
pub fn change_identity(
    store: &mut RecordStore,
    old: Identity,
    new: Identity,
    candidates: &[Identity],
) -> Result<()> {
    if store.contains(new) {
        return Err(Error::InvalidRecord(format!(
            "change of identity into a live record: {new}"
        )));
    }
    let removed = store.remove(old)?;

    debug!(target: "recast::ownership", old = %old, new = %new, "change identity");

    let root = removed
        .root_span()
        .ok_or_else(|| Error::InvalidRecord(format!("record {old} has no rt element")))?;
    let form = splice::set_attribute(removed.form(), &root, wire::GUID_ATTR, &new.to_string());
    let replacement = Record::from_form(form)?;
    let owned = replacement.owned_identities();
    let owner_id = replacement.owner_identity();
    store.add(replacement)?;

    // The owner's owning pointer follows the identity.
    if let Some(owner) = owner_id.and_then(|o| store.try_get(o)).cloned() {
        if let Some(form) = rewrite_pointer_targets(owner.form(), old, new) {
            store.update(owner.with_form(form))?;
        }
    }

    // Owned descendants keep pointing home.
    for child_id in owned {
        let Some(child) = store.try_get(child_id) else {
            continue;
        };
        if child.owner_identity() != Some(old) {
            continue;
        }
        let child = child.clone();
        let Some(child_root) = child.root_span() else {
            continue;
        };
        let form =
            splice::set_attribute(child.form(), &child_root, wire::OWNER_ATTR, &new.to_string());
        store.update(child.with_form(form))?;
    }

    // Reference-only pointers live wherever the caller says they do.
    for candidate in candidates {
        let Some(record) = store.try_get(*candidate) else {
            continue;
        };
        if let Some(form) = rewrite_pointer_targets(record.form(), old, new) {
            let record = record.clone().with_form(form);
            store.update(record)?;
        }
    }
    Ok(())
}
