//! One persisted domain object
//!
//! A Record couples an Identity and a TypeName with the record's serialized
//! tagged-text form. Every derived accessor works from the record's own bytes
//! (never from a scan of other records) so the cost is bounded by the size of
//! this record, independent of the store.
//!
//! Inspecting a record never changes its bytes; every mutation goes through
//! rebuilding the form and staging the new record in the store.

use crate::error::{Error, Result};
use crate::types::{Identity, RefKind, Reference, TypeName};
use crate::wire;
use recast_scan::{attribute, children, find_element, next_element, TagSpan};
use smallvec::SmallVec;

/// One persisted domain object: identity + class + serialized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    identity: Identity,
    type_name: TypeName,
    form: Vec<u8>,
}

impl Record {
    /// Create a record from already-known parts.
    ///
    /// The caller is responsible for the form's `guid`/`class` attributes
    /// agreeing with the given identity and class; store operations keep
    /// them in sync.
    pub fn new(identity: Identity, type_name: TypeName, form: Vec<u8>) -> Self {
        Self {
            identity,
            type_name,
            form,
        }
    }

    /// Parse a record from its serialized form alone.
    ///
    /// Reads `class` and `guid` from the `rt` open tag. Fails with
    /// `InvalidRecord` when either is missing or unparseable; everything
    /// else about the form is deliberately left unvalidated.
    pub fn from_form(form: Vec<u8>) -> Result<Self> {
        let root = find_element(&form, wire::RT_TAG, 0..form.len())
            .ok_or_else(|| Error::InvalidRecord("no rt element".to_string()))?;
        let class = attribute(&form, &root, wire::CLASS_ATTR)
            .ok_or_else(|| Error::InvalidRecord("rt element has no class".to_string()))?;
        let guid = attribute(&form, &root, wire::GUID_ATTR)
            .ok_or_else(|| Error::InvalidRecord("rt element has no guid".to_string()))?;
        let identity = Identity::parse(guid)
            .ok_or_else(|| Error::InvalidRecord(format!("unparseable guid: {guid}")))?;
        let type_name = TypeName::from(class);
        Ok(Self {
            identity,
            type_name,
            form,
        })
    }

    /// Synthesize a minimal empty record form for a new object.
    pub fn synthesize(identity: Identity, class: TypeName, owner: Option<Identity>) -> Self {
        let form = match owner {
            Some(owner) => format!(
                "<rt class=\"{class}\" guid=\"{identity}\" ownerguid=\"{owner}\"></rt>"
            ),
            None => format!("<rt class=\"{class}\" guid=\"{identity}\"></rt>"),
        };
        Self {
            identity,
            type_name: class,
            form: form.into_bytes(),
        }
    }

    /// The record's immutable identity.
    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// The record's class under the current schema.
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    /// The serialized form.
    pub fn form(&self) -> &[u8] {
        &self.form
    }

    /// Same identity and class, different serialized form.
    pub fn with_form(&self, form: Vec<u8>) -> Self {
        Self {
            identity: self.identity,
            type_name: self.type_name.clone(),
            form,
        }
    }

    /// Same identity and form, different class tag.
    ///
    /// Used by reclassification; the caller is expected to have rewritten
    /// the form's `class` attribute to match.
    pub fn with_type_name(&self, type_name: TypeName) -> Self {
        Self {
            identity: self.identity,
            type_name,
            form: self.form.clone(),
        }
    }

    /// Span of the `rt` element, when the form is well enough formed to have
    /// one.
    pub fn root_span(&self) -> Option<TagSpan> {
        find_element(&self.form, wire::RT_TAG, 0..self.form.len())
    }

    /// The declared owner, read from the record's own `ownerguid`
    /// back-pointer. O(size of this record).
    pub fn owner_identity(&self) -> Option<Identity> {
        let root = self.root_span()?;
        let raw = attribute(&self.form, &root, wire::OWNER_ATTR)?;
        Identity::parse(raw)
    }

    /// Every embedded reference in the form, in document order.
    ///
    /// Pointers whose `guid` does not parse are skipped, matching the
    /// general rule that malformed historical text reads as absent.
    pub fn references(&self) -> SmallVec<[Reference; 4]> {
        let mut out = SmallVec::new();
        let mut at = 0;
        while let Some(span) = next_element(&self.form, wire::OBJSUR_TAG, at) {
            at = span.end;
            let kind = match attribute(&self.form, &span, wire::OBJSUR_KIND_ATTR) {
                Some(wire::OBJSUR_OWNING) => RefKind::Owning,
                Some(wire::OBJSUR_PLAIN) => RefKind::Plain,
                _ => continue,
            };
            let Some(target) = attribute(&self.form, &span, wire::GUID_ATTR)
                .and_then(Identity::parse)
            else {
                continue;
            };
            out.push(Reference { kind, target });
        }
        out
    }

    /// Identities this record owns, in document order.
    pub fn owned_identities(&self) -> SmallVec<[Identity; 4]> {
        self.references()
            .into_iter()
            .filter(|r| r.kind == RefKind::Owning)
            .map(|r| r.target)
            .collect()
    }

    /// Does this record hold an owning reference to `target`?
    pub fn owns(&self, target: Identity) -> bool {
        self.references()
            .iter()
            .any(|r| r.kind == RefKind::Owning && r.target == target)
    }

    /// Span of the top-level property element named `name`.
    ///
    /// Finds either a direct child tag `<name>` or a `<Custom name="...">`
    /// child carrying the property name. Absent property means
    /// empty/default, so `None` is an ordinary answer.
    pub fn property_span(&self, name: &str) -> Option<TagSpan> {
        let root = self.root_span()?;
        for child in children(&self.form, &root) {
            match child.name_str(&self.form) {
                Some(tag) if tag == name => return Some(child.span),
                Some(wire::CUSTOM_TAG) => {
                    if attribute(&self.form, &child.span, wire::NAME_ATTR) == Some(name) {
                        return Some(child.span);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Cheap probe: value of `attr` on the property element named `name`.
    pub fn property_attribute(&self, name: &str, attr: &str) -> Option<&str> {
        let span = self.property_span(name)?;
        attribute(&self.form, &span, attr)
    }
}
