//! Shipped migration steps
//!
//! The overwhelming majority of steps are host-registered domain trivia.
//! The one shipped here covers the recurring "fold a subclass into its base
//! class" shape: reclassify every instance, optionally seeding a property
//! the base class now requires, so the subclass can be dropped from the
//! catalog at the destination version.

use crate::step::Step;
use recast_core::{wire, Error, Identity, Record, Result, SchemaVersion, TypeName};
use recast_scan::{content_end, splice};
use recast_store::RecordStore;
use tracing::debug;

/// Insert `<name>content</name>` as a top-level property when the record
/// has no property of that name. Returns true when the form changed.
pub fn ensure_property(
    store: &mut RecordStore,
    id: Identity,
    name: &str,
    content: &str,
) -> Result<bool> {
    let record = store.get(id)?;
    if record.property_span(name).is_some() {
        return Ok(false);
    }
    let record = record.clone();
    let root = record
        .root_span()
        .ok_or_else(|| Error::InvalidRecord(format!("record {id} has no rt element")))?;
    let element = format!("<{name}>{content}</{name}>");
    let form = splice::insert_at(record.form(), content_end(record.form(), &root), element.as_bytes());
    store.update(record.with_form(form))?;
    Ok(true)
}

/// Reclassify every instance of a subclass to its base class.
///
/// Records keep their identity, owner, and properties; only the class tag
/// changes (index buckets move with it). Optionally seeds a property the
/// base class requires where an instance lacks it.
pub struct PromoteSubclassStep {
    destination: SchemaVersion,
    subclass: TypeName,
    base: TypeName,
    seed: Option<(String, String)>,
    description: String,
}

impl PromoteSubclassStep {
    /// Promote `subclass` into `base` at `destination`.
    pub fn new(destination: SchemaVersion, subclass: &str, base: &str) -> Self {
        Self {
            destination,
            subclass: TypeName::from(subclass),
            base: TypeName::from(base),
            seed: None,
            description: format!("promote {subclass} into {base}"),
        }
    }

    /// Also seed `property` with `content` on instances that lack it.
    pub fn seeding_property(mut self, property: &str, content: &str) -> Self {
        self.seed = Some((property.to_string(), content.to_string()));
        self
    }
}

impl Step for PromoteSubclassStep {
    fn destination(&self) -> SchemaVersion {
        self.destination
    }

    fn apply(&self, store: &mut RecordStore) -> Result<()> {
        let ids: Vec<Identity> = store
            .instances_of_exact_class(&self.subclass)
            .iter()
            .map(|r| r.identity())
            .collect();
        debug!(
            target: "recast::steps",
            subclass = %self.subclass,
            base = %self.base,
            count = ids.len(),
            "promoting subclass instances"
        );
        for id in ids {
            let record = store.get(id)?.clone();
            let root = record
                .root_span()
                .ok_or_else(|| Error::InvalidRecord(format!("record {id} has no rt element")))?;
            let form =
                splice::set_attribute(record.form(), &root, wire::CLASS_ATTR, self.base.as_str());
            let promoted = Record::from_form(form)?;
            store.reclassify(promoted, &self.subclass)?;
            if let Some((property, content)) = &self.seed {
                ensure_property(store, id, property, content)?;
            }
        }
        store.advance_version();
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }
}
