//! Three-phase consistency sweep ("delint")
//!
//! Ownership restructuring leaves predictable garbage behind: records whose
//! claimed owner is gone or never acknowledged them, pointers at removed
//! records, and hollowed-out property elements. The sweep repairs all three
//! in strict order:
//!
//! 1. zombie removal — before anything else, so a zombie's outbound
//!    references cannot "defend" targets in phase 2
//! 2. dangling-reference removal — per-pointer splice, collapsing a property
//!    left with no attributes and no content
//! 3. empty-property pruning — last, so emptiness is derived once
//!
//! Dangling references and orphans are expected steady-state garbage in
//! historical stores; the sweep repairs them silently and reports counts,
//! it never errors.

use crate::forms::collapses_without;
use once_cell::sync::Lazy;
use recast_core::{wire, Identity, SchemaVersion, TypeName};
use recast_scan::{attribute, children, element_is_empty, find_element, splice, Element};
use recast_store::RecordStore;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::{debug, warn};

/// Classes legitimately allowed to have no owner, keyed by the first schema
/// version at which each becomes acceptable.
///
/// The list grows monotonically across versions and never shrinks, which the
/// `since` representation encodes structurally: a query for version V admits
/// every entry with `since <= V`.
#[derive(Debug, Clone, Default)]
pub struct OwnerlessAllowList {
    entries: Vec<(TypeName, SchemaVersion)>,
}

static DEFAULT_ALLOW_LIST: Lazy<OwnerlessAllowList> = Lazy::new(|| {
    OwnerlessAllowList::default()
        .allow("LangProject", SchemaVersion(0))
        .allow("ScrRefSystem", SchemaVersion(0))
});

impl OwnerlessAllowList {
    /// Start from the built-in baseline (project roots that were ownerless
    /// from the first schema).
    pub fn baseline() -> Self {
        DEFAULT_ALLOW_LIST.clone()
    }

    /// Admit `class` as legitimately ownerless from `since` onward.
    pub fn allow(mut self, class: &str, since: SchemaVersion) -> Self {
        self.entries.push((TypeName::from(class), since));
        self
    }

    /// Is an ownerless record of `class` acceptable at `version`?
    pub fn permits(&self, class: &TypeName, version: SchemaVersion) -> bool {
        self.entries
            .iter()
            .any(|(name, since)| name == class && *since <= version)
    }
}

/// Counts of what one sweep repaired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelintReport {
    /// Records removed in phase 1 (zombies plus their owned cascade).
    pub zombies_removed: usize,
    /// Individual pointers removed in phase 2.
    pub dangling_refs_removed: usize,
    /// Property elements removed in phases 2 and 3.
    pub properties_pruned: usize,
}

impl DelintReport {
    /// Whether the sweep changed nothing.
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// The consistency sweep. Invoked explicitly by steps whose ownership
/// restructuring is likely to produce orphans, and idempotent: sweeping a
/// clean store changes nothing.
pub struct IntegrityStep {
    allow: OwnerlessAllowList,
}

impl IntegrityStep {
    /// Sweep with a host-extended allow-list.
    pub fn new(allow: OwnerlessAllowList) -> Self {
        Self { allow }
    }

    /// Sweep with the built-in baseline allow-list.
    pub fn with_baseline_allow_list() -> Self {
        Self::new(OwnerlessAllowList::baseline())
    }

    /// Run all three phases over the whole store.
    pub fn sweep(&self, store: &mut RecordStore) -> DelintReport {
        let mut report = DelintReport::default();
        self.remove_zombies(store, &mut report);
        self.remove_dangling_references(store, &mut report);
        self.prune_empty_properties(store, &mut report);
        if report.is_clean() {
            debug!(target: "recast::delint", "store is clean");
        } else {
            warn!(
                target: "recast::delint",
                zombies = report.zombies_removed,
                dangling = report.dangling_refs_removed,
                pruned = report.properties_pruned,
                "repaired inconsistent state"
            );
        }
        report
    }

    /// Phase 1: remove records whose claimed ownership is not mutually
    /// consistent, plus everything they in turn own.
    ///
    /// No owner-side property cleanup happens here: a zombie's owner never
    /// acknowledged it, so there is nothing to clean.
    fn remove_zombies(&self, store: &mut RecordStore, report: &mut DelintReport) {
        let version = store.version();
        for id in store.identities() {
            if !store.contains(id) {
                continue;
            }
            let record = match store.try_get(id) {
                Some(r) => r,
                None => continue,
            };
            let zombie = match record.owner_identity() {
                Some(owner_id) => match store.try_get(owner_id) {
                    // Owner must acknowledge ownership with an owning pointer.
                    Some(owner) => !owner.owns(id),
                    None => true,
                },
                None => !self.allow.permits(record.type_name(), version),
            };
            if zombie {
                report.zombies_removed += cascade_remove(store, id);
            }
        }
    }

    /// Phase 2: remove pointers whose target no longer resolves; collapse a
    /// property left with no attributes and no content.
    fn remove_dangling_references(&self, store: &mut RecordStore, report: &mut DelintReport) {
        for id in store.identities() {
            let Some(record) = store.try_get(id) else {
                continue;
            };
            let buf = record.form();
            let Some(root) = record.root_span() else {
                continue;
            };

            // Deletion ranges for this record: whole properties or single
            // pointers, collected front-to-back, applied back-to-front.
            let mut deletions: Vec<Range<usize>> = Vec::new();
            let mut refs_here = 0usize;
            let mut props_here = 0usize;
            for property in children(buf, &root) {
                let (dead, live) = partition_pointers(store, buf, &property);
                if dead.is_empty() {
                    continue;
                }
                refs_here += dead.len();
                if live == 0 && collapses_without(buf, &property, &dead) {
                    props_here += 1;
                    deletions.push(property.span.range());
                } else {
                    deletions.extend(dead);
                }
            }
            if deletions.is_empty() {
                continue;
            }
            report.dangling_refs_removed += refs_here;
            report.properties_pruned += props_here;

            let mut form = buf.to_vec();
            for range in deletions.into_iter().rev() {
                form = splice::remove_span(&form, range);
            }
            let updated = record.with_form(form);
            if let Err(err) = store.update(updated) {
                debug!(target: "recast::delint", id = %id, error = %err, "repair not applied");
            }
        }
    }

    /// Phase 3: remove top-level property elements with neither attributes
    /// nor child content.
    fn prune_empty_properties(&self, store: &mut RecordStore, report: &mut DelintReport) {
        for id in store.identities() {
            let Some(record) = store.try_get(id) else {
                continue;
            };
            let buf = record.form();
            let Some(root) = record.root_span() else {
                continue;
            };
            let hollow: Vec<Range<usize>> = children(buf, &root)
                .filter(|p| element_is_empty(buf, p))
                .map(|p| p.span.range())
                .collect();
            if hollow.is_empty() {
                continue;
            }
            report.properties_pruned += hollow.len();
            let mut form = buf.to_vec();
            for range in hollow.into_iter().rev() {
                form = splice::remove_span(&form, range);
            }
            let updated = record.with_form(form);
            if let Err(err) = store.update(updated) {
                debug!(target: "recast::delint", id = %id, error = %err, "repair not applied");
            }
        }
    }
}

/// Remove `id` and every record it transitively owns, via an explicit
/// work-list so arbitrarily deep ownership chains cannot overflow the stack.
/// Returns the number of records removed.
fn cascade_remove(store: &mut RecordStore, id: Identity) -> usize {
    let mut removed = 0usize;
    let mut work = vec![id];
    while let Some(current) = work.pop() {
        let Ok(record) = store.remove(current) else {
            continue;
        };
        work.extend(record.owned_identities());
        removed += 1;
    }
    removed
}

/// Split the pointer elements inside one property into deletion ranges for
/// unresolved targets and a count of survivors.
fn partition_pointers(
    store: &RecordStore,
    buf: &[u8],
    property: &Element,
) -> (Vec<Range<usize>>, usize) {
    let mut dead = Vec::new();
    let mut live = 0usize;
    let mut at = property.span.open_end;
    while let Some(span) = find_element(buf, wire::OBJSUR_TAG, at..property.span.end) {
        at = span.end;
        let resolves = attribute(buf, &span, wire::GUID_ATTR)
            .and_then(Identity::parse)
            .map(|target| store.contains(target))
            .unwrap_or(false);
        if resolves {
            live += 1;
        } else {
            dead.push(span.range());
        }
    }
    (dead, live)
}
