//! Arena of records with derived ownership and staged changes
//!
//! The RecordStore owns every record during a run, keyed by Identity, with:
//! - exact-class index buckets (subtype closure unioned per query via the
//!   host's type catalog)
//! - ownership derived on demand from record-local text, with per-owner
//!   memoization (never a reverse-reference index — bounding memory on
//!   million-record stores matters more than lookup speed)
//! - a ChangeSet staged by every mutation and reconciled once after the run
//!
//! Index consistency is maintained inline: a query issued immediately after
//! `add` observes the new record.

use crate::changeset::{ChangeKind, ChangeSet, ChangedRecord, ReconciledChanges};
use crate::index::ClassIndex;
use recast_core::{Error, Identity, Record, Result, SchemaVersion, TypeCatalog, TypeName};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::sync::Arc;
use tracing::debug;

/// When owner → owned lists are derived.
///
/// Both modes sit behind the same interface; the choice is a memory/speed
/// tradeoff driven by expected store size. Lazy derives an owner's list the
/// first time it is queried; Eager derives it as each record is loaded, which
/// suits small stores that will be queried heavily.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OwnershipMode {
    /// Derive on first query, memoize per owner.
    #[default]
    Lazy,
    /// Derive at load time.
    Eager,
}

/// In-memory record store for one migration run.
///
/// Single-threaded by contract: only one run is ever active over a store,
/// and the memo cache uses interior mutability that is not thread-safe.
pub struct RecordStore {
    records: FxHashMap<Identity, Record>,
    class_index: ClassIndex,
    catalog: Arc<dyn TypeCatalog>,
    version: SchemaVersion,
    changes: ChangeSet,
    mode: OwnershipMode,
    /// Memoized owner → owned identities, invalidated when the owner's form
    /// changes. Entries may name identities that have since been removed;
    /// resolution filters those out.
    owned_memo: RefCell<FxHashMap<Identity, Vec<Identity>>>,
}

impl RecordStore {
    /// Create an empty store at a schema version.
    pub fn new(catalog: Arc<dyn TypeCatalog>, version: SchemaVersion) -> Self {
        Self {
            records: FxHashMap::default(),
            class_index: ClassIndex::new(),
            catalog,
            version,
            changes: ChangeSet::new(),
            mode: OwnershipMode::default(),
            owned_memo: RefCell::new(FxHashMap::default()),
        }
    }

    /// Select the ownership derivation mode.
    pub fn with_ownership_mode(mut self, mode: OwnershipMode) -> Self {
        self.mode = mode;
        self
    }

    /// Seed one pre-existing record before the run starts.
    ///
    /// Loading is not a change: nothing is staged. Replaces any earlier
    /// record loaded under the same identity.
    pub fn load(&mut self, record: Record) {
        let id = record.identity();
        if let Some(old) = self.records.get(&id) {
            let old_class = old.type_name().clone();
            self.class_index.remove(&old_class, id);
        }
        self.class_index.insert(record.type_name().clone(), id);
        if self.mode == OwnershipMode::Eager {
            self.owned_memo
                .borrow_mut()
                .insert(id, record.owned_identities().to_vec());
        }
        self.records.insert(id, record);
    }

    /// The store's current schema version.
    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Advance the version by exactly one step.
    ///
    /// Called by a step as its final act; the pipeline asserts the result.
    pub fn advance_version(&mut self) {
        self.version = self.version.next();
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether an identity resolves to a live record.
    pub fn contains(&self, id: Identity) -> bool {
        self.records.contains_key(&id)
    }

    /// Direct lookup; `NotFound` when absent.
    pub fn get(&self, id: Identity) -> Result<&Record> {
        self.records.get(&id).ok_or(Error::NotFound(id))
    }

    /// Direct lookup that never fails.
    pub fn try_get(&self, id: Identity) -> Option<&Record> {
        self.records.get(&id)
    }

    /// The record's owner, derived from its own `ownerguid` back-pointer.
    ///
    /// O(size of the record), independent of store size. None when the
    /// record is absent, declares no owner, or the owner does not resolve.
    pub fn owner(&self, id: Identity) -> Option<&Record> {
        let owner_id = self.try_get(id)?.owner_identity()?;
        self.try_get(owner_id)
    }

    /// Records the given record owns, derived by scanning the owner's form
    /// for owning references. O(size of the owner's form); memoized.
    pub fn owned_by(&self, id: Identity) -> Vec<&Record> {
        let Some(owner) = self.try_get(id) else {
            return Vec::new();
        };
        let mut memo = self.owned_memo.borrow_mut();
        let ids = memo
            .entry(id)
            .or_insert_with(|| owner.owned_identities().to_vec())
            .clone();
        drop(memo);
        ids.into_iter().filter_map(|t| self.try_get(t)).collect()
    }

    /// Live records of exactly the named class, ordered by identity.
    ///
    /// Unknown (including obsolete) class names yield an empty list.
    pub fn instances_of_exact_class(&self, class: &TypeName) -> Vec<&Record> {
        let mut out: Vec<&Record> = self
            .class_index
            .get(class)
            .map(|ids| ids.iter().filter_map(|id| self.try_get(*id)).collect())
            .unwrap_or_default();
        out.sort_by_key(|r| r.identity());
        out
    }

    /// Live records of the named class or any subclass, ordered by identity.
    pub fn instances_of_class(&self, class: &TypeName) -> Vec<&Record> {
        let mut out: Vec<&Record> = Vec::new();
        for name in self.catalog.with_subclasses(class) {
            if let Some(ids) = self.class_index.get(&name) {
                out.extend(ids.iter().filter_map(|id| self.try_get(*id)));
            }
        }
        out.sort_by_key(|r| r.identity());
        out
    }

    /// Iterate all live records in unspecified order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// All live identities, ordered.
    ///
    /// Sweeps that mutate while iterating (delint) snapshot this first.
    pub fn identities(&self) -> Vec<Identity> {
        let mut ids: Vec<Identity> = self.records.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Create a record mid-run. Stages Added and indexes it immediately.
    ///
    /// Adding an identity that is already live is a step logic defect.
    pub fn add(&mut self, record: Record) -> Result<()> {
        let id = record.identity();
        if self.records.contains_key(&id) {
            return Err(Error::InvalidRecord(format!(
                "add of identity already live in the store: {id}"
            )));
        }
        self.class_index.insert(record.type_name().clone(), id);
        self.owned_memo.borrow_mut().remove(&id);
        self.records.insert(id, record);
        self.changes.note_added(id);
        Ok(())
    }

    /// Replace a record's form. Stages Modified (unless it is still Added).
    ///
    /// If the incoming record carries a different class, the index buckets
    /// move as part of the same call.
    pub fn update(&mut self, record: Record) -> Result<()> {
        let id = record.identity();
        let old = self.records.get(&id).ok_or(Error::NotFound(id))?;
        let old_class = old.type_name().clone();
        if *record.type_name() != old_class {
            self.class_index
                .reclassify(&old_class, record.type_name().clone(), id);
        }
        self.owned_memo.borrow_mut().remove(&id);
        self.records.insert(id, record);
        self.changes.note_modified(id);
        Ok(())
    }

    /// Change a record's class, moving index buckets transactionally.
    ///
    /// `record` carries the new class (and a form whose `class` attribute
    /// the caller has rewritten to match); `old_class` names the bucket it
    /// leaves.
    pub fn reclassify(&mut self, record: Record, old_class: &TypeName) -> Result<()> {
        let id = record.identity();
        if !self.records.contains_key(&id) {
            return Err(Error::NotFound(id));
        }
        debug!(
            target: "recast::store",
            id = %id,
            from = %old_class,
            to = %record.type_name(),
            "reclassify"
        );
        self.class_index
            .reclassify(old_class, record.type_name().clone(), id);
        self.owned_memo.borrow_mut().remove(&id);
        self.records.insert(id, record);
        self.changes.note_modified(id);
        Ok(())
    }

    /// Delete a record. Stages Removed and unindexes it immediately.
    pub fn remove(&mut self, id: Identity) -> Result<Record> {
        let record = self.records.remove(&id).ok_or(Error::NotFound(id))?;
        self.class_index.remove(record.type_name(), id);
        self.owned_memo.borrow_mut().remove(&id);
        self.changes.note_removed(id);
        Ok(record)
    }

    /// The staged change set.
    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    /// Collapse the change set into the view the host writes back.
    ///
    /// Idempotent: calling again with no further changes returns the same
    /// view. Entries are ordered by identity.
    pub fn reconcile(&self) -> ReconciledChanges {
        let mut out = ReconciledChanges::default();
        let mut entries: Vec<(Identity, ChangeKind)> = self.changes.iter().collect();
        entries.sort_by_key(|(id, _)| *id);
        for (id, kind) in entries {
            match kind {
                ChangeKind::Added => {
                    if let Some(record) = self.try_get(id) {
                        out.added.push(ChangedRecord::from_record(record));
                    }
                }
                ChangeKind::Modified => {
                    if let Some(record) = self.try_get(id) {
                        out.modified.push(ChangedRecord::from_record(record));
                    }
                }
                ChangeKind::Removed => out.removed.push(id.to_string()),
            }
        }
        out
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("records", &self.records.len())
            .field("version", &self.version)
            .field("mode", &self.mode)
            .field("staged_changes", &self.changes.len())
            .finish()
    }
}
