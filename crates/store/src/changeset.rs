//! Staged change tracking for one migration run
//!
//! Every add/update/remove on the store stages a change here; the host reads
//! the reconciled view once after the pipeline completes and writes it back
//! to durable storage. Collapsing rules:
//! - Added then Modified stays Added
//! - Added then Removed drops out entirely (created-and-destroyed in one run
//!   is a no-op from the host's perspective)
//! - Removed discards any pending Modified (deletion wins)
//! - Removed then re-Added under the same identity collapses to Modified
//!   (net effect is a content change to a record the host already holds)

use recast_core::{Identity, Record};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Net disposition of one record within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    /// Created during the run; the host has never seen it.
    Added,
    /// Existed before the run and its form changed.
    Modified,
    /// Existed before the run and is gone.
    Removed,
}

/// Staged changes, collapsed as they are noted.
#[derive(Debug, Default)]
pub struct ChangeSet {
    staged: FxHashMap<Identity, ChangeKind>,
}

impl ChangeSet {
    /// Create an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Note that a record was created.
    pub fn note_added(&mut self, id: Identity) {
        match self.staged.get(&id) {
            Some(ChangeKind::Removed) => {
                self.staged.insert(id, ChangeKind::Modified);
            }
            _ => {
                self.staged.insert(id, ChangeKind::Added);
            }
        }
    }

    /// Note that a record's form changed.
    pub fn note_modified(&mut self, id: Identity) {
        match self.staged.get(&id) {
            Some(ChangeKind::Added) | Some(ChangeKind::Removed) => {}
            _ => {
                self.staged.insert(id, ChangeKind::Modified);
            }
        }
    }

    /// Note that a record was deleted.
    pub fn note_removed(&mut self, id: Identity) {
        match self.staged.get(&id) {
            Some(ChangeKind::Added) => {
                self.staged.remove(&id);
            }
            _ => {
                self.staged.insert(id, ChangeKind::Removed);
            }
        }
    }

    /// Current net disposition of an identity, if any change is staged.
    pub fn kind(&self, id: Identity) -> Option<ChangeKind> {
        self.staged.get(&id).copied()
    }

    /// Number of staged entries.
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    /// Whether nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Iterate staged entries.
    pub fn iter(&self) -> impl Iterator<Item = (Identity, ChangeKind)> + '_ {
        self.staged.iter().map(|(id, kind)| (*id, *kind))
    }
}

/// One surviving record in the reconciled view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedRecord {
    /// Identity in canonical lowercase form.
    pub identity: String,
    /// Class under the final schema.
    pub class: String,
    /// Full serialized form.
    pub form: String,
}

impl ChangedRecord {
    /// Summarize one record.
    pub fn from_record(record: &Record) -> Self {
        Self {
            identity: record.identity().to_string(),
            class: record.type_name().to_string(),
            form: String::from_utf8_lossy(record.form()).into_owned(),
        }
    }
}

/// Collapsed view the host writes back after a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledChanges {
    /// Records created during the run (and still alive).
    pub added: Vec<ChangedRecord>,
    /// Pre-existing records whose form changed.
    pub modified: Vec<ChangedRecord>,
    /// Identities of pre-existing records that are gone.
    pub removed: Vec<String>,
}

impl ReconciledChanges {
    /// Total entries across all three sets.
    pub fn len(&self) -> usize {
        self.added.len() + self.modified.len() + self.removed.len()
    }

    /// Whether the run changed nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
