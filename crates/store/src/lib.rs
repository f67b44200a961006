//! In-memory record store for migration runs
//!
//! This crate owns the full record set during a run:
//! - RecordStore: arena of records keyed by Identity, with class indices,
//!   derived ownership, and the whole-store schema version
//! - ClassIndex: exact class name → identities (subtype closure comes from
//!   the type catalog)
//! - ChangeSet: staged Added/Modified/Removed changes, reconciled once at the
//!   end of a run
//!
//! The store is single-run, single-threaded by contract; it is not designed
//! to be shared across threads.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod changeset;
pub mod index;
pub mod store;

pub use changeset::{ChangeKind, ChangeSet, ChangedRecord, ReconciledChanges};
pub use index::ClassIndex;
pub use store::{OwnershipMode, RecordStore};
