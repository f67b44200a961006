//! Recast - schema migration engine for tagged-record project stores
//!
//! Recast evolves a persisted graph of domain objects — serialized as
//! self-contained tagged text records — from one integer schema version to
//! the next, one step at a time, preserving referential and ownership
//! integrity across stores of up to millions of records.
//!
//! # Quick Start
//!
//! ```ignore
//! use recast::{
//!     IntegrityStep, NullObserver, RecordStore, SchemaVersion, StepPipeline, StepRegistry,
//! };
//!
//! // Host loads records into a store at its on-disk version...
//! let mut store = RecordStore::new(catalog, SchemaVersion(7000001));
//! for record in loaded {
//!     store.load(record);
//! }
//!
//! // ...registers its steps and runs the pipeline to the target version.
//! let mut registry = StepRegistry::new();
//! registry.register(Box::new(my_step))?;
//! let mut pipeline = StepPipeline::new(registry);
//! let report = pipeline.run(&mut store, SchemaVersion(7000002), &mut NullObserver)?;
//!
//! // The reconciled change set is what the host writes back.
//! let changes = store.reconcile();
//! ```
//!
//! # Architecture
//!
//! The store ([`RecordStore`]) holds every record during a run, with class
//! indices and ownership derived from record-local text. The pipeline
//! ([`StepPipeline`]) applies registered steps strictly in order, one
//! version at a time. Steps inspect serialized forms through the scanner
//! (`recast_scan`) instead of a full parse, and steps that restructure
//! ownership invoke the delint sweep ([`IntegrityStep`]) to repair the
//! orphans they leave behind.

pub use recast_core::{
    catalog, wire, ClassDef, Error, FieldSpec, Identity, Record, RefKind, Reference, Result,
    SchemaVersion, StaticCatalog, TypeCatalog, TypeName,
};
pub use recast_engine::{
    change_identity, ensure_property, fill_implicit_spans, select_winner, transfer_ownership,
    Candidate, DelintReport, IntegrityStep, NullObserver, OwnerlessAllowList, PipelineState,
    ProgressObserver, PromoteSubclassStep, RunReport, SpanKind, Step, StepPipeline, StepRegistry,
    TokenSpan,
};
pub use recast_scan as scan;
pub use recast_store::{
    ChangeKind, ChangeSet, ChangedRecord, ClassIndex, OwnershipMode, ReconciledChanges,
    RecordStore,
};
