//! Core types for the record migration engine
//!
//! This crate defines the foundational types used throughout the system:
//! - Identity: 128-bit globally unique record identifier
//! - TypeName: a record's concrete class as the current schema understands it
//! - SchemaVersion: whole-store integer version, advanced one step at a time
//! - Record: one persisted domain object (identity + class + serialized form)
//! - Reference / RefKind: embedded owning or plain pointers between records
//! - TypeCatalog: host-supplied class hierarchy and field metadata
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod error;
pub mod record;
pub mod types;
pub mod wire;

pub use catalog::{ClassDef, FieldSpec, StaticCatalog, TypeCatalog};
pub use error::{Error, Result};
pub use record::Record;
pub use types::{Identity, RefKind, Reference, SchemaVersion, TypeName};
