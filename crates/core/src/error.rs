//! Error types for the migration engine
//!
//! We use `thiserror` for automatic `Display` and `Error` trait
//! implementations. Fatal pipeline errors (version-contract failures) are
//! distinct variants so callers can tell a logic defect from a data defect;
//! malformed historical text is deliberately NOT represented here — the
//! scanner resolves it to absence instead.

use crate::types::{Identity, SchemaVersion};
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the migration engine
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Direct identity lookup failed; a step assumed a record that is absent.
    #[error("record not found: {0}")]
    NotFound(Identity),

    /// The store is not at the version a step expected to start from.
    #[error("version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Version the step requires before running
        expected: SchemaVersion,
        /// Version the store actually carries
        actual: SchemaVersion,
    },

    /// The requested target version is behind the store's current version.
    #[error("backward migration requested: store is at {current}, target is {target}")]
    BackwardMigration {
        /// Version the store currently carries
        current: SchemaVersion,
        /// Requested target version
        target: SchemaVersion,
    },

    /// No step is registered that produces the given version.
    #[error("no migration step produces version {0}")]
    UnknownVersion(SchemaVersion),

    /// A step ran but did not leave the store at exactly the next version.
    ///
    /// Fatal: the store state must be considered corrupt. Never silently
    /// corrected by forcing the version forward.
    #[error("step contract violation: step should have produced {expected}, store is at {actual}")]
    StepContractViolation {
        /// Version the step was registered to produce
        expected: SchemaVersion,
        /// Version observed after the step returned
        actual: SchemaVersion,
    },

    /// Step registration left a gap in the version table.
    #[error("step registration gap: expected a step producing {expected}, found {found}")]
    RegistrationGap {
        /// Version the table needed next
        expected: SchemaVersion,
        /// Version actually registered at that position
        found: SchemaVersion,
    },

    /// The host requested cancellation between steps.
    #[error("migration cancelled between steps")]
    Cancelled,

    /// A serialized record blob is missing its class or identity.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Pipeline misuse, e.g. starting a run while one is active.
    #[error("pipeline is busy: a run is already active")]
    PipelineBusy,
}
