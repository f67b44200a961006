//! The step contract
//!
//! A step is a pure function from a store at version N to the same store at
//! version N+1, expressed only through the store's query/mutate surface (and
//! the scanner for cheap text probes). Steps are stateless across runs; any
//! working maps they need live only for the duration of `apply`.

use recast_core::{Result, SchemaVersion};
use recast_store::RecordStore;

/// One version-to-version transformation over the record store.
pub trait Step {
    /// The version this step produces. A step registered here must leave
    /// the store at exactly this version, advancing it by one.
    fn destination(&self) -> SchemaVersion;

    /// Transform the store from `destination - 1` to `destination`.
    ///
    /// The implementation must call `store.advance_version()` exactly once;
    /// the pipeline verifies the result and treats any mismatch as a fatal
    /// contract violation.
    fn apply(&self, store: &mut RecordStore) -> Result<()>;

    /// Short human-readable description for progress logs.
    fn description(&self) -> &str {
        "schema migration step"
    }
}
