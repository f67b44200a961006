//! Comprehensive migration integration tests
//!
//! End-to-end coverage of the engine over realistic stores:
//! - pipeline: run laws (idempotence, contracts, cancellation)
//! - integrity: delint phases and the post-run consistency invariants
//! - scenarios: the canonical migration shapes (subclass promotion,
//!   owner-deletion cascade, duplicate tie-break, span reconstruction)


mod integrity;
mod pipeline;
mod scenarios;
