//! Recurring algorithmic patterns for non-trivial migration steps
//!
//! Not domain steps themselves, but the capability set every ownership- or
//! structure-reworking step leans on:
//! - ownership: transfer a record between owners; change a record's identity
//!   with caller-scoped reference remapping
//! - tiebreak: deterministic winner selection among duplicate candidates
//! - tokenize: reconstruct implicit word/punctuation spans from raw text

pub mod ownership;
pub mod tiebreak;
pub mod tokenize;
