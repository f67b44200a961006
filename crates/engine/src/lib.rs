//! Migration engine: step pipeline, integrity sweep, recurring patterns
//!
//! This crate orchestrates a migration run over a RecordStore:
//! - Step / StepRegistry / StepPipeline: ordered, gap-free version-to-version
//!   transformation with progress and cancellation between steps
//! - IntegrityStep ("delint"): three-phase consistency sweep repairing
//!   zombies, dangling references, and empty property residue
//! - patterns: capabilities every non-trivial step leans on — ownership
//!   transfer with identity remapping, duplicate-candidate tie-break, and
//!   implicit-span tokenization
//!
//! The engine is the only component that knows about run lifecycle and
//! cross-step ordering; field-level domain knowledge lives in the individual
//! steps the host registers.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod delint;
mod forms;
pub mod patterns;
pub mod pipeline;
pub mod step;
pub mod steps;

pub use delint::{DelintReport, IntegrityStep, OwnerlessAllowList};
pub use patterns::ownership::{change_identity, transfer_ownership};
pub use patterns::tiebreak::{select_winner, Candidate};
pub use patterns::tokenize::{fill_implicit_spans, SpanKind, TokenSpan};
pub use pipeline::{
    NullObserver, PipelineState, ProgressObserver, RunReport, StepPipeline, StepRegistry,
};
pub use step::Step;
pub use steps::{ensure_property, PromoteSubclassStep};
