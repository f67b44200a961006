//! Ordered, gap-free step dispatch
//!
//! The pipeline owns a contiguous table of steps keyed by the version each
//! produces, validates the store's declared version, applies steps strictly
//! in order, and asserts that every step advances the version by exactly one.
//! Progress is reported and cancellation offered between steps — never
//! mid-step, because a partially-applied step is not safely abortable.

use crate::step::Step;
use recast_core::{Error, Result, SchemaVersion};
use recast_store::RecordStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Progress and cancellation callbacks for a host dialog.
///
/// Granularity is one unit per step; a step is never interrupted once
/// started.
pub trait ProgressObserver {
    /// One step finished, leaving the store at `produced`.
    fn step_applied(&mut self, produced: SchemaVersion, done: u32, total: u32) {
        let _ = (produced, done, total);
    }

    /// Polled between steps; returning true aborts the run with
    /// `Error::Cancelled`.
    fn cancel_requested(&self) -> bool {
        false
    }
}

/// Observer that ignores progress and never cancels.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl ProgressObserver for NullObserver {}

/// Contiguous table mapping produced version → step.
///
/// Registration must proceed in ascending order with no gaps; a gap is a
/// configuration error caught here, not at run time.
#[derive(Default)]
pub struct StepRegistry {
    steps: BTreeMap<SchemaVersion, Box<dyn Step>>,
}

impl StepRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the next step.
    ///
    /// The first registration fixes the table's starting version; every
    /// later one must produce exactly one more than the last registered.
    pub fn register(&mut self, step: Box<dyn Step>) -> Result<()> {
        let destination = step.destination();
        if let Some((last, _)) = self.steps.iter().next_back() {
            let expected = last.next();
            if destination != expected {
                return Err(Error::RegistrationGap {
                    expected,
                    found: destination,
                });
            }
        }
        self.steps.insert(destination, step);
        Ok(())
    }

    /// The step producing `version`, if registered.
    pub fn get(&self, version: SchemaVersion) -> Option<&dyn Step> {
        self.steps.get(&version).map(|s| s.as_ref())
    }

    /// Number of registered steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no steps are registered.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Lifecycle of one pipeline instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    /// No run has started.
    Idle,
    /// A run is in flight.
    Running,
    /// The last run finished successfully.
    Completed,
    /// The last run aborted; the store must be discarded.
    Failed,
}

/// Summary of one completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Version the store carried when the run began.
    pub from: SchemaVersion,
    /// Version the store carries now.
    pub to: SchemaVersion,
    /// Steps applied (zero when the store was already at target).
    pub steps_applied: u32,
    /// Reconciled count of records created during the run.
    pub added: usize,
    /// Reconciled count of pre-existing records modified.
    pub modified: usize,
    /// Reconciled count of pre-existing records removed.
    pub removed: usize,
}

/// Applies registered steps in order until the store reaches a target
/// version, then reconciles the store's change set.
pub struct StepPipeline {
    registry: StepRegistry,
    state: PipelineState,
}

impl StepPipeline {
    /// Create a pipeline over a validated registry.
    pub fn new(registry: StepRegistry) -> Self {
        Self {
            registry,
            state: PipelineState::Idle,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Migrate `store` to `target`, one step at a time.
    ///
    /// Succeeds immediately when the store is already at target (re-running
    /// is a no-op). Fails with `BackwardMigration` when target is behind,
    /// `UnknownVersion` when a needed step is missing, and
    /// `StepContractViolation` when a step does not leave the store at
    /// exactly the next version — fatal, never silently corrected.
    pub fn run(
        &mut self,
        store: &mut RecordStore,
        target: SchemaVersion,
        observer: &mut dyn ProgressObserver,
    ) -> Result<RunReport> {
        if self.state == PipelineState::Running {
            return Err(Error::PipelineBusy);
        }
        self.state = PipelineState::Running;
        let result = self.run_inner(store, target, observer);
        self.state = match result {
            Ok(_) => PipelineState::Completed,
            Err(_) => PipelineState::Failed,
        };
        result
    }

    fn run_inner(
        &self,
        store: &mut RecordStore,
        target: SchemaVersion,
        observer: &mut dyn ProgressObserver,
    ) -> Result<RunReport> {
        let from = store.version();
        if from == target {
            let changes = store.reconcile();
            return Ok(RunReport {
                from,
                to: target,
                steps_applied: 0,
                added: changes.added.len(),
                modified: changes.modified.len(),
                removed: changes.removed.len(),
            });
        }
        if target < from {
            return Err(Error::BackwardMigration {
                current: from,
                target,
            });
        }

        let total = target.value() - from.value();
        info!(
            target: "recast::pipeline",
            from = %from,
            to = %target,
            steps = total,
            records = store.len(),
            "migration run started"
        );

        let mut done = 0u32;
        for raw in (from.value() + 1)..=target.value() {
            let produces = SchemaVersion(raw);

            // Between steps only: the store is whole here.
            if observer.cancel_requested() {
                return Err(Error::Cancelled);
            }

            let step = self
                .registry
                .get(produces)
                .ok_or(Error::UnknownVersion(produces))?;

            let expected_start = SchemaVersion(raw - 1);
            if store.version() != expected_start {
                return Err(Error::VersionMismatch {
                    expected: expected_start,
                    actual: store.version(),
                });
            }

            debug!(
                target: "recast::pipeline",
                produces = %produces,
                step = step.description(),
                "applying step"
            );
            step.apply(store)?;

            if store.version() != produces {
                return Err(Error::StepContractViolation {
                    expected: produces,
                    actual: store.version(),
                });
            }

            done += 1;
            observer.step_applied(produces, done, total);
        }

        let changes = store.reconcile();
        info!(
            target: "recast::pipeline",
            to = %target,
            added = changes.added.len(),
            modified = changes.modified.len(),
            removed = changes.removed.len(),
            "migration run completed"
        );
        Ok(RunReport {
            from,
            to: target,
            steps_applied: done,
            added: changes.added.len(),
            modified: changes.modified.len(),
            removed: changes.removed.len(),
        })
    }
}
