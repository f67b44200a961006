//! Run laws over realistic stores: report accounting, idempotence,
//! failure states, and cancellation leaving a whole store behind.

use crate::common::*;
use recast::{Error, PipelineState, ProgressObserver, RecordStore, Result, SchemaVersion, Step};

/// Step that advances the version and does nothing else.
struct NopStep(SchemaVersion);

impl Step for NopStep {
    fn destination(&self) -> SchemaVersion {
        self.0
    }
    fn apply(&self, store: &mut RecordStore) -> Result<()> {
        store.advance_version();
        Ok(())
    }
}

/// Step that tags every LangProject with a marker property.
struct MarkProjects(SchemaVersion);

impl Step for MarkProjects {
    fn destination(&self) -> SchemaVersion {
        self.0
    }
    fn apply(&self, store: &mut RecordStore) -> Result<()> {
        let ids: Vec<Identity> = store
            .instances_of_exact_class(&TypeName::from("LangProject"))
            .iter()
            .map(|r| r.identity())
            .collect();
        for id in ids {
            recast::ensure_property(store, id, "Marker", "<Uni>seen</Uni>")?;
        }
        store.advance_version();
        Ok(())
    }
}

fn nop_registry(range: std::ops::RangeInclusive<u32>) -> StepRegistry {
    let mut reg = StepRegistry::new();
    for v in range {
        reg.register(Box::new(NopStep(SchemaVersion(v)))).unwrap();
    }
    reg
}

#[test]
fn report_accounts_for_loaded_then_modified_records() {
    let mut store = store_at(5);
    let project = Identity::new();
    let event = Identity::new();
    store.load(form(
        "LangProject",
        project,
        None,
        &owning_property("Records", &[event]),
    ));
    store.load(form("RnEvent", event, Some(project), ""));

    let mut reg = StepRegistry::new();
    reg.register(Box::new(MarkProjects(SchemaVersion(6)))).unwrap();
    let mut pipeline = StepPipeline::new(reg);

    let report = pipeline
        .run(&mut store, SchemaVersion(6), &mut NullObserver)
        .unwrap();
    assert_eq!(report.from, SchemaVersion(5));
    assert_eq!(report.to, SchemaVersion(6));
    assert_eq!(report.steps_applied, 1);
    // Only the project was touched; loading itself stages nothing.
    assert_eq!(report.added, 0);
    assert_eq!(report.modified, 1);
    assert_eq!(report.removed, 0);
    assert!(text_of(&store, project).contains("Marker"));
}

#[test]
fn rerun_at_target_changes_nothing() {
    let mut store = store_at(5);
    let project = Identity::new();
    store.load(form("LangProject", project, None, ""));

    let mut pipeline = StepPipeline::new(nop_registry(6..=8));
    pipeline
        .run(&mut store, SchemaVersion(8), &mut NullObserver)
        .unwrap();
    let before = text_of(&store, project);

    let rerun = pipeline
        .run(&mut store, SchemaVersion(8), &mut NullObserver)
        .unwrap();
    assert_eq!(rerun.steps_applied, 0);
    assert_eq!(store.version(), SchemaVersion(8));
    assert_eq!(text_of(&store, project), before);
    assert_eq!(pipeline.state(), PipelineState::Completed);
}

#[test]
fn backward_target_is_refused_without_touching_the_store() {
    let mut store = store_at(9);
    let project = Identity::new();
    store.load(form("LangProject", project, None, ""));

    let mut pipeline = StepPipeline::new(nop_registry(6..=10));
    let err = pipeline
        .run(&mut store, SchemaVersion(7), &mut NullObserver)
        .unwrap_err();
    assert_eq!(
        err,
        Error::BackwardMigration {
            current: SchemaVersion(9),
            target: SchemaVersion(7),
        }
    );
    assert_eq!(store.version(), SchemaVersion(9));
    assert!(store.changes().is_empty());
    assert_eq!(pipeline.state(), PipelineState::Failed);
}

#[test]
fn missing_step_fails_exactly_at_the_gap() {
    let mut store = store_at(5);
    let mut reg = StepRegistry::new();
    reg.register(Box::new(NopStep(SchemaVersion(6)))).unwrap();
    reg.register(Box::new(NopStep(SchemaVersion(7)))).unwrap();
    let mut pipeline = StepPipeline::new(reg);

    let err = pipeline
        .run(&mut store, SchemaVersion(9), &mut NullObserver)
        .unwrap_err();
    assert_eq!(err, Error::UnknownVersion(SchemaVersion(8)));
    // Everything registered did run before the gap was hit.
    assert_eq!(store.version(), SchemaVersion(7));
}

#[test]
fn cancellation_leaves_the_store_at_a_step_boundary() {
    struct CancelAfter(std::cell::Cell<u32>);
    impl ProgressObserver for CancelAfter {
        fn cancel_requested(&self) -> bool {
            if self.0.get() == 0 {
                return true;
            }
            self.0.set(self.0.get() - 1);
            false
        }
    }

    let mut store = store_at(5);
    let project = Identity::new();
    store.load(form("LangProject", project, None, ""));

    let mut pipeline = StepPipeline::new(nop_registry(6..=10));
    let mut observer = CancelAfter(std::cell::Cell::new(3));
    let err = pipeline
        .run(&mut store, SchemaVersion(10), &mut observer)
        .unwrap_err();
    assert_eq!(err, Error::Cancelled);
    // Three whole steps ran; the version is an exact intermediate, never
    // between two versions.
    assert_eq!(store.version(), SchemaVersion(8));
    assert_eq!(pipeline.state(), PipelineState::Failed);
}

#[test]
fn run_report_serializes_for_the_host() {
    let mut store = store_at(5);
    let project = Identity::new();
    store.load(form("LangProject", project, None, ""));

    let mut reg = StepRegistry::new();
    reg.register(Box::new(MarkProjects(SchemaVersion(6)))).unwrap();
    let mut pipeline = StepPipeline::new(reg);
    let report = pipeline
        .run(&mut store, SchemaVersion(6), &mut NullObserver)
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["from"], 5);
    assert_eq!(json["to"], 6);
    assert_eq!(json["steps_applied"], 1);
    assert_eq!(json["modified"], 1);

    // The reconciled change set the host writes back carries full forms.
    let changes = serde_json::to_value(store.reconcile()).unwrap();
    let modified = changes["modified"].as_array().unwrap();
    assert_eq!(modified.len(), 1);
    assert!(modified[0]["form"]
        .as_str()
        .unwrap()
        .contains("Marker"));
}

#[test]
fn observer_sees_every_produced_version_in_order() {
    struct Trace(Vec<u32>);
    impl ProgressObserver for Trace {
        fn step_applied(&mut self, produced: SchemaVersion, _done: u32, _total: u32) {
            self.0.push(produced.value());
        }
    }

    let mut store = store_at(5);
    let mut pipeline = StepPipeline::new(nop_registry(6..=9));
    let mut trace = Trace(Vec::new());
    pipeline
        .run(&mut store, SchemaVersion(9), &mut trace)
        .unwrap();
    assert_eq!(trace.0, vec![6, 7, 8, 9]);
}
