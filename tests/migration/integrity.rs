//! Delint sweep over mixed stores: every inconsistency class repaired in
//! one pass, the consistency invariants holding afterward, and the sweep
//! itself idempotent.

use crate::common::*;
use recast::{OwnerlessAllowList, SchemaVersion};

/// A store mixing every kind of damage the sweep repairs:
/// - a healthy project/event pair
/// - a zombie claiming a missing owner, with an owned grandchild
/// - a stray ownerless record outside the allow-list
/// - a dangling reference pointer and an emptied reference property
/// - hollow property residue
fn damaged_store() -> (RecordStore, Identity, Identity) {
    let mut store = store_at(7);
    let project = Identity::new();
    let event = Identity::new();
    let ghost = Identity::new();
    let zombie = Identity::new();
    let grandchild = Identity::new();
    let stray = Identity::new();
    let gone = Identity::new();

    let project_body = format!(
        "{}{}<Notes></Notes>",
        owning_property("Records", &[event]),
        reference_property("SeeAlso", &[gone]),
    );
    store.load(form("LangProject", project, None, &project_body));

    let event_body = format!(
        "<Participants><objsur t=\"r\" guid=\"{project}\"/><objsur t=\"r\" guid=\"{gone}\"/></Participants>"
    );
    store.load(form("RnEvent", event, Some(project), &event_body));

    store.load(form(
        "RnEvent",
        zombie,
        Some(ghost),
        &owning_property("SubRecords", &[grandchild]),
    ));
    store.load(form("RnAnalysis", grandchild, Some(zombie), ""));
    store.load(form("StTxtPara", stray, None, ""));

    (store, project, event)
}

#[test]
fn one_sweep_repairs_every_inconsistency() {
    let (mut store, project, event) = damaged_store();

    let report = IntegrityStep::with_baseline_allow_list().sweep(&mut store);

    // Zombie, its grandchild, and the stray are gone.
    assert_eq!(report.zombies_removed, 3);
    // The project's SeeAlso pointer and the event's dead Participants
    // pointer both dangled.
    assert_eq!(report.dangling_refs_removed, 2);
    // SeeAlso collapsed with its last pointer; Notes was hollow residue.
    assert_eq!(report.properties_pruned, 2);

    assert_eq!(store.len(), 2);
    assert!(store.contains(project));
    assert!(store.contains(event));

    let event_text = text_of(&store, event);
    assert!(event_text.contains(&project.to_string()));
    assert!(event_text.contains("Participants"));

    assert_graph_consistent(&store);
}

#[test]
fn sweeping_a_repaired_store_is_a_no_op() {
    let (mut store, _, _) = damaged_store();
    let step = IntegrityStep::with_baseline_allow_list();
    assert!(!step.sweep(&mut store).is_clean());

    let forms_before: Vec<String> = store
        .identities()
        .into_iter()
        .map(|id| text_of(&store, id))
        .collect();
    let second = step.sweep(&mut store);
    assert!(second.is_clean());
    let forms_after: Vec<String> = store
        .identities()
        .into_iter()
        .map(|id| text_of(&store, id))
        .collect();
    assert_eq!(forms_before, forms_after);
}

#[test]
fn extended_allow_list_spares_newly_rootable_classes() {
    let mut store = store_at(9);
    let annotation = Identity::new();
    store.load(form("CmAnnotation", annotation, None, ""));

    // At version 9 annotations may live at the root; at 7 they may not.
    let allow = OwnerlessAllowList::baseline().allow("CmAnnotation", SchemaVersion(9));
    let report = IntegrityStep::new(allow.clone()).sweep(&mut store);
    assert!(report.is_clean());
    assert!(store.contains(annotation));

    let mut older = store_at(7);
    older.load(form("CmAnnotation", Identity::new(), None, ""));
    let report = IntegrityStep::new(allow).sweep(&mut older);
    assert_eq!(report.zombies_removed, 1);
    assert!(older.is_empty());
}

#[test]
fn removals_reach_the_reconciled_change_set() {
    let (mut store, _, _) = damaged_store();
    IntegrityStep::with_baseline_allow_list().sweep(&mut store);

    let changes = store.reconcile();
    assert_eq!(changes.removed.len(), 3);
    // The two records whose forms were spliced come back as modified.
    assert_eq!(changes.modified.len(), 2);
    assert!(changes.added.is_empty());
}
