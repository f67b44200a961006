//! The canonical migration shapes, end to end: subclass promotion through
//! the pipeline, owner-deletion cascade repaired by the sweep, duplicate
//! resolution with the deterministic tie-break, and paragraph span
//! reconstruction inside a step.

use crate::common::*;
use recast::scan::{find_element, inner};
use recast::{
    fill_implicit_spans, select_winner, Candidate, Error, PromoteSubclassStep, RecordStore, Result,
    SchemaVersion, SpanKind, Step,
};
use std::collections::BTreeMap;

// ============================================================================
// Subclass promotion
// ============================================================================

#[test]
fn subclass_promotion_runs_through_the_pipeline() {
    let mut store = store_at(5);
    let project = Identity::new();
    let event = Identity::new();
    store.load(form(
        "LangProject",
        project,
        None,
        &owning_property("Records", &[event]),
    ));
    store.load(form(
        "RnEvent",
        event,
        Some(project),
        "<Foo><Uni>bar</Uni></Foo>",
    ));

    let mut registry = StepRegistry::new();
    registry
        .register(Box::new(
            PromoteSubclassStep::new(SchemaVersion(6), "RnEvent", "RnGenericRec")
                .seeding_property("Status", "<Uni>converted</Uni>"),
        ))
        .unwrap();
    let mut pipeline = StepPipeline::new(registry);
    let report = pipeline
        .run(&mut store, SchemaVersion(6), &mut NullObserver)
        .unwrap();

    assert_eq!(report.modified, 1);
    let record = store.get(event).unwrap();
    assert_eq!(record.type_name(), &TypeName::from("RnGenericRec"));
    let text = text_of(&store, event);
    assert!(text.contains("class=\"RnGenericRec\""));
    assert!(text.contains("bar"));
    assert!(text.contains("converted"));

    // Index buckets moved with the class; ownership is untouched.
    assert!(store
        .instances_of_exact_class(&TypeName::from("RnEvent"))
        .is_empty());
    assert_eq!(
        store
            .instances_of_exact_class(&TypeName::from("RnGenericRec"))
            .len(),
        1
    );
    assert_eq!(store.owner(event).unwrap().identity(), project);
    assert_graph_consistent(&store);
}

// ============================================================================
// Owner-deletion cascade
// ============================================================================

/// Step that drops every RnEvent outright, then sweeps up the wreckage.
struct DropEvents(SchemaVersion);

impl Step for DropEvents {
    fn destination(&self) -> SchemaVersion {
        self.0
    }
    fn apply(&self, store: &mut RecordStore) -> Result<()> {
        let ids: Vec<Identity> = store
            .instances_of_exact_class(&TypeName::from("RnEvent"))
            .iter()
            .map(|r| r.identity())
            .collect();
        for id in ids {
            store.remove(id)?;
        }
        IntegrityStep::with_baseline_allow_list().sweep(store);
        store.advance_version();
        Ok(())
    }
}

#[test]
fn deleting_an_owner_cascades_to_its_whole_subtree() {
    let mut store = store_at(7);
    let project = Identity::new();
    let event = Identity::new();
    let sub_a = Identity::new();
    let sub_b = Identity::new();
    let bystander = Identity::new();

    store.load(form(
        "LangProject",
        project,
        None,
        &format!(
            "{}{}",
            owning_property("Records", &[event]),
            owning_property("Analyses", &[bystander]),
        ),
    ));
    store.load(form(
        "RnEvent",
        event,
        Some(project),
        &owning_property("SubRecords", &[sub_a, sub_b]),
    ));
    store.load(form("RnAnalysis", sub_a, Some(event), ""));
    store.load(form("RnAnalysis", sub_b, Some(event), ""));
    store.load(form(
        "RnAnalysis",
        bystander,
        Some(project),
        &reference_property("SeeAlso", &[sub_a]),
    ));

    let mut registry = StepRegistry::new();
    registry.register(Box::new(DropEvents(SchemaVersion(8)))).unwrap();
    let mut pipeline = StepPipeline::new(registry);
    let report = pipeline
        .run(&mut store, SchemaVersion(8), &mut NullObserver)
        .unwrap();

    // The event and both sub-records are gone; the bystander survives with
    // its dangling cross-reference spliced out.
    assert_eq!(report.removed, 3);
    assert!(!store.contains(event));
    assert!(!store.contains(sub_a));
    assert!(!store.contains(sub_b));
    assert!(store.contains(bystander));
    assert!(!text_of(&store, bystander).contains("SeeAlso"));

    // The project no longer claims the event.
    let project_text = text_of(&store, project);
    assert!(!project_text.contains("Records"));
    assert!(project_text.contains("Analyses"));
    assert_graph_consistent(&store);
}

// ============================================================================
// Duplicate resolution
// ============================================================================

#[test]
fn duplicate_resolution_is_deterministic_and_repairs_references() {
    let mut store = store_at(7);
    let project = Identity::new();
    let preferred = Identity::new();
    let duplicate = Identity::new();
    let referrer = Identity::new();

    store.load(form(
        "LangProject",
        project,
        None,
        &format!(
            "{}{}",
            owning_property("Records", &[preferred, duplicate]),
            owning_property("Analyses", &[referrer]),
        ),
    ));
    // RnAnalysis is the preferred class for the role; RnGenericRec a
    // fallback. Only the preferred one is cross-referenced.
    store.load(form("RnAnalysis", preferred, Some(project), ""));
    store.load(form("RnGenericRec", duplicate, Some(project), ""));
    store.load(form(
        "RnAnalysis",
        referrer,
        Some(project),
        &reference_property("SeeAlso", &[preferred]),
    ));

    let candidates = vec![
        Candidate {
            identity: preferred,
            category: 0,
            has_inbound_ref: true,
        },
        Candidate {
            identity: duplicate,
            category: 1,
            has_inbound_ref: false,
        },
    ];
    let winner = select_winner(&candidates).unwrap();
    assert_eq!(winner, preferred);

    // Presentation order never changes the outcome.
    let reversed: Vec<Candidate> = candidates.iter().rev().copied().collect();
    assert_eq!(select_winner(&reversed), Some(preferred));

    // Retire the loser; the sweep clears the owner's stale pointer.
    store.remove(duplicate).unwrap();
    IntegrityStep::with_baseline_allow_list().sweep(&mut store);

    assert!(store.contains(preferred));
    assert!(!store.contains(duplicate));
    let project_text = text_of(&store, project);
    assert!(project_text.contains(&preferred.to_string()));
    assert!(!project_text.contains(&duplicate.to_string()));
    assert!(text_of(&store, referrer).contains(&preferred.to_string()));
    assert_graph_consistent(&store);
}

proptest::proptest! {
    // Rotating the candidate list never changes the winner.
    #[test]
    fn tiebreak_is_independent_of_candidate_order(
        profiles in proptest::collection::vec((0usize..3, proptest::bool::ANY), 1..8),
        rotation in 0usize..8,
    ) {
        let candidates: Vec<Candidate> = profiles
            .iter()
            .map(|(category, inbound)| Candidate {
                identity: Identity::new(),
                category: *category,
                has_inbound_ref: *inbound,
            })
            .collect();
        let mut rotated = candidates.clone();
        let split = rotation % candidates.len();
        rotated.rotate_left(split);
        proptest::prop_assert_eq!(select_winner(&candidates), select_winner(&rotated));
    }
}

#[test]
fn equal_candidates_fall_back_to_identity_order() {
    let a = Identity::new();
    let b = Identity::new();
    let low = a.min(b);
    let candidates = vec![
        Candidate {
            identity: a,
            category: 0,
            has_inbound_ref: false,
        },
        Candidate {
            identity: b,
            category: 0,
            has_inbound_ref: false,
        },
    ];
    assert_eq!(select_winner(&candidates), Some(low));
    assert!(select_winner(&[]).is_none());
}

// ============================================================================
// Paragraph span reconstruction
// ============================================================================

/// Step that gives every paragraph a full token-span property, keeping any
/// spans the paragraph already carries.
struct ReconstructSpans(SchemaVersion);

impl Step for ReconstructSpans {
    fn destination(&self) -> SchemaVersion {
        self.0
    }
    fn apply(&self, store: &mut RecordStore) -> Result<()> {
        let ids: Vec<Identity> = store
            .instances_of_exact_class(&TypeName::from("StTxtPara"))
            .iter()
            .map(|r| r.identity())
            .collect();
        for id in ids {
            let record = store.get(id)?;
            let Some(text) = paragraph_text(record) else {
                continue;
            };
            let explicit = explicit_spans(record);
            let rendered: String = fill_implicit_spans(&text, &explicit)
                .into_iter()
                .map(|s| {
                    let kind = match s.kind {
                        SpanKind::Word => "word",
                        SpanKind::Punctuation => "punct",
                    };
                    format!(
                        "<Span begin=\"{}\" end=\"{}\" kind=\"{kind}\"/>",
                        s.begin, s.end
                    )
                })
                .collect();
            recast::ensure_property(store, id, "ImplicitSpans", &rendered)?;
        }
        store.advance_version();
        Ok(())
    }
}

/// The paragraph's text content, from `<Contents><Uni>...</Uni></Contents>`.
fn paragraph_text(record: &Record) -> Option<String> {
    let span = record.property_span("Contents")?;
    let uni = find_element(record.form(), "Uni", span.open_end..span.end)?;
    Some(String::from_utf8_lossy(inner(record.form(), &uni)).into_owned())
}

/// Pre-existing spans, from `<Spans><Span begin=".." end=".."/>...</Spans>`.
fn explicit_spans(record: &Record) -> BTreeMap<usize, usize> {
    let mut out = BTreeMap::new();
    let Some(span) = record.property_span("Spans") else {
        return out;
    };
    let buf = record.form();
    let mut at = span.open_end;
    while let Some(found) = find_element(buf, "Span", at..span.end) {
        at = found.end;
        let begin = recast::scan::attribute(buf, &found, "begin")
            .and_then(|v| v.parse::<usize>().ok());
        let end = recast::scan::attribute(buf, &found, "end")
            .and_then(|v| v.parse::<usize>().ok());
        if let (Some(b), Some(e)) = (begin, end) {
            if e > b {
                out.insert(b, e - b);
            }
        }
    }
    out
}

#[test]
fn span_reconstruction_fills_around_existing_spans() {
    let mut store = store_at(7);
    let project = Identity::new();
    let para = Identity::new();
    store.load(form(
        "LangProject",
        project,
        None,
        &owning_property("Texts", &[para]),
    ));
    // "He" at 0..2 already carries a span; the rest of "He said, go!" does
    // not.
    store.load(form(
        "StTxtPara",
        para,
        Some(project),
        "<Contents><Uni>He said, go!</Uni></Contents>\
         <Spans><Span begin=\"0\" end=\"2\"/></Spans>",
    ));

    let mut registry = StepRegistry::new();
    registry
        .register(Box::new(ReconstructSpans(SchemaVersion(8))))
        .unwrap();
    let mut pipeline = StepPipeline::new(registry);
    pipeline
        .run(&mut store, SchemaVersion(8), &mut NullObserver)
        .unwrap();

    let text = text_of(&store, para);
    // The explicit span over "He" is untouched and not duplicated.
    assert!(text.contains("<Span begin=\"0\" end=\"2\"/>"));
    assert!(!text.contains("<Span begin=\"0\" end=\"2\" kind"));
    // "said" ",", "go" "!" were reconstructed.
    assert!(text.contains("<Span begin=\"3\" end=\"7\" kind=\"word\"/>"));
    assert!(text.contains("<Span begin=\"7\" end=\"8\" kind=\"punct\"/>"));
    assert!(text.contains("<Span begin=\"9\" end=\"11\" kind=\"word\"/>"));
    assert!(text.contains("<Span begin=\"11\" end=\"12\" kind=\"punct\"/>"));
}

#[test]
fn span_reconstruction_is_idempotent_via_ensure_property() {
    let mut store = store_at(7);
    let project = Identity::new();
    let para = Identity::new();
    store.load(form(
        "LangProject",
        project,
        None,
        &owning_property("Texts", &[para]),
    ));
    store.load(form(
        "StTxtPara",
        para,
        Some(project),
        "<Contents><Uni>one two</Uni></Contents>",
    ));

    let step = ReconstructSpans(SchemaVersion(8));
    step.apply(&mut store).unwrap();
    let after_first = text_of(&store, para);
    // Applying again finds ImplicitSpans already present and leaves the
    // form alone.
    let step = ReconstructSpans(SchemaVersion(9));
    step.apply(&mut store).unwrap();
    assert_eq!(text_of(&store, para), after_first);
}

#[test]
fn removing_a_missing_duplicate_is_reported() {
    let mut store = store_at(7);
    let ghost = Identity::new();
    assert_eq!(store.remove(ghost).unwrap_err(), Error::NotFound(ghost));
}
