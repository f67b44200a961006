//! Deterministic duplicate-candidate tie-break
//!
//! When two or more records claim the same logical position (say, two
//! annotations at one text offset in one paragraph), exactly one wins and
//! the rest are superseded. The ranking is:
//!
//! 1. category priority — the candidate's index into a small ordered list of
//!    acceptable target classes, lower is better
//! 2. having at least one inbound cross-reference from elsewhere beats
//!    having none
//! 3. identity order, so the selection is total and independent of the
//!    order candidates were discovered in
//!
//! The category-then-reference policy encodes historical heuristics whose
//! exact behavior is load-bearing for stores migrated years ago. Do not
//! refine it here; any change is a product decision.

use recast_core::Identity;

/// One record competing for a logical position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// The competing record.
    pub identity: Identity,
    /// Index into the ordered list of acceptable target classes; lower wins.
    pub category: usize,
    /// Whether any other record cross-references this one.
    pub has_inbound_ref: bool,
}

/// Select exactly one winner from a candidate set.
///
/// Total whenever the set is non-empty, and the same winner comes back for
/// any permutation of the input.
pub fn select_winner(candidates: &[Candidate]) -> Option<Identity> {
    candidates
        .iter()
        .min_by_key(|c| (c.category, !c.has_inbound_ref, c.identity))
        .map(|c| c.identity)
}
