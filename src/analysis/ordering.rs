//! Chronological ordering of a triad and its pairing with site labels.
//!
//! Within one overflight the satellite images the sites in along-track
//! order, so the earliest scene belongs to the first site of the pass's
//! `SiteSequence`, the next to the second, and so on.

use crate::analysis::groupings::{BatchGrouper, BatchMember, incomplete_batch, is_triad};
use crate::model::{BatchAssignment, BatchKey, IncompleteBatch, SiteAssignment};
use crate::sites::SiteSequence;

/// Members sorted by acquisition time. The sort is stable: members with equal
/// timestamps keep their incoming (directory-name) order.
pub fn sort_chronologically(members: &[BatchMember]) -> Vec<BatchMember> {
    let mut sorted = members.to_vec();
    sorted.sort_by_key(|m| m.timestamp);
    sorted
}

/// Pairs a complete triad with the site sequence.
///
/// Callers are expected to hand over complete batches only; anything else is
/// returned as `IncompleteBatch` without being sorted.
pub fn assign_batch(
    key: &BatchKey,
    members: &[BatchMember],
    sequence: &SiteSequence,
) -> Result<BatchAssignment, IncompleteBatch> {
    if !is_triad(members) {
        return Err(incomplete_batch(key, members));
    }

    let entries = sort_chronologically(members)
        .into_iter()
        .zip(sequence.labels())
        .map(|(member, site)| SiteAssignment::new(member.directory, site, member.timestamp))
        .collect();

    Ok(BatchAssignment {
        key: key.clone(),
        entries,
    })
}

/// Assignments for every complete batch, plus the batches that could not be
/// placed.
pub fn plan_assignments(
    grouper: &BatchGrouper,
    sequence: &SiteSequence,
) -> (Vec<BatchAssignment>, Vec<IncompleteBatch>) {
    let (complete, mut incomplete) = grouper.partition();
    let mut assignments = Vec::with_capacity(complete.len());
    for (key, members) in complete {
        match assign_batch(key, members, sequence) {
            Ok(assignment) => assignments.push(assignment),
            Err(batch) => incomplete.push(batch),
        }
    }
    (assignments, incomplete)
}
