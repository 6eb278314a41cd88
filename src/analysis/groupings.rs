//! Batch grouping: clusters scanned directories into overflights.
//!
//! Every qualifying image file contributes one `(directory, key, timestamp)`
//! entry. Entries sharing a `BatchKey` came from the same pass. Members are
//! kept in directory-name order so the result does not depend on the order
//! in which discoveries arrive.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{BatchKey, CandidateDirectory, ImageTimestamp, IncompleteBatch, TRIAD_SIZE};

/// One directory's contribution to a batch.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BatchMember {
    pub directory: CandidateDirectory,
    pub timestamp: ImageTimestamp,
}

/// Accumulates batch members for one run.
///
/// Owned by the orchestrator and dropped with it; nothing is shared between
/// runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchGrouper {
    batches: BTreeMap<BatchKey, Vec<BatchMember>>,
}

impl BatchGrouper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one discovered image.
    pub fn add(&mut self, directory: CandidateDirectory, key: BatchKey, timestamp: ImageTimestamp) {
        let member = BatchMember { directory, timestamp };
        let members = self.batches.entry(key).or_default();
        let at = members.partition_point(|m| *m <= member);
        members.insert(at, member);
    }

    /// Batches in key order.
    pub fn batches(&self) -> impl Iterator<Item = (&BatchKey, &[BatchMember])> {
        self.batches.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn get(&self, key: &BatchKey) -> Option<&[BatchMember]> {
        self.batches.get(key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Splits batches into complete triads and incomplete ones.
    pub fn partition(&self) -> (Vec<(&BatchKey, &[BatchMember])>, Vec<IncompleteBatch>) {
        let mut complete = Vec::new();
        let mut incomplete = Vec::new();
        for (key, members) in self.batches() {
            if is_triad(members) {
                complete.push((key, members));
            } else {
                incomplete.push(incomplete_batch(key, members));
            }
        }
        (complete, incomplete)
    }
}

/// Exactly three members from three different directories.
pub fn is_triad(members: &[BatchMember]) -> bool {
    members.len() == TRIAD_SIZE && distinct_directories(members).len() == TRIAD_SIZE
}

fn distinct_directories(members: &[BatchMember]) -> BTreeSet<&str> {
    members.iter().map(|m| m.directory.name.as_str()).collect()
}

/// Report for a batch that `is_triad` rejects.
pub fn incomplete_batch(key: &BatchKey, members: &[BatchMember]) -> IncompleteBatch {
    let directories = distinct_directories(members);
    IncompleteBatch {
        key: key.clone(),
        count: directories.len(),
        images: members.len(),
        members: directories.into_iter().map(String::from).collect(),
    }
}

impl Extend<(CandidateDirectory, BatchKey, ImageTimestamp)> for BatchGrouper {
    fn extend<I: IntoIterator<Item = (CandidateDirectory, BatchKey, ImageTimestamp)>>(&mut self, iter: I) {
        for (directory, key, timestamp) in iter {
            self.add(directory, key, timestamp);
        }
    }
}

impl FromIterator<(CandidateDirectory, BatchKey, ImageTimestamp)> for BatchGrouper {
    fn from_iter<I: IntoIterator<Item = (CandidateDirectory, BatchKey, ImageTimestamp)>>(iter: I) -> Self {
        let mut grouper = BatchGrouper::new();
        grouper.extend(iter);
        grouper
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
