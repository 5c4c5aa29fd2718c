//! Fingerprint-based duplicate suppression across a generation run.

use std::collections::HashSet;

use crate::types::Leg;

/// Sorted canonical keys joined by `,`. Order-independent.
pub fn fingerprint(legs: &[Leg]) -> String {
    let mut keys: Vec<String> = legs.iter().map(Leg::key).collect();
    keys.sort();
    keys.join(",")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupOutcome {
    /// New combination; recorded.
    Fresh,
    /// Already persisted for the target date. Counts toward the tier target
    /// so a rerun stops where the first run stopped.
    Persisted,
    /// Produced earlier in this run. Does not count.
    RunDuplicate,
}

#[derive(Debug, Default)]
pub struct Deduplicator {
    persisted: HashSet<String>,
    run: HashSet<String>,
}

impl Deduplicator {
    /// Seed with fingerprints already persisted for the target date.
    pub fn seeded<I>(persisted: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            persisted: persisted.into_iter().collect(),
            run: HashSet::new(),
        }
    }

    pub fn admit(&mut self, fingerprint: &str) -> DedupOutcome {
        if self.run.contains(fingerprint) {
            return DedupOutcome::RunDuplicate;
        }
        if self.persisted.contains(fingerprint) {
            // Seen once this run; a second copy is a run duplicate.
            self.run.insert(fingerprint.to_string());
            return DedupOutcome::Persisted;
        }
        self.run.insert(fingerprint.to_string());
        DedupOutcome::Fresh
    }

    pub fn persisted_count(&self) -> usize {
        self.persisted.len()
    }

    /// Fingerprints accepted this run (fresh or matched against history).
    pub fn run_count(&self) -> usize {
        self.run.len()
    }
}
