//! State owned by exactly one multi-hop run
//!
//! A fresh `HopState` is created per controller invocation and dropped
//! when the run returns; it is never shared across concurrent runs.

use std::collections::{HashMap, HashSet};

use crate::types::ScoredCandidate;

/// Phases of the per-hop state machine
///
/// Explicit phases with a hop counter and a termination predicate make
/// the control flow inspectable and provably terminating: the loop bound
/// is `max_hops + 1` rounds regardless of generator behavior, and a hop
/// contributing zero new evidence also terminates early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopPhase {
    /// Ask the generator for this hop's sub-queries
    Generate,
    /// Run fusion + rerank for each pending sub-query
    Retrieve,
    /// Merge the hop's lists, drop already-seen documents, append survivors
    Deduplicate,
    /// Truncate and return (terminal)
    Finalize,
}

/// Accumulated state for one controller run
#[derive(Debug, Default)]
pub struct HopState {
    /// Document ids already surfaced in any prior hop
    pub visited_ids: HashSet<String>,
    /// Normalized forms of every query issued in this run
    pub issued_queries: HashSet<String>,
    /// Current hop number, 0-based
    pub hop_index: usize,
    /// Evidence accumulated so far, most-relevant-first within each hop
    pub evidence: Vec<ScoredCandidate>,
}

impl HopState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one completed hop into the evidence sequence
    ///
    /// Candidates seen in earlier hops are dropped. When two sub-queries
    /// of this hop surface the same document, the higher score wins and
    /// the source tags merge. Survivors are sorted by score (id as the
    /// tie-break), tagged with `hop`, and appended after all earlier-hop
    /// evidence — earlier hops are never displaced. Returns the number of
    /// new documents this hop contributed.
    pub fn absorb_hop(&mut self, lists: Vec<Vec<ScoredCandidate>>, hop: usize) -> usize {
        let mut merged: HashMap<String, ScoredCandidate> = HashMap::new();

        for candidate in lists.into_iter().flatten() {
            if self.visited_ids.contains(candidate.id()) {
                continue;
            }
            match merged.entry(candidate.id().to_string()) {
                std::collections::hash_map::Entry::Occupied(mut entry) => {
                    let existing = entry.get_mut();
                    existing.sources.merge(candidate.sources);
                    if candidate.score > existing.score {
                        existing.score = candidate.score;
                    }
                }
                std::collections::hash_map::Entry::Vacant(slot) => {
                    slot.insert(ScoredCandidate { hop, ..candidate });
                }
            }
        }

        let mut fresh: Vec<ScoredCandidate> = merged.into_values().collect();
        fresh.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.document.id.cmp(&b.document.id))
        });

        for candidate in &fresh {
            self.visited_ids.insert(candidate.id().to_string());
        }
        let added = fresh.len();
        self.evidence.extend(fresh);
        added
    }
}
