//! Hybrid fusion: merging two independently-scaled rankings into one
//!
//! Vector cosine similarities and lexical TF-IDF sums live on unrelated
//! scales, so each list is min-max normalized within itself before the
//! weighted merge. Fusing raw scores would let one signal dominate
//! arbitrarily.

use std::collections::HashMap;
use tracing::warn;

use crate::adapters::VectorHit;
use crate::store::DocumentStore;
use crate::types::{ScoredCandidate, SourceSet};

/// Min-max normalize into [0,1]; a list with no score spread maps every
/// member to 1.0 (avoids division by zero, keeps single-hit lists useful)
pub(crate) fn min_max_normalize(scores: &[f32]) -> Vec<f32> {
    if scores.is_empty() {
        return Vec::new();
    }

    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for score in scores {
        min = min.min(*score);
        max = max.max(*score);
    }

    let spread = max - min;
    if spread <= f32::EPSILON {
        return vec![1.0; scores.len()];
    }

    scores.iter().map(|s| (s - min) / spread).collect()
}

#[derive(Default)]
struct PartialScores {
    vector: Option<f32>,
    keyword: Option<f32>,
}

/// Fuse keyword and vector rankings for one query into a single list
///
/// Candidates are sorted by fused score descending; ties prefer documents
/// present in both lists, then lower doc id. Ids the store cannot resolve
/// are dropped and logged. The result is truncated to `top_k`.
pub fn fuse(
    keyword: &[(String, f32)],
    vector: &[VectorHit],
    weights: (f32, f32),
    hop: usize,
    top_k: usize,
    store: &dyn DocumentStore,
) -> Vec<ScoredCandidate> {
    let (w_vector, w_keyword) = weights;

    let keyword_norm = min_max_normalize(&keyword.iter().map(|(_, s)| *s).collect::<Vec<_>>());
    let vector_norm = min_max_normalize(&vector.iter().map(|h| h.score).collect::<Vec<_>>());

    let mut merged: HashMap<&str, PartialScores> = HashMap::new();
    for ((doc_id, _), norm) in keyword.iter().zip(&keyword_norm) {
        merged.entry(doc_id).or_default().keyword = Some(*norm);
    }
    for (hit, norm) in vector.iter().zip(&vector_norm) {
        merged.entry(&hit.doc_id).or_default().vector = Some(*norm);
    }

    let mut candidates: Vec<ScoredCandidate> = Vec::with_capacity(merged.len());
    for (doc_id, partial) in merged {
        let Some(document) = store.resolve(doc_id) else {
            warn!(doc_id, "dropping candidate: id not resolvable in store");
            continue;
        };

        let score =
            w_vector * partial.vector.unwrap_or(0.0) + w_keyword * partial.keyword.unwrap_or(0.0);
        let sources = SourceSet {
            vector: partial.vector.is_some(),
            keyword: partial.keyword.is_some(),
        };

        candidates.push(ScoredCandidate {
            document,
            score,
            sources,
            hop,
        });
    }

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.sources.both().cmp(&a.sources.both()))
            .then_with(|| a.document.id.cmp(&b.document.id))
    });
    candidates.truncate(top_k);

    candidates
}
