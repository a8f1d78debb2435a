//! Per-query retrieval pipeline: keyword + vector -> fusion -> rerank
//!
//! The keyword index is a pure in-memory read and never blocks; the
//! vector and rerank adapters are the only calls that may be remote, and
//! each runs under its own timeout. An adapter failure degrades that one
//! signal and the pipeline continues.

use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::adapters::{Reranker, VectorRetriever};
use crate::config::RetrievalConfig;
use crate::errors::Result;
use crate::fusion;
use crate::index::{IndexInfo, KeywordIndex};
use crate::store::DocumentStore;
use crate::types::{Document, Query, ScoredCandidate};

/// Hybrid retrieval engine for a single query
pub struct RetrievalEngine {
    index: Arc<KeywordIndex>,
    store: Arc<dyn DocumentStore>,
    vector: Arc<dyn VectorRetriever>,
    reranker: Option<Arc<dyn Reranker>>,
    config: RetrievalConfig,
}

impl RetrievalEngine {
    /// Create an engine; configuration is validated here, not at query time
    pub fn new(
        index: Arc<KeywordIndex>,
        store: Arc<dyn DocumentStore>,
        vector: Arc<dyn VectorRetriever>,
        reranker: Option<Arc<dyn Reranker>>,
        config: RetrievalConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            index,
            store,
            vector,
            reranker,
            config,
        })
    }

    /// Retrieve a fused, reranked candidate list for one query
    pub async fn retrieve(&self, query: &Query) -> Result<Vec<ScoredCandidate>> {
        self.retrieve_top(query, self.config.search.top_k).await
    }

    /// Retrieve with an explicit result count
    pub async fn retrieve_top(&self, query: &Query, top_k: usize) -> Result<Vec<ScoredCandidate>> {
        let fetch = top_k.saturating_mul(self.config.fusion.overfetch_factor);
        let per_call = self.config.timeouts.per_call();

        let vector_call = timeout(per_call, self.vector.search(&query.text, fetch));
        let keyword = self.index.search(&query.text, fetch)?;

        let vector = match vector_call.await {
            Ok(Ok(hits)) => hits,
            Ok(Err(err)) => {
                warn!(query = %query.text, %err, "vector signal degraded, continuing keyword-only");
                Vec::new()
            }
            Err(_) => {
                warn!(
                    query = %query.text,
                    timeout_ms = per_call.as_millis() as u64,
                    "vector adapter timed out, continuing keyword-only"
                );
                Vec::new()
            }
        };

        debug!(
            query = %query.text,
            keyword_hits = keyword.len(),
            vector_hits = vector.len(),
            "fusing candidate lists"
        );

        let mut candidates = fusion::fuse(
            &keyword,
            &vector,
            self.config.fusion.normalized_weights(),
            query.hop,
            top_k,
            self.store.as_ref(),
        );

        if let Some(reranker) = &self.reranker {
            self.apply_rerank(reranker, query, &mut candidates).await;
        }

        Ok(candidates)
    }

    /// Resort candidates by adapter relevance scores
    ///
    /// The adapter's ordering fully overrides fusion order; each
    /// candidate's score becomes its within-call normalized rerank score
    /// so later within-hop sorting still works on a [0,1] scale. Sources
    /// and hop tags are untouched. Any failure keeps the fusion order.
    async fn apply_rerank(
        &self,
        reranker: &Arc<dyn Reranker>,
        query: &Query,
        candidates: &mut Vec<ScoredCandidate>,
    ) {
        if candidates.is_empty() {
            return;
        }

        let per_call = self.config.timeouts.per_call();
        let docs: Vec<Arc<Document>> = candidates.iter().map(|c| c.document.clone()).collect();

        let scores = match timeout(per_call, reranker.score(&query.text, &docs)).await {
            Ok(Ok(scores)) if scores.len() == candidates.len() => scores,
            Ok(Ok(scores)) => {
                warn!(
                    expected = candidates.len(),
                    got = scores.len(),
                    "reranker broke the length contract, keeping fusion order"
                );
                return;
            }
            Ok(Err(err)) => {
                warn!(query = %query.text, %err, "rerank signal degraded, keeping fusion order");
                return;
            }
            Err(_) => {
                warn!(
                    query = %query.text,
                    timeout_ms = per_call.as_millis() as u64,
                    "reranker timed out, keeping fusion order"
                );
                return;
            }
        };

        let normalized = fusion::min_max_normalize(&scores);
        for (candidate, score) in candidates.iter_mut().zip(&normalized) {
            candidate.score = *score;
        }
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.document.id.cmp(&b.document.id))
        });
    }

    /// Introspection over the keyword index
    pub fn index_info(&self) -> IndexInfo {
        self.index.info()
    }

    /// Current configuration
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }
}
