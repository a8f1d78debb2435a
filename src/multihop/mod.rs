//! Multi-hop retrieval controller
//!
//! Answers queries that need evidence chained across retrieval rounds.
//! Each hop generates sub-queries, retrieves per sub-query through the
//! hybrid engine, deduplicates against everything already surfaced, and
//! appends survivors. The loop is bounded by `max_hops + 1` rounds and
//! exits early once a hop stops contributing new evidence.

mod state;

pub use state::{HopPhase, HopState};

use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::time::{timeout, Instant};
use tracing::{debug, warn};

use crate::adapters::QueryGenerator;
use crate::config::RetrievalConfig;
use crate::engine::RetrievalEngine;
use crate::errors::Result;
use crate::summary::EvidenceSummarizer;
use crate::types::{normalize_query, Query, ScoredCandidate};

/// Drives the Generate -> Retrieve -> Deduplicate loop for one query
pub struct MultiHopController {
    engine: Arc<RetrievalEngine>,
    generator: Arc<dyn QueryGenerator>,
    summarizer: EvidenceSummarizer,
    config: RetrievalConfig,
}

impl MultiHopController {
    /// Create a controller; configuration is validated here
    pub fn new(
        engine: Arc<RetrievalEngine>,
        generator: Arc<dyn QueryGenerator>,
        config: RetrievalConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine,
            generator,
            summarizer: EvidenceSummarizer::new(),
            config,
        })
    }

    /// Run the full multi-hop loop and return the final evidence set
    ///
    /// Hop 0 retrieves the original query itself; generation starts at
    /// hop 1. Signal failures degrade and the run keeps going; the worst
    /// outcome is an empty evidence set, which is a valid result, not an
    /// error. The overall deadline triggers an early finalize with
    /// whatever evidence completed hops have produced.
    pub async fn run(&self, original_query: &str) -> Vec<ScoredCandidate> {
        let started = Instant::now();
        let deadline = self.config.timeouts.overall_deadline();
        let per_call = self.config.timeouts.per_call();
        let max_hops = self.config.multihop.max_hops;
        let per_hop = self.config.multihop.sub_queries_per_hop;

        let mut state = HopState::new();
        state
            .issued_queries
            .insert(normalize_query(original_query));

        let mut pending: Vec<Query> = vec![Query::original(original_query)];
        let mut hop_lists: Vec<Vec<ScoredCandidate>> = Vec::new();
        let mut phase = HopPhase::Retrieve;

        loop {
            match phase {
                HopPhase::Generate => {
                    if state.hop_index > max_hops {
                        phase = HopPhase::Finalize;
                        continue;
                    }
                    let Some(remaining) = deadline.checked_sub(started.elapsed()) else {
                        warn!("overall deadline exceeded before generation, finalizing early");
                        phase = HopPhase::Finalize;
                        continue;
                    };

                    let summary = self.summarizer.summarize(&state.evidence);
                    let call_budget = per_call.min(remaining);
                    let generated = match timeout(
                        call_budget,
                        self.generator
                            .generate(original_query, &summary, state.hop_index, per_hop),
                    )
                    .await
                    {
                        Ok(Ok(queries)) => queries,
                        Ok(Err(err)) => {
                            warn!(hop = state.hop_index, %err, "generation signal degraded");
                            Vec::new()
                        }
                        Err(_) => {
                            warn!(hop = state.hop_index, "query generator timed out");
                            Vec::new()
                        }
                    };

                    pending.clear();
                    for text in generated {
                        let query = Query::sub_query(text, state.hop_index);
                        let normalized = query.normalized();
                        // A sub-query identical to the original or to one
                        // already issued in this run is wasted work
                        if normalized.is_empty() || !state.issued_queries.insert(normalized) {
                            debug!(hop = state.hop_index, query = %query.text, "skipping duplicate sub-query");
                            continue;
                        }
                        pending.push(query);
                        if pending.len() == per_hop {
                            break;
                        }
                    }

                    if pending.is_empty() {
                        debug!(hop = state.hop_index, "no new sub-queries, finalizing");
                        phase = HopPhase::Finalize;
                    } else {
                        phase = HopPhase::Retrieve;
                    }
                }

                HopPhase::Retrieve => {
                    let Some(remaining) = deadline.checked_sub(started.elapsed()) else {
                        warn!("overall deadline exceeded before retrieval, finalizing early");
                        phase = HopPhase::Finalize;
                        continue;
                    };

                    let concurrency = self.config.multihop.effective_concurrency(pending.len());
                    let queries = std::mem::take(&mut pending);
                    let hop_future = stream::iter(queries.into_iter().map(|query| {
                        let engine = Arc::clone(&self.engine);
                        async move {
                            let result = engine.retrieve(&query).await;
                            (query, result)
                        }
                    }))
                    .buffer_unordered(concurrency)
                    .collect::<Vec<_>>();

                    // The next hop only starts after every sub-query in
                    // this hop completed or timed out
                    match timeout(remaining, hop_future).await {
                        Ok(results) => {
                            hop_lists = results
                                .into_iter()
                                .filter_map(|(query, result)| match result {
                                    Ok(list) => Some(list),
                                    Err(err) => {
                                        warn!(query = %query.text, %err, "sub-query retrieval failed, dropping");
                                        None
                                    }
                                })
                                .collect();
                            phase = HopPhase::Deduplicate;
                        }
                        Err(_) => {
                            warn!(
                                hop = state.hop_index,
                                "overall deadline hit mid-hop, finalizing with prior evidence"
                            );
                            phase = HopPhase::Finalize;
                        }
                    }
                }

                HopPhase::Deduplicate => {
                    let was_original_hop = state.hop_index == 0;
                    let added = state.absorb_hop(std::mem::take(&mut hop_lists), state.hop_index);
                    debug!(
                        hop = state.hop_index,
                        added,
                        total = state.evidence.len(),
                        "hop merged"
                    );
                    state.hop_index += 1;

                    // Hop 0 always proceeds to generation even with zero
                    // candidates: later hops may succeed where it failed.
                    // Past that, a hop with nothing new means saturation.
                    phase = if state.hop_index <= max_hops && (added > 0 || was_original_hop) {
                        HopPhase::Generate
                    } else {
                        HopPhase::Finalize
                    };
                }

                HopPhase::Finalize => {
                    state.evidence.truncate(self.config.search.top_k);
                    debug!(
                        evidence = state.evidence.len(),
                        hops = state.hop_index,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "multi-hop run finalized"
                    );
                    return std::mem::take(&mut state.evidence);
                }
            }
        }
    }
}
