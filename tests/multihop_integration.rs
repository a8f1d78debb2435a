//! Integration tests for the multi-hop controller
//!
//! Drives full runs against scripted adapters to pin down the dedup,
//! ordering, termination, saturation, and deadline guarantees.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hoprag::adapters::{
    AdapterError, AdapterResult, QueryGenerator, VectorHit, VectorRetriever,
};
use hoprag::config::RetrievalConfig;
use hoprag::engine::RetrievalEngine;
use hoprag::multihop::MultiHopController;
use hoprag::{Document, InMemoryDocumentStore, KeywordIndex, ScoredCandidate};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("hoprag=debug")
        .with_test_writer()
        .try_init();
}

/// Returns one scripted batch of sub-queries per call, then empty batches
struct ScriptedGenerator {
    rounds: Mutex<Vec<Vec<String>>>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    fn new(rounds: Vec<Vec<&str>>) -> Arc<Self> {
        Arc::new(Self {
            rounds: Mutex::new(
                rounds
                    .into_iter()
                    .map(|r| r.into_iter().map(String::from).collect())
                    .collect(),
            ),
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        _original_query: &str,
        _evidence_summary: &str,
        _hop_index: usize,
        _n: usize,
    ) -> AdapterResult<Vec<String>> {
        let mut rounds = self.rounds.lock().unwrap();
        self.calls.fetch_add(1, Ordering::SeqCst);
        if rounds.is_empty() {
            Ok(Vec::new())
        } else {
            Ok(rounds.remove(0))
        }
    }
}

/// Always proposes a fresh, never-seen sub-query
struct EndlessGenerator {
    calls: AtomicUsize,
}

#[async_trait]
impl QueryGenerator for EndlessGenerator {
    async fn generate(
        &self,
        _original_query: &str,
        _evidence_summary: &str,
        hop_index: usize,
        _n: usize,
    ) -> AdapterResult<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![format!("fresh topic {hop_index}")])
    }
}

struct FailingGenerator;

#[async_trait]
impl QueryGenerator for FailingGenerator {
    async fn generate(
        &self,
        _original_query: &str,
        _evidence_summary: &str,
        _hop_index: usize,
        _n: usize,
    ) -> AdapterResult<Vec<String>> {
        Err(AdapterError::Unavailable("generator offline".to_string()))
    }
}

/// Serves canned hits per exact query text
struct RoutedVectorRetriever {
    routes: HashMap<String, Vec<VectorHit>>,
}

impl RoutedVectorRetriever {
    fn new(routes: &[(&str, &[(&str, f32)])]) -> Arc<Self> {
        let routes = routes
            .iter()
            .map(|(query, hits)| {
                (
                    query.to_string(),
                    hits.iter()
                        .map(|(doc_id, score)| VectorHit {
                            doc_id: doc_id.to_string(),
                            score: *score,
                        })
                        .collect(),
                )
            })
            .collect();
        Arc::new(Self { routes })
    }

    fn empty() -> Arc<Self> {
        Arc::new(Self {
            routes: HashMap::new(),
        })
    }
}

#[async_trait]
impl VectorRetriever for RoutedVectorRetriever {
    async fn search(&self, query: &str, _top_k: usize) -> AdapterResult<Vec<VectorHit>> {
        Ok(self.routes.get(query).cloned().unwrap_or_default())
    }
}

struct SlowVectorRetriever {
    delay: Duration,
}

#[async_trait]
impl VectorRetriever for SlowVectorRetriever {
    async fn search(&self, _query: &str, _top_k: usize) -> AdapterResult<Vec<VectorHit>> {
        tokio::time::sleep(self.delay).await;
        Ok(Vec::new())
    }
}

/// Corpus with fully disjoint vocabularies per topic, so a query only
/// ever matches its own group
fn topic_store() -> Arc<InMemoryDocumentStore> {
    let store = InMemoryDocumentStore::new();
    store.insert(Document::new("alpha-1", "alpha introduction overview"));
    store.insert(Document::new("alpha-2", "alpha fundamentals primer"));
    store.insert(Document::new("beta-1", "beta migration handbook"));
    store.insert(Document::new("beta-2", "beta tuning cookbook"));
    store.insert(Document::new("gamma-1", "gamma deployment walkthrough"));
    Arc::new(store)
}

fn controller(
    store: Arc<InMemoryDocumentStore>,
    vector: Arc<dyn VectorRetriever>,
    generator: Arc<dyn QueryGenerator>,
    config: RetrievalConfig,
) -> MultiHopController {
    let index = Arc::new(KeywordIndex::new());
    index.rebuild(&store.all());
    let engine = Arc::new(
        RetrievalEngine::new(index, store, vector, None, config.clone()).unwrap(),
    );
    MultiHopController::new(engine, generator, config).unwrap()
}

fn assert_unique_ids(evidence: &[ScoredCandidate]) {
    let mut ids: Vec<&str> = evidence.iter().map(|c| c.id()).collect();
    let before = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), before, "duplicate document ids in evidence");
}

fn assert_hops_non_interleaved(evidence: &[ScoredCandidate]) {
    let hops: Vec<usize> = evidence.iter().map(|c| c.hop).collect();
    let mut sorted = hops.clone();
    sorted.sort_unstable();
    assert_eq!(hops, sorted, "hop indices interleaved in evidence");
}

#[tokio::test]
async fn test_three_hop_run_dedups_and_orders() {
    init_tracing();

    let generator = ScriptedGenerator::new(vec![
        // Hop 1: "alpha" duplicates the original and must be skipped
        vec!["beta", "alpha"],
        // Hop 2
        vec!["gamma"],
    ]);
    // The beta hop also re-surfaces alpha-1 via the vector side; dedup
    // must keep the hop-0 entry only
    let vector = RoutedVectorRetriever::new(&[("beta", &[("alpha-1", 0.9), ("beta-1", 0.8)])]);

    let controller = controller(
        topic_store(),
        vector,
        generator.clone(),
        RetrievalConfig::default(),
    );
    let evidence = controller.run("alpha").await;

    assert_unique_ids(&evidence);
    assert_hops_non_interleaved(&evidence);

    let hop_of = |id: &str| evidence.iter().find(|c| c.id() == id).map(|c| c.hop);
    assert_eq!(hop_of("alpha-1"), Some(0));
    assert_eq!(hop_of("alpha-2"), Some(0));
    assert_eq!(hop_of("beta-1"), Some(1));
    assert_eq!(hop_of("beta-2"), Some(1));
    assert_eq!(hop_of("gamma-1"), Some(2));

    // Generation ran for hop 1 and hop 2, then the hop bound ended the run
    assert_eq!(generator.call_count(), 2);
}

#[tokio::test]
async fn test_terminates_within_hop_bound_despite_endless_generation() {
    let generator = Arc::new(EndlessGenerator {
        calls: AtomicUsize::new(0),
    });
    // Every generated query finds a fresh document, so saturation never
    // triggers; only the hop bound can stop the run
    let vector = RoutedVectorRetriever::new(&[
        ("fresh topic 1", &[("beta-1", 0.9)]),
        ("fresh topic 2", &[("gamma-1", 0.9)]),
    ]);

    let controller = controller(
        topic_store(),
        vector,
        generator.clone(),
        RetrievalConfig::default(),
    );
    let evidence = controller.run("alpha").await;

    assert_unique_ids(&evidence);
    // max_hops = 2: generation for hops 1 and 2 only
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    assert!(evidence.iter().all(|c| c.hop <= 2));
}

#[tokio::test]
async fn test_saturated_hop_finalizes_early() {
    let generator = ScriptedGenerator::new(vec![
        // Hop 1 only re-finds alpha documents already in visited_ids
        vec!["alpha introduction", "alpha fundamentals"],
        // Would be hop 2; must never be requested
        vec!["beta"],
    ]);

    let controller = controller(
        topic_store(),
        RoutedVectorRetriever::empty(),
        generator.clone(),
        RetrievalConfig::default(),
    );
    let evidence = controller.run("alpha").await;

    assert_eq!(generator.call_count(), 1);
    assert!(evidence.iter().all(|c| c.hop == 0));
    assert_unique_ids(&evidence);
}

#[tokio::test]
async fn test_empty_hop_zero_still_generates() {
    let generator = ScriptedGenerator::new(vec![vec!["beta"]]);

    let controller = controller(
        topic_store(),
        RoutedVectorRetriever::empty(),
        generator.clone(),
        RetrievalConfig::default(),
    );
    // Matches nothing in the corpus at hop 0
    let evidence = controller.run("zzz unknown topic").await;

    assert!(generator.call_count() >= 1);
    assert!(!evidence.is_empty());
    assert!(evidence.iter().all(|c| c.hop == 1));
}

#[tokio::test]
async fn test_total_signal_failure_returns_empty_success() {
    let controller = controller(
        topic_store(),
        RoutedVectorRetriever::empty(),
        Arc::new(FailingGenerator),
        RetrievalConfig::default(),
    );

    let evidence = controller.run("zzz unknown topic").await;
    assert!(evidence.is_empty());
}

#[tokio::test]
async fn test_duplicate_sub_queries_issued_once() {
    let generator = ScriptedGenerator::new(vec![
        vec!["beta", "BETA", "  beta  "],
        vec!["beta"],
    ]);

    let controller = controller(
        topic_store(),
        RoutedVectorRetriever::empty(),
        generator.clone(),
        RetrievalConfig::default(),
    );
    let evidence = controller.run("alpha").await;

    assert_unique_ids(&evidence);
    // Hop 2's only proposal was already issued, so the hop had no work
    // and the run finalized
    assert_eq!(generator.call_count(), 2);
    assert!(evidence.iter().all(|c| c.hop <= 1));
}

#[tokio::test]
async fn test_overall_deadline_finalizes_early() {
    let mut config = RetrievalConfig::default();
    config.timeouts.overall_deadline_ms = 100;
    config.timeouts.per_call_ms = 5_000;

    let generator = ScriptedGenerator::new(vec![vec!["beta"]]);
    let controller = controller(
        topic_store(),
        Arc::new(SlowVectorRetriever {
            delay: Duration::from_millis(400),
        }),
        generator.clone(),
        config,
    );

    let started = std::time::Instant::now();
    let evidence = controller.run("alpha").await;
    let elapsed = started.elapsed();

    // Finalized with nothing rather than waiting out the slow adapter
    assert!(evidence.is_empty());
    assert!(elapsed < Duration::from_millis(2_000));
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn test_final_truncation_keeps_earliest_hops() {
    let mut config = RetrievalConfig::default();
    config.search.top_k = 3;

    let generator = ScriptedGenerator::new(vec![vec!["beta"], vec!["gamma"]]);
    let controller = controller(
        topic_store(),
        RoutedVectorRetriever::empty(),
        generator,
        config,
    );
    let evidence = controller.run("alpha").await;

    assert_eq!(evidence.len(), 3);
    assert_eq!(evidence[0].hop, 0);
    assert_eq!(evidence[1].hop, 0);
    assert_eq!(evidence[2].hop, 1);
    assert_hops_non_interleaved(&evidence);
}

#[test]
fn test_zero_fusion_weights_fail_at_construction() {
    let store = topic_store();
    let index = Arc::new(KeywordIndex::new());
    index.rebuild(&store.all());

    let mut config = RetrievalConfig::default();
    config.fusion.vector_weight = 0.0;
    config.fusion.keyword_weight = 0.0;

    let engine = RetrievalEngine::new(
        index,
        store,
        RoutedVectorRetriever::empty(),
        None,
        config,
    );
    assert!(matches!(
        engine.err().expect("construction should fail"),
        hoprag::RetrievalError::InvalidConfig(_)
    ));
}

#[tokio::test]
async fn test_repeated_runs_are_identical() {
    let make = || {
        let generator = ScriptedGenerator::new(vec![vec!["beta"], vec!["gamma"]]);
        controller(
            topic_store(),
            RoutedVectorRetriever::new(&[("beta", &[("beta-2", 0.7)])]),
            generator,
            RetrievalConfig::default(),
        )
    };

    let first: Vec<(String, usize)> = make()
        .run("alpha")
        .await
        .iter()
        .map(|c| (c.id().to_string(), c.hop))
        .collect();

    for _ in 0..5 {
        let again: Vec<(String, usize)> = make()
            .run("alpha")
            .await
            .iter()
            .map(|c| (c.id().to_string(), c.hop))
            .collect();
        assert_eq!(first, again);
    }
}
