//! hoprag - Hybrid Multi-Hop Retrieval Engine
//!
//! Retrieves the most relevant passages from a document corpus to ground
//! an assistant's answers. An in-memory keyword index and an external
//! vector-similarity adapter each produce a ranking; fusion merges them
//! onto one normalized scale, a reranking adapter reorders the survivors,
//! and a multi-hop controller expands the query across bounded retrieval
//! rounds without looping or duplicating evidence.
//!
//! # Architecture
//!
//! - **index**: inverted keyword index with TF-IDF scoring
//! - **fusion**: min-max normalized weighted merge of the two signals
//! - **engine**: per-query retrieve -> fuse -> rerank pipeline
//! - **multihop**: sub-query generation, cross-hop dedup, bounded looping
//!
//! Embedding models, vector stores, rerank models, and answer synthesis
//! live behind the narrow traits in `adapters`.

pub mod errors;
pub mod types;
pub mod config;
pub mod ingest;
pub mod store;
pub mod index;
pub mod adapters;
pub mod fusion;
pub mod engine;
pub mod summary;
pub mod multihop;

// Re-export commonly used types
pub use errors::{Result, RetrievalError};
pub use types::{Document, Query, ScoredCandidate, SourceSet};

pub use config::RetrievalConfig;
pub use engine::RetrievalEngine;
pub use index::KeywordIndex;
pub use multihop::MultiHopController;
pub use store::{DocumentStore, InMemoryDocumentStore};
