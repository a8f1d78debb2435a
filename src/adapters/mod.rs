//! Boundary contracts for external retrieval collaborators
//!
//! The engine treats every adapter as a pure request/response boundary.
//! Failures are explicit result variants, never panics: an `Err` here
//! means that one signal degrades for the current call, not that the
//! whole retrieval aborts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::types::Document;

pub mod http;

pub use http::{HttpReranker, HttpVectorRetriever, OllamaQueryGenerator};

/// Failure modes any adapter may report
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// The backing service rejected the call or is unreachable
    #[error("adapter unavailable: {0}")]
    Unavailable(String),

    /// The call exceeded its timeout
    #[error("adapter call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Result type alias for adapter calls
pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

/// One hit from the vector similarity index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorHit {
    pub doc_id: String,
    /// Similarity in [0,1], higher = more similar
    pub score: f32,
}

/// Vector-similarity retrieval, backed externally
#[async_trait]
pub trait VectorRetriever: Send + Sync {
    /// Nearest-neighbour candidates for a query text
    ///
    /// "No results" is `Ok(vec![])`, never an error. Only identity and
    /// score are guaranteed; ids are hydrated through the document store.
    async fn search(&self, query_text: &str, top_k: usize) -> AdapterResult<Vec<VectorHit>>;
}

/// Pairwise query-document relevance scoring, backed externally
#[async_trait]
pub trait Reranker: Send + Sync {
    /// One score per candidate, same order as the input
    ///
    /// Scores only order candidates within this one call; they are never
    /// comparable across calls.
    async fn score(&self, query_text: &str, docs: &[Arc<Document>]) -> AdapterResult<Vec<f32>>;
}

/// Sub-query generation for multi-hop retrieval, backed externally
#[async_trait]
pub trait QueryGenerator: Send + Sync {
    /// Up to `n` sub-queries for the next hop; may return fewer, including none
    async fn generate(
        &self,
        original_query: &str,
        evidence_summary: &str,
        hop_index: usize,
        n: usize,
    ) -> AdapterResult<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_display() {
        let err = AdapterError::Unavailable("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_timeout_display() {
        let err = AdapterError::Timeout { timeout_ms: 5000 };
        assert!(err.to_string().contains("5000"));
    }

    #[test]
    fn test_vector_hit_deserialization() {
        let hit: VectorHit = serde_json::from_str(r#"{"doc_id": "d1", "score": 0.9}"#).unwrap();
        assert_eq!(hit.doc_id, "d1");
        assert!((hit.score - 0.9).abs() < f32::EPSILON);
    }
}
