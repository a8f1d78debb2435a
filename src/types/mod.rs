//! Core data model: documents, queries, and scored candidates

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Immutable unit of retrievable text
///
/// Created at ingestion, never mutated by retrieval. Metadata is used for
/// keyword matching and display only, never for similarity computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable unique identifier assigned at ingestion
    pub id: String,
    /// Text body
    pub content: String,
    /// Scalar metadata (source, section, timestamp, ...)
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Document {
    /// Create a document with empty metadata
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: Map::new(),
        }
    }

    /// Create a document with metadata attached
    pub fn with_metadata(
        id: impl Into<String>,
        content: impl Into<String>,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata,
        }
    }
}

/// Origin tags for a candidate
///
/// Accumulates when the same document is found via multiple paths; a
/// document never appears as two separate entries in one list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSet {
    pub vector: bool,
    pub keyword: bool,
}

impl SourceSet {
    /// Tag for a vector-similarity hit
    pub fn vector() -> Self {
        Self {
            vector: true,
            keyword: false,
        }
    }

    /// Tag for a keyword-index hit
    pub fn keyword() -> Self {
        Self {
            vector: false,
            keyword: true,
        }
    }

    /// True when both retrieval paths produced this candidate
    pub fn both(&self) -> bool {
        self.vector && self.keyword
    }

    /// Accumulate tags from another sighting of the same document
    pub fn merge(&mut self, other: SourceSet) {
        self.vector |= other.vector;
        self.keyword |= other.keyword;
    }

    /// Origin labels for logging and display
    pub fn labels(&self) -> Vec<&'static str> {
        let mut labels = Vec::new();
        if self.vector {
            labels.push("vector");
        }
        if self.keyword {
            labels.push("keyword");
        }
        labels
    }
}

/// A document plus retrieval provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    /// Shared read-only reference to the document
    pub document: Arc<Document>,
    /// Normalized relevance in [0,1] after fusion
    pub score: f32,
    /// Which retrieval paths produced this candidate
    pub sources: SourceSet,
    /// Index of the retrieval hop that first produced it (0 = original query)
    pub hop: usize,
}

impl ScoredCandidate {
    /// Id of the underlying document
    pub fn id(&self) -> &str {
        &self.document.id
    }
}

/// A single retrieval request: the original user query (hop 0) or a
/// generated sub-query (hop >= 1)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub hop: usize,
}

impl Query {
    /// The original user query, hop 0
    pub fn original(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            hop: 0,
        }
    }

    /// A generated sub-query for a later hop
    pub fn sub_query(text: impl Into<String>, hop: usize) -> Self {
        Self {
            text: text.into(),
            hop,
        }
    }

    /// Case- and whitespace-insensitive form used for duplicate detection
    pub fn normalized(&self) -> String {
        normalize_query(&self.text)
    }
}

/// Lowercase and collapse whitespace for duplicate-query comparison
pub fn normalize_query(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
