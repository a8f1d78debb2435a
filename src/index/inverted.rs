//! In-memory inverted index with TF-IDF scoring
//!
//! The index owns an immutable snapshot behind a lock. Rebuilding
//! constructs a whole new snapshot off to the side and swaps it in with a
//! single assignment, so readers observe either the old or the new index,
//! never a partially built one. A reader clones the snapshot `Arc` once
//! and searches without holding the lock.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::errors::{RetrievalError, Result};
use crate::types::Document;

/// Small embedded English stopword set, applied unless overridden
const DEFAULT_STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

/// Lowercase, split on non-alphanumeric boundaries, drop stopwords
pub fn tokenize(text: &str, stopwords: &HashSet<String>) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .filter(|token| !stopwords.contains(*token))
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone)]
struct Posting {
    doc_id: String,
    term_frequency: u32,
}

/// One immutable generation of the index
#[derive(Debug, Default)]
struct IndexSnapshot {
    /// token -> postings, each sorted by doc id
    postings: HashMap<String, Vec<Posting>>,
    doc_count: usize,
}

/// Index introspection summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub document_count: usize,
    pub term_count: usize,
}

/// Keyword retriever: exact lexical matching, no embedding model involved
pub struct KeywordIndex {
    snapshot: RwLock<Option<Arc<IndexSnapshot>>>,
    stopwords: HashSet<String>,
}

impl KeywordIndex {
    /// Create an empty index with the default stopword set
    pub fn new() -> Self {
        let stopwords = DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect();
        Self::with_stopwords(stopwords)
    }

    /// Create an empty index with a custom stopword set (may be empty)
    pub fn with_stopwords(stopwords: HashSet<String>) -> Self {
        Self {
            snapshot: RwLock::new(None),
            stopwords,
        }
    }

    /// Build a fresh index over `documents`, replacing any prior index
    ///
    /// The new snapshot is constructed without holding the lock; in-flight
    /// searches keep reading the generation they started with.
    pub fn rebuild(&self, documents: &[Arc<Document>]) {
        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();

        for document in documents {
            let mut counts: HashMap<String, u32> = HashMap::new();
            for token in tokenize(&document.content, &self.stopwords) {
                *counts.entry(token).or_insert(0) += 1;
            }
            for (token, term_frequency) in counts {
                postings.entry(token).or_default().push(Posting {
                    doc_id: document.id.clone(),
                    term_frequency,
                });
            }
        }

        for list in postings.values_mut() {
            list.sort_by(|a, b| a.doc_id.cmp(&b.doc_id));
        }

        let next = Arc::new(IndexSnapshot {
            postings,
            doc_count: documents.len(),
        });

        *self.snapshot.write().unwrap() = Some(next);
    }

    /// Score = sum over shared tokens of tf * ln(1 + N/df)
    ///
    /// Ties are broken by ascending doc id so repeated runs return the
    /// same ranking. An empty or all-stopword query returns an empty list.
    pub fn search(&self, query_text: &str, top_k: usize) -> Result<Vec<(String, f32)>> {
        let snapshot = self
            .snapshot
            .read()
            .unwrap()
            .clone()
            .ok_or(RetrievalError::NotInitialized)?;

        let mut tokens = tokenize(query_text, &self.stopwords);
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        // Unique, sorted query tokens: stable float accumulation order
        tokens.sort();
        tokens.dedup();

        let corpus_size = snapshot.doc_count as f32;
        let mut scores: HashMap<String, f32> = HashMap::new();

        for token in &tokens {
            let Some(list) = snapshot.postings.get(token) else {
                continue;
            };
            let df = list.len() as f32;
            let idf = (1.0 + corpus_size / df).ln();
            for posting in list {
                *scores.entry(posting.doc_id.clone()).or_insert(0.0) +=
                    posting.term_frequency as f32 * idf;
            }
        }

        let mut ranked: Vec<(String, f32)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(top_k);

        Ok(ranked)
    }

    /// True once a build has completed
    pub fn is_built(&self) -> bool {
        self.snapshot.read().unwrap().is_some()
    }

    /// Document and distinct-term counts; zeroes before the first build
    pub fn info(&self) -> IndexInfo {
        match self.snapshot.read().unwrap().as_ref() {
            Some(snapshot) => IndexInfo {
                document_count: snapshot.doc_count,
                term_count: snapshot.postings.len(),
            },
            None => IndexInfo::default(),
        }
    }
}

impl Default for KeywordIndex {
    fn default() -> Self {
        Self::new()
    }
}
