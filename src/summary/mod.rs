//! Evidence summary assembly for query generation
//!
//! The multi-hop controller hands the generator a compact view of what has
//! already been found so new sub-queries explore uncovered ground instead
//! of re-asking for known evidence. This never feeds answer synthesis.

use serde::{Deserialize, Serialize};

use crate::types::ScoredCandidate;

/// Summary sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Overall character budget for the summary
    pub max_chars: usize,
    /// Per-document content prefix length
    pub per_doc_chars: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_chars: 1200,
            per_doc_chars: 200,
        }
    }
}

/// Renders accumulated evidence into a bounded numbered digest
pub struct EvidenceSummarizer {
    config: SummaryConfig,
}

impl EvidenceSummarizer {
    pub fn new() -> Self {
        Self {
            config: SummaryConfig::default(),
        }
    }

    pub fn with_config(config: SummaryConfig) -> Self {
        Self { config }
    }

    /// Build the summary string; empty evidence yields an empty string
    pub fn summarize(&self, evidence: &[ScoredCandidate]) -> String {
        let mut parts: Vec<String> = Vec::new();
        let mut used = 0;

        for (index, candidate) in evidence.iter().enumerate() {
            let prefix: String = candidate
                .document
                .content
                .chars()
                .take(self.config.per_doc_chars)
                .collect();
            let entry = format!(
                "[{}] (hop {}, score {:.2}) {}",
                index + 1,
                candidate.hop,
                candidate.score,
                prefix.trim()
            );

            if used + entry.len() > self.config.max_chars && !parts.is_empty() {
                break;
            }
            used += entry.len();
            parts.push(entry);
        }

        parts.join("\n")
    }
}

impl Default for EvidenceSummarizer {
    fn default() -> Self {
        Self::new()
    }
}
