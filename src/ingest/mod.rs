//! Document ingestion: splitting raw texts into retrievable chunks

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::types::Document;

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Characters of trailing context carried into the next chunk
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
        }
    }
}

/// Splits raw texts into overlapping chunk documents
pub struct DocumentChunker {
    config: ChunkConfig,
}

impl DocumentChunker {
    /// Create a chunker with default configuration
    pub fn new() -> Self {
        Self {
            config: ChunkConfig::default(),
        }
    }

    /// Create with custom configuration; overlap is clamped below chunk size
    pub fn with_config(mut config: ChunkConfig) -> Self {
        config.chunk_size = config.chunk_size.max(1);
        if config.chunk_overlap >= config.chunk_size {
            config.chunk_overlap = config.chunk_size / 2;
        }
        Self { config }
    }

    /// Chunk a batch of texts into immutable documents with uuid ids
    ///
    /// Each chunk carries `source`, `chunk` (index within its text), and
    /// `ingested_at` metadata.
    pub fn chunk_texts(&self, texts: &[String], source: &str) -> Vec<Document> {
        let ingested_at = Utc::now().to_rfc3339();
        let mut documents = Vec::new();

        for text in texts {
            for (chunk_index, chunk) in self.split_text(text).into_iter().enumerate() {
                let mut metadata = Map::new();
                metadata.insert("source".to_string(), Value::from(source));
                metadata.insert("chunk".to_string(), Value::from(chunk_index as u64));
                metadata.insert("ingested_at".to_string(), Value::from(ingested_at.clone()));

                documents.push(Document::with_metadata(
                    Uuid::new_v4().to_string(),
                    chunk,
                    metadata,
                ));
            }
        }

        documents
    }

    /// Split one text into overlapping windows, preferring paragraph and
    /// whitespace boundaries over mid-word cuts
    fn split_text(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return Vec::new();
        }
        if chars.len() <= self.config.chunk_size {
            let trimmed = text.trim();
            return if trimmed.is_empty() {
                Vec::new()
            } else {
                vec![trimmed.to_string()]
            };
        }

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let hard_end = (start + self.config.chunk_size).min(chars.len());
            let end = if hard_end == chars.len() {
                hard_end
            } else {
                find_break(&chars, start, hard_end)
            };

            let chunk: String = chars[start..end].iter().collect();
            let trimmed = chunk.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }

            if end == chars.len() {
                break;
            }
            // Step back by the overlap, but always make forward progress
            start = end.saturating_sub(self.config.chunk_overlap).max(start + 1);
        }

        chunks
    }
}

impl Default for DocumentChunker {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick the best break position in [start+1, hard_end]: paragraph break,
/// then line break, then space, else the hard cut
fn find_break(chars: &[char], start: usize, hard_end: usize) -> usize {
    let window = &chars[start..hard_end];

    let mut last_paragraph = None;
    let mut last_newline = None;
    let mut last_space = None;

    for (offset, pair) in window.windows(2).enumerate() {
        if pair[0] == '\n' && pair[1] == '\n' {
            last_paragraph = Some(offset + 2);
        }
    }
    for (offset, c) in window.iter().enumerate() {
        if *c == '\n' {
            last_newline = Some(offset + 1);
        } else if c.is_whitespace() {
            last_space = Some(offset + 1);
        }
    }

    let split = last_paragraph.or(last_newline).or(last_space);
    match split {
        // Ignore boundaries in the first half of the window; a tiny chunk
        // plus a huge overlap step would stall progress
        Some(offset) if offset > window.len() / 2 => start + offset,
        _ => hard_end,
    }
}
