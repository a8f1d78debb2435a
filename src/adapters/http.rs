//! Reference HTTP implementations of the adapter contracts
//!
//! These speak small JSON contracts so any sidecar exposing the same
//! endpoints can back the engine. The engine itself depends only on the
//! traits; nothing here is required for library use.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::{
    AdapterError, AdapterResult, QueryGenerator, Reranker, VectorHit, VectorRetriever,
};
use crate::types::Document;

fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .expect("failed to build HTTP client")
}

fn transport_error(err: reqwest::Error, timeout: Duration) -> AdapterError {
    if err.is_timeout() {
        AdapterError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        AdapterError::Unavailable(err.to_string())
    }
}

/// Vector search over HTTP: POST {base_url}/search
pub struct HttpVectorRetriever {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpVectorRetriever {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            base_url: base_url.into(),
            timeout,
        }
    }
}

#[derive(Deserialize)]
struct VectorSearchResponse {
    results: Vec<VectorHit>,
}

#[async_trait]
impl VectorRetriever for HttpVectorRetriever {
    async fn search(&self, query_text: &str, top_k: usize) -> AdapterResult<Vec<VectorHit>> {
        let url = format!("{}/search", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&json!({ "query": query_text, "top_k": top_k }))
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(AdapterError::Unavailable(format!(
                "vector search returned {}",
                response.status()
            )));
        }

        let body: VectorSearchResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::Unavailable(format!("bad vector response: {}", e)))?;

        Ok(body.results)
    }
}

/// Pairwise reranking over HTTP: POST {base_url}/rerank
pub struct HttpReranker {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpReranker {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            base_url: base_url.into(),
            timeout,
        }
    }
}

#[derive(Deserialize)]
struct RerankResponse {
    scores: Vec<f32>,
}

#[async_trait]
impl Reranker for HttpReranker {
    async fn score(&self, query_text: &str, docs: &[Arc<Document>]) -> AdapterResult<Vec<f32>> {
        let url = format!("{}/rerank", self.base_url);
        let documents: Vec<&str> = docs.iter().map(|d| d.content.as_str()).collect();

        let response = self
            .client
            .post(&url)
            .json(&json!({ "query": query_text, "documents": documents }))
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(AdapterError::Unavailable(format!(
                "reranker returned {}",
                response.status()
            )));
        }

        let body: RerankResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::Unavailable(format!("bad rerank response: {}", e)))?;

        if body.scores.len() != docs.len() {
            return Err(AdapterError::Unavailable(format!(
                "reranker returned {} scores for {} documents",
                body.scores.len(),
                docs.len()
            )));
        }

        Ok(body.scores)
    }
}

/// Sub-query generation via a local Ollama model: POST {base_url}/api/generate
pub struct OllamaQueryGenerator {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaQueryGenerator {
    /// # Arguments
    /// * `base_url` - Base URL for the Ollama API (e.g. http://127.0.0.1:11434)
    /// * `model` - Model tag used for generation
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            base_url: base_url.into(),
            model: model.into(),
            timeout,
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Prompt contract: the model answers with one sub-query per line, no
/// numbering, no commentary
fn build_prompt(original_query: &str, evidence_summary: &str, hop_index: usize, n: usize) -> String {
    let mut prompt = format!(
        "You generate follow-up search queries for multi-hop retrieval.\n\
         Given the original query, produce up to {} sub-queries, each focused \
         on a different aspect or related concept that has not been covered yet.\n\n\
         Original query: {}\n",
        n, original_query
    );

    if !evidence_summary.is_empty() {
        prompt.push_str(&format!(
            "\nEvidence gathered through hop {}:\n{}\n",
            hop_index.saturating_sub(1),
            evidence_summary
        ));
    }

    prompt.push_str(
        "\nRules:\n\
         1. Each sub-query must be specific and independently searchable.\n\
         2. Sub-queries must cover different aspects, not rephrase each other.\n\
         3. Return only the queries, one per line, no numbering or explanation.\n\n\
         Queries:\n",
    );

    prompt
}

/// Split a model response into at most `n` cleaned sub-queries
fn parse_sub_queries(response: &str, n: usize) -> Vec<String> {
    response
        .lines()
        .map(|line| line.trim().trim_start_matches(['-', '*', ' ']).trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .take(n)
        .collect()
}

#[async_trait]
impl QueryGenerator for OllamaQueryGenerator {
    async fn generate(
        &self,
        original_query: &str,
        evidence_summary: &str,
        hop_index: usize,
        n: usize,
    ) -> AdapterResult<Vec<String>> {
        let url = format!("{}/api/generate", self.base_url);
        let prompt = build_prompt(original_query, evidence_summary, hop_index, n);

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
            }))
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(AdapterError::Unavailable(format!(
                "Ollama API error: {}",
                response.status()
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::Unavailable(format!("bad generate response: {}", e)))?;

        Ok(parse_sub_queries(&body.response, n))
    }
}
