//! HTTP cross-encoder reranker
//!
//! Talks to a text-embeddings-inference style `/rerank` endpoint:
//! `{"query": .., "texts": [..]}` -> `[{"index": i, "score": s}, ..]`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::RerankerConfig;
use crate::error::{Error, Result};

use super::reranker::Reranker;
use super::retry::retry_request;

/// Cross-encoder reranker served over HTTP
pub struct HttpReranker {
    client: Client,
    config: RerankerConfig,
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    texts: &'a [String],
    raw_scores: bool,
}

#[derive(Debug, Deserialize)]
struct RerankHit {
    index: usize,
    score: f32,
}

impl HttpReranker {
    pub fn new(config: &RerankerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }
}

/// Put scores back into input order; every input index must be scored exactly once
fn align_scores(hits: Vec<RerankHit>, expected: usize) -> Result<Vec<f32>> {
    let mut scores: Vec<Option<f32>> = vec![None; expected];
    for hit in hits {
        let slot = scores
            .get_mut(hit.index)
            .ok_or_else(|| Error::rerank(format!("Rerank index {} out of range", hit.index)))?;
        *slot = Some(hit.score);
    }

    scores
        .into_iter()
        .enumerate()
        .map(|(i, s)| s.ok_or_else(|| Error::rerank(format!("No rerank score for candidate {}", i))))
        .collect()
}

#[async_trait]
impl Reranker for HttpReranker {
    async fn score(&self, query: &str, candidate: &str) -> Result<f32> {
        let scores = self.score_batch(query, &[candidate.to_string()]).await?;
        scores
            .into_iter()
            .next()
            .ok_or_else(|| Error::rerank("Empty rerank response"))
    }

    async fn score_batch(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/rerank", self.config.base_url.trim_end_matches('/'));

        let hits: Vec<RerankHit> = retry_request("Rerank", self.config.max_retries, || {
            let url = url.clone();
            async move {
                let request = RerankRequest {
                    model: &self.config.model,
                    query,
                    texts: candidates,
                    raw_scores: false,
                };

                let response = self.client.post(&url).json(&request).send().await.map_err(|e| {
                    if e.is_connect() || e.is_timeout() {
                        Error::backend_unavailable("reranker", e.to_string())
                    } else {
                        Error::rerank(format!("Rerank request failed: {}", e))
                    }
                })?;

                if !response.status().is_success() {
                    return Err(Error::rerank(format!("Rerank failed: HTTP {}", response.status())));
                }

                response
                    .json()
                    .await
                    .map_err(|e| Error::rerank(format!("Failed to parse rerank response: {}", e)))
            }
        })
        .await?;

        align_scores(hits, candidates.len())
    }

    fn name(&self) -> &str {
        "http-cross-encoder"
    }
}
