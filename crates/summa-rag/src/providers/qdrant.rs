//! Qdrant cluster vector index over the REST API
//!
//! Points carry the chunk text and metadata in their payload:
//! `{"content": .., "metadata": {..}}`. Qdrant reports cosine *similarity*,
//! so this backend's `score_kind` is `Similarity`.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::config::VectorDbConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, SearchCandidate};

use super::vector_store::{ScoreKind, VectorIndex};

/// Qdrant-backed vector index
pub struct QdrantIndex {
    client: Client,
    base_url: String,
    collection: String,
    api_key: Option<String>,
    dimensions: usize,
    /// Set once the collection is known to exist
    collection_ready: OnceCell<()>,
}

#[derive(Serialize)]
struct Point<'a> {
    id: String,
    vector: &'a [f32],
    payload: Payload,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Payload {
    #[serde(default)]
    content: String,
    #[serde(default)]
    metadata: HashMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    result: T,
}

#[derive(Deserialize)]
struct ScoredPoint {
    score: f32,
    #[serde(default)]
    payload: Option<Payload>,
}

#[derive(Deserialize)]
struct ScrollResult {
    points: Vec<RecordPoint>,
}

#[derive(Deserialize)]
struct RecordPoint {
    #[serde(default)]
    payload: Option<Payload>,
}

#[derive(Deserialize)]
struct CountResult {
    count: usize,
}

impl From<Payload> for SearchCandidate {
    fn from(payload: Payload) -> Self {
        SearchCandidate {
            content: payload.content,
            metadata: payload.metadata,
            vector_score: 0.0,
        }
    }
}

impl QdrantIndex {
    /// Create a client for the configured collection
    pub fn new(config: &VectorDbConfig, dimensions: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.qdrant_url.trim_end_matches('/').to_string(),
            collection: config.qdrant_collection.clone(),
            api_key: config.qdrant_api_key.clone(),
            dimensions,
            collection_ready: OnceCell::new(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/collections/{}{}", self.base_url, self.collection, path)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = self.authed(builder).send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                Error::backend_unavailable("qdrant", e.to_string())
            } else {
                Error::vector_db(format!("Qdrant request failed: {}", e))
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::vector_db(format!("Qdrant HTTP {} - {}", status, body)));
        }

        Ok(response)
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        let parsed: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| Error::vector_db(format!("Failed to parse Qdrant response: {}", e)))?;
        Ok(parsed.result)
    }

    /// Create the collection on first write if it does not exist yet
    async fn ensure_collection(&self) -> Result<()> {
        self.collection_ready
            .get_or_try_init(|| async {
                let exists = self
                    .authed(self.client.get(self.url("")))
                    .send()
                    .await
                    .map(|r| r.status().is_success())
                    .map_err(|e| Error::backend_unavailable("qdrant", e.to_string()))?;

                if !exists {
                    tracing::info!(
                        "Creating Qdrant collection {} ({} dims, cosine)",
                        self.collection,
                        self.dimensions
                    );
                    let body = serde_json::json!({
                        "vectors": { "size": self.dimensions, "distance": "Cosine" }
                    });
                    self.send(self.client.put(self.url("")).json(&body)).await?;
                }

                Ok::<(), Error>(())
            })
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn upsert(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<usize> {
        if chunks.len() != embeddings.len() {
            return Err(Error::vector_db(format!(
                "Got {} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }
        if chunks.is_empty() {
            return Ok(0);
        }

        self.ensure_collection().await?;

        let points: Vec<Point> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| Point {
                id: chunk.id.to_string(),
                vector: embedding,
                payload: Payload {
                    content: chunk.content.clone(),
                    metadata: chunk.to_vector_metadata(),
                },
            })
            .collect();

        let body = serde_json::json!({ "points": points });
        self.send(self.client.put(self.url("/points?wait=true")).json(&body))
            .await?;

        tracing::debug!("Upserted {} points into Qdrant", chunks.len());
        Ok(chunks.len())
    }

    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchCandidate>> {
        let body = serde_json::json!({
            "vector": query_embedding,
            "limit": k,
            "with_payload": true,
        });

        let response = self
            .send(self.client.post(self.url("/points/search")).json(&body))
            .await?;
        let hits: Vec<ScoredPoint> = Self::parse(response).await?;

        Ok(hits
            .into_iter()
            .map(|hit| {
                let mut candidate: SearchCandidate = hit.payload.unwrap_or_default().into();
                candidate.vector_score = hit.score;
                candidate
            })
            .collect())
    }

    async fn get_by_filter(
        &self,
        key: &str,
        value: &serde_json::Value,
        limit: usize,
    ) -> Result<Vec<SearchCandidate>> {
        let body = serde_json::json!({
            "filter": {
                "must": [{ "key": format!("metadata.{}", key), "match": { "value": value } }]
            },
            "limit": limit,
            "with_payload": true,
            "with_vector": false,
        });

        let response = self
            .send(self.client.post(self.url("/points/scroll")).json(&body))
            .await?;
        let scroll: ScrollResult = Self::parse(response).await?;

        Ok(scroll
            .points
            .into_iter()
            .map(|p| p.payload.unwrap_or_default().into())
            .collect())
    }

    async fn len(&self) -> Result<usize> {
        let body = serde_json::json!({ "exact": true });
        let response = self
            .send(self.client.post(self.url("/points/count")).json(&body))
            .await?;
        let count: CountResult = Self::parse(response).await?;
        Ok(count.count)
    }

    fn score_kind(&self) -> ScoreKind {
        ScoreKind::Similarity
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/healthz", self.base_url);
        match self.authed(self.client.get(&url)).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}
