//! Vector index trait shared by the in-memory, on-disk and clustered backends

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Chunk, SearchCandidate};

/// What a backend's raw `vector_score` means
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreKind {
    /// Lower is better
    Distance,
    /// Higher is better
    Similarity,
}

impl ScoreKind {
    /// Re-express `score` (of kind `self`) in kind `target`
    ///
    /// Uses `1 - s`, which keeps ranking intact but is only an exact
    /// conversion for scores in [0, 1].
    pub fn convert(self, score: f32, target: ScoreKind) -> f32 {
        if self == target {
            score
        } else {
            1.0 - score
        }
    }
}

/// Trait for vector storage and nearest-neighbor search
///
/// Implementations:
/// - `InMemoryIndex`: process-local brute-force cosine index
/// - `DiskIndex`: `InMemoryIndex` persisted to a JSON snapshot
/// - `QdrantIndex`: remote Qdrant cluster over REST
/// - `FallbackIndex`: primary backend with a secondary taking over on failure
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace chunks with their embeddings (same order, same length)
    ///
    /// Returns the number of stored points.
    async fn upsert(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<usize>;

    /// Return up to `k` nearest candidates, best first
    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchCandidate>>;

    /// Return stored chunks whose metadata `key` equals `value`
    ///
    /// Candidates come back in insertion order with `vector_score` 0.
    async fn get_by_filter(
        &self,
        key: &str,
        value: &serde_json::Value,
        limit: usize,
    ) -> Result<Vec<SearchCandidate>>;

    /// Get total number of vectors stored
    async fn len(&self) -> Result<usize>;

    /// Check if index is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Semantics of `SearchCandidate::vector_score` for this backend
    fn score_kind(&self) -> ScoreKind;

    /// Check if the backend is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
