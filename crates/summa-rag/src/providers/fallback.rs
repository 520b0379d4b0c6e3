//! Fallback decorator: a primary backend with a secondary taking over on failure
//!
//! Writes go to both backends so the secondary can serve reads on its own.
//! Reads try the primary first. Scores served by the secondary are re-expressed
//! in the primary's `ScoreKind` so callers see a single score semantics.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::types::{Chunk, SearchCandidate};

use super::vector_store::{ScoreKind, VectorIndex};

/// Primary index with a secondary fallback
pub struct FallbackIndex {
    primary: Arc<dyn VectorIndex>,
    secondary: Arc<dyn VectorIndex>,
    name: String,
}

impl FallbackIndex {
    pub fn new(primary: Arc<dyn VectorIndex>, secondary: Arc<dyn VectorIndex>) -> Self {
        let name = format!("{}+{}", primary.name(), secondary.name());
        Self {
            primary,
            secondary,
            name,
        }
    }

    fn from_secondary(&self, mut candidates: Vec<SearchCandidate>) -> Vec<SearchCandidate> {
        let from = self.secondary.score_kind();
        let to = self.primary.score_kind();
        for c in &mut candidates {
            c.vector_score = from.convert(c.vector_score, to);
        }
        candidates
    }
}

#[async_trait]
impl VectorIndex for FallbackIndex {
    async fn upsert(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<usize> {
        let primary = self.primary.upsert(chunks, embeddings).await;
        let secondary = self.secondary.upsert(chunks, embeddings).await;

        match (primary, secondary) {
            (Ok(n), Ok(_)) => Ok(n),
            (Ok(n), Err(e)) => {
                tracing::warn!("Fallback index {} upsert failed: {}", self.secondary.name(), e);
                Ok(n)
            }
            (Err(e), Ok(n)) => {
                tracing::warn!(
                    "Primary index {} upsert failed, stored in {} only: {}",
                    self.primary.name(),
                    self.secondary.name(),
                    e
                );
                Ok(n)
            }
            (Err(e), Err(fallback_err)) => {
                tracing::error!(
                    "Both indexes failed upsert: {} / {}",
                    e,
                    fallback_err
                );
                Err(e)
            }
        }
    }

    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchCandidate>> {
        match self.primary.search(query_embedding, k).await {
            Ok(results) => Ok(results),
            Err(e) => {
                tracing::warn!(
                    "Primary index {} search failed, falling back to {}: {}",
                    self.primary.name(),
                    self.secondary.name(),
                    e
                );
                let results = self.secondary.search(query_embedding, k).await?;
                Ok(self.from_secondary(results))
            }
        }
    }

    async fn get_by_filter(
        &self,
        key: &str,
        value: &serde_json::Value,
        limit: usize,
    ) -> Result<Vec<SearchCandidate>> {
        match self.primary.get_by_filter(key, value, limit).await {
            Ok(results) => Ok(results),
            Err(e) => {
                tracing::warn!(
                    "Primary index {} filter failed, falling back to {}: {}",
                    self.primary.name(),
                    self.secondary.name(),
                    e
                );
                self.secondary.get_by_filter(key, value, limit).await
            }
        }
    }

    async fn len(&self) -> Result<usize> {
        match self.primary.len().await {
            Ok(n) => Ok(n),
            Err(_) => self.secondary.len().await,
        }
    }

    fn score_kind(&self) -> ScoreKind {
        self.primary.score_kind()
    }

    async fn health_check(&self) -> Result<bool> {
        if self.primary.health_check().await.unwrap_or(false) {
            return Ok(true);
        }
        self.secondary.health_check().await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::providers::local::InMemoryIndex;
    use crate::types::Document;
    use tokio_test::{assert_err, assert_ok};

    /// Backend that fails every call
    struct DownIndex;

    #[async_trait]
    impl VectorIndex for DownIndex {
        async fn upsert(&self, _: &[Chunk], _: &[Vec<f32>]) -> Result<usize> {
            Err(Error::backend_unavailable("down", "connection refused"))
        }
        async fn search(&self, _: &[f32], _: usize) -> Result<Vec<SearchCandidate>> {
            Err(Error::backend_unavailable("down", "connection refused"))
        }
        async fn get_by_filter(&self, _: &str, _: &serde_json::Value, _: usize) -> Result<Vec<SearchCandidate>> {
            Err(Error::backend_unavailable("down", "connection refused"))
        }
        async fn len(&self) -> Result<usize> {
            Err(Error::backend_unavailable("down", "connection refused"))
        }
        fn score_kind(&self) -> ScoreKind {
            ScoreKind::Similarity
        }
        async fn health_check(&self) -> Result<bool> {
            Ok(false)
        }
        fn name(&self) -> &str {
            "down"
        }
    }

    fn sample() -> (Vec<Chunk>, Vec<Vec<f32>>) {
        let doc = Document::new("a.txt", "");
        let chunks = vec![Chunk::new(&doc, "alpha".to_string(), 0, 5, 0)];
        (chunks, vec![vec![1.0, 0.0]])
    }

    #[tokio::test]
    async fn test_secondary_serves_when_primary_down() {
        let local = Arc::new(InMemoryIndex::new(2));
        let index = FallbackIndex::new(Arc::new(DownIndex), local.clone());
        let (chunks, embeddings) = sample();

        assert_eq!(index.upsert(&chunks, &embeddings).await.unwrap(), 1);
        assert_eq!(local.len().await.unwrap(), 1);
        assert_eq!(index.len().await.unwrap(), 1);

        let results = index.search(&[1.0, 0.0], 3).await.unwrap();
        assert_eq!(results.len(), 1);
        // Local distance 0.0 re-expressed as the primary's similarity
        assert!((results[0].vector_score - 1.0).abs() < 1e-6);
        assert!(index.health_check().await.unwrap());
        assert_eq!(index.name(), "down+memory");
    }

    #[tokio::test]
    async fn test_both_down_is_an_error() {
        let index = FallbackIndex::new(Arc::new(DownIndex), Arc::new(DownIndex));
        let (chunks, embeddings) = sample();
        assert_err!(index.upsert(&chunks, &embeddings).await);
        assert_err!(index.search(&[1.0, 0.0], 3).await);
        assert_err!(index.len().await);
    }

    #[tokio::test]
    async fn test_primary_preferred() {
        let primary = Arc::new(InMemoryIndex::new(2));
        let secondary = Arc::new(InMemoryIndex::new(2));
        let index = FallbackIndex::new(primary.clone(), secondary.clone());
        let (chunks, embeddings) = sample();
        assert_ok!(index.upsert(&chunks, &embeddings).await);

        assert_eq!(primary.len().await.unwrap(), 1);
        assert_eq!(secondary.len().await.unwrap(), 1);
        let results = index.search(&[1.0, 0.0], 1).await.unwrap();
        assert!(results[0].vector_score.abs() < 1e-6);
    }
}
