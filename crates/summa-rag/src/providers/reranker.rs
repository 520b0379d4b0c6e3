//! Relevance reranker trait

use async_trait::async_trait;
use crate::error::Result;

/// Scores (query, candidate) pairs with a cross-encoder style model
///
/// Scores are only compared with each other, so any monotonic scale works;
/// the default fusion weights assume roughly [0, 1].
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Score one pair
    async fn score(&self, query: &str, candidate: &str) -> Result<f32>;

    /// Score many candidates against one query, in input order
    ///
    /// Default implementation calls `score` sequentially.
    async fn score_batch(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>> {
        let mut scores = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            scores.push(self.score(query, candidate).await?);
        }
        Ok(scores)
    }

    /// Get provider name for logging
    fn name(&self) -> &str;
}
