//! Text embedding provider

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Turns text into fixed-size vectors for the vector index
///
/// Query and chunk embeddings must come from the same provider so their
/// distances are comparable.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, one vector per text in input order
    ///
    /// Default implementation calls `embed` sequentially.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            let embedding = self.embed(text).await?;
            self.check_dimensions(&embedding)?;
            embeddings.push(embedding);
        }
        Ok(embeddings)
    }

    /// Vector length produced by this provider (768 for nomic-embed-text)
    fn dimensions(&self) -> usize;

    /// Reject a vector whose length does not match `dimensions()`
    fn check_dimensions(&self, embedding: &[f32]) -> Result<()> {
        if embedding.len() == self.dimensions() {
            Ok(())
        } else {
            Err(Error::embedding(format!(
                "{} returned {} dimensions, expected {}",
                self.name(),
                embedding.len(),
                self.dimensions()
            )))
        }
    }

    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logs
    fn name(&self) -> &str;
}
