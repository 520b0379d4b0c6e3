//! Hybrid search: vector retrieval followed by cross-encoder reranking

use crate::error::{Error, Result};
use crate::state::RagContext;
use crate::types::{ScoredResult, SearchCandidate};

use super::fusion::fuse;

/// Upper bound on chunks returned for one document
const MAX_DOCUMENT_CHUNKS: usize = 10_000;

/// Hybrid search orchestrator over the shared context
#[derive(Clone)]
pub struct HybridSearcher {
    ctx: RagContext,
}

impl HybridSearcher {
    /// Create a new searcher
    pub fn new(ctx: RagContext) -> Self {
        Self { ctx }
    }

    /// Top-`k` results for `query`, best first
    ///
    /// Never fails: an uninitialized index or a collaborator error is logged
    /// and yields an empty list.
    pub async fn search(&self, query: &str, k: usize) -> Vec<ScoredResult> {
        match self.try_search(query, k).await {
            Ok(results) => results,
            Err(Error::NotInitialized) => {
                tracing::warn!("Search before any document was ingested, returning no results");
                Vec::new()
            }
            Err(e) => {
                tracing::error!("Hybrid search failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Like [`search`](Self::search), with the error kept
    pub async fn try_search(&self, query: &str, k: usize) -> Result<Vec<ScoredResult>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let index = self.ctx.require_index()?;
        let config = &self.ctx.config().retrieval;

        // Oversample so reranking has something to reorder
        let fetch_k = k.saturating_mul(config.oversample.max(1));

        let query_embedding = self.ctx.embedder().embed(query).await?;
        let candidates = index.search(&query_embedding, fetch_k).await?;
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = candidates.iter().map(|c| c.content.clone()).collect();
        let rerank_scores = self.ctx.reranker().score_batch(query, &texts).await?;
        if rerank_scores.len() != candidates.len() {
            return Err(Error::rerank(format!(
                "{} returned {} scores for {} candidates",
                self.ctx.reranker().name(),
                rerank_scores.len(),
                candidates.len()
            )));
        }

        let mut results = fuse(candidates, &rerank_scores, index.score_kind(), config);
        results.truncate(k);

        tracing::debug!(
            "Search '{}' on {}: {} of {} candidates kept",
            query,
            index.name(),
            results.len(),
            texts.len()
        );

        Ok(results)
    }

    /// Every stored chunk of the document with this `source`
    pub async fn document_chunks(&self, source: &str) -> Vec<SearchCandidate> {
        let Some(index) = self.ctx.index() else {
            tracing::warn!("Chunk lookup for '{}' before any document was ingested", source);
            return Vec::new();
        };

        match index
            .get_by_filter("source", &serde_json::json!(source), MAX_DOCUMENT_CHUNKS)
            .await
        {
            Ok(chunks) => chunks,
            Err(e) => {
                tracing::error!("Chunk lookup for '{}' failed: {}", source, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::config::{RagConfig, VectorBackend};
    use crate::providers::{EmbeddingProvider, InMemoryIndex, Reranker, ScoreKind, VectorIndex};
    use crate::testing::{fake_context, HashEmbedder, ScriptedGenerator};
    use crate::types::{Chunk, Document};

    const CORPUS: [&str; 6] = [
        "Rust ownership rules prevent data races",
        "Borrowing lets functions use values without taking ownership",
        "Tokio is an async runtime for Rust",
        "Bread needs flour water salt and yeast",
        "Sourdough starter ferments for days",
        "The Rust compiler checks lifetimes",
    ];

    /// Wraps an index and records the `k` of the last search
    struct RecordingIndex {
        inner: InMemoryIndex,
        last_k: AtomicUsize,
    }

    #[async_trait]
    impl VectorIndex for RecordingIndex {
        async fn upsert(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<usize> {
            self.inner.upsert(chunks, embeddings).await
        }
        async fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchCandidate>> {
            self.last_k.store(k, Ordering::SeqCst);
            self.inner.search(query, k).await
        }
        async fn get_by_filter(&self, key: &str, value: &serde_json::Value, limit: usize) -> Result<Vec<SearchCandidate>> {
            self.inner.get_by_filter(key, value, limit).await
        }
        async fn len(&self) -> Result<usize> {
            self.inner.len().await
        }
        fn score_kind(&self) -> ScoreKind {
            ScoreKind::Distance
        }
        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
        fn name(&self) -> &str {
            "recording"
        }
    }

    struct DownReranker;

    #[async_trait]
    impl Reranker for DownReranker {
        async fn score(&self, _: &str, _: &str) -> Result<f32> {
            Err(Error::backend_unavailable("reranker", "connection refused"))
        }
        fn name(&self) -> &str {
            "down"
        }
    }

    fn memory_config() -> RagConfig {
        let mut config = RagConfig::default();
        config.vector_db.backend = VectorBackend::Memory;
        config
    }

    async fn seed(index: &dyn VectorIndex) {
        let doc = Document::new("notes.txt", CORPUS.join(" "));
        let chunks: Vec<Chunk> = CORPUS
            .iter()
            .enumerate()
            .map(|(i, text)| Chunk::new(&doc, text.to_string(), 0, 0, i as u32))
            .collect();
        let texts: Vec<String> = CORPUS.iter().map(|s| s.to_string()).collect();
        let embeddings = HashEmbedder.embed_batch(&texts).await.unwrap();
        index.upsert(&chunks, &embeddings).await.unwrap();
    }

    async fn seeded_searcher() -> (HybridSearcher, Arc<RecordingIndex>) {
        let index = Arc::new(RecordingIndex {
            inner: InMemoryIndex::new(HashEmbedder::DIMENSIONS),
            last_k: AtomicUsize::new(0),
        });
        seed(index.as_ref()).await;
        let ctx = fake_context(memory_config()).with_index(index.clone());
        (HybridSearcher::new(ctx), index)
    }

    #[tokio::test]
    async fn test_search_before_ingest_is_empty() {
        let searcher = HybridSearcher::new(fake_context(memory_config()));
        assert!(searcher.search("x", 5).await.is_empty());
        assert!(matches!(searcher.try_search("x", 5).await, Err(Error::NotInitialized)));
        assert!(searcher.document_chunks("notes.txt").await.is_empty());
    }

    #[tokio::test]
    async fn test_results_ranked_and_bounded() {
        let (searcher, index) = seeded_searcher().await;

        let results = searcher.search("rust ownership", 3).await;
        assert_eq!(results.len(), 3);
        assert_eq!(index.last_k.load(Ordering::SeqCst), 6);
        assert!(results.windows(2).all(|w| w[0].final_score >= w[1].final_score));
        assert_eq!(results[0].content, CORPUS[0]);
        assert!((results[0].rerank_score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_k_larger_than_corpus() {
        let (searcher, _) = seeded_searcher().await;
        assert_eq!(searcher.search("bread", 50).await.len(), CORPUS.len());
    }

    #[tokio::test]
    async fn test_zero_k_skips_collaborators() {
        let (searcher, index) = seeded_searcher().await;
        assert!(searcher.search("rust", 0).await.is_empty());
        assert_eq!(index.last_k.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reranker_failure_yields_empty() {
        let index = Arc::new(InMemoryIndex::new(HashEmbedder::DIMENSIONS));
        seed(index.as_ref()).await;
        let ctx = RagContext::new(
            memory_config(),
            Arc::new(HashEmbedder),
            Arc::new(DownReranker),
            Arc::new(ScriptedGenerator::fixed("unused")),
        )
        .with_index(index);
        let searcher = HybridSearcher::new(ctx);

        assert!(searcher.search("rust", 3).await.is_empty());
        assert!(searcher.try_search("rust", 3).await.unwrap_err().is_unavailable());
    }

    #[tokio::test]
    async fn test_document_chunks_by_source() {
        let (searcher, _) = seeded_searcher().await;
        assert_eq!(searcher.document_chunks("notes.txt").await.len(), CORPUS.len());
        assert!(searcher.document_chunks("other.txt").await.is_empty());
    }
}
