//! Shared context: configuration, providers and the lazily created vector index

use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::config::{RagConfig, VectorBackend};
use crate::error::{Error, Result};
use crate::providers::{
    build_vector_index, ollama::ollama_pair, rerank_http::HttpReranker, EmbeddingProvider,
    Reranker, TextGenerator, VectorIndex,
};

/// Shared state handed to the searcher, summarizer and ingestion pipeline
///
/// Cheap to clone. The vector index slot is empty until the first ingestion
/// (or an explicit restore) and is set at most once.
#[derive(Clone)]
pub struct RagContext {
    inner: Arc<RagContextInner>,
}

struct RagContextInner {
    /// Configuration
    config: RagConfig,
    /// Embedding provider
    embedder: Arc<dyn EmbeddingProvider>,
    /// Relevance reranker
    reranker: Arc<dyn Reranker>,
    /// Text generation model
    generator: Arc<dyn TextGenerator>,
    /// Vector index, created on first use
    index: OnceCell<Arc<dyn VectorIndex>>,
}

impl RagContext {
    /// Create a context from explicit providers
    pub fn new(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        reranker: Arc<dyn Reranker>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self::build(config, embedder, reranker, generator, OnceCell::new())
    }

    /// Create a context backed by Ollama and the HTTP reranker
    pub fn from_config(config: RagConfig) -> Result<Self> {
        config.validate()?;

        let (embedder, llm) = ollama_pair(&config.llm, config.embeddings.dimensions)?;
        tracing::info!(
            "Ollama providers ready (embed: {}, generate: {})",
            config.llm.embed_model,
            config.llm.generate_model
        );

        let reranker = HttpReranker::new(&config.reranker)?;
        tracing::info!("Reranker ready ({} at {})", config.reranker.model, config.reranker.base_url);

        Ok(Self::new(config, Arc::new(embedder), Arc::new(reranker), Arc::new(llm)))
    }

    /// Same providers, with the index slot already filled
    pub fn with_index(self, index: Arc<dyn VectorIndex>) -> Self {
        let inner = &self.inner;
        Self::build(
            inner.config.clone(),
            Arc::clone(&inner.embedder),
            Arc::clone(&inner.reranker),
            Arc::clone(&inner.generator),
            OnceCell::from(index),
        )
    }

    fn build(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        reranker: Arc<dyn Reranker>,
        generator: Arc<dyn TextGenerator>,
        index: OnceCell<Arc<dyn VectorIndex>>,
    ) -> Self {
        Self {
            inner: Arc::new(RagContextInner {
                config,
                embedder,
                reranker,
                generator,
                index,
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get embedding provider
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embedder
    }

    /// Get reranker
    pub fn reranker(&self) -> &Arc<dyn Reranker> {
        &self.inner.reranker
    }

    /// Get text generator
    pub fn generator(&self) -> &Arc<dyn TextGenerator> {
        &self.inner.generator
    }

    /// The vector index, if it has been created
    pub fn index(&self) -> Option<Arc<dyn VectorIndex>> {
        self.inner.index.get().cloned()
    }

    /// The vector index, or `Error::NotInitialized`
    pub fn require_index(&self) -> Result<Arc<dyn VectorIndex>> {
        self.index().ok_or(Error::NotInitialized)
    }

    /// Get the vector index, creating the configured backend on first call
    ///
    /// Concurrent first calls build the backend once. A failed build leaves
    /// the slot empty so a later call can retry.
    pub async fn get_or_init_index(&self) -> Result<Arc<dyn VectorIndex>> {
        let index = self
            .inner
            .index
            .get_or_try_init(|| async {
                let config = &self.inner.config;
                let dimensions = self.inner.embedder.dimensions();
                tracing::info!(
                    "Creating vector index (backend: {:?}, dimensions: {})",
                    config.vector_db.backend,
                    dimensions
                );
                build_vector_index(&config.vector_db, dimensions).await
            })
            .await?;

        Ok(Arc::clone(index))
    }

    /// Open an index persisted by an earlier run, if the backend keeps one
    ///
    /// Returns whether the slot is now filled. In-memory backends never have
    /// anything to restore; a disk backend only restores when its file exists.
    pub async fn restore_index(&self) -> Result<bool> {
        if self.index().is_some() {
            return Ok(true);
        }

        let vector_db = &self.inner.config.vector_db;
        let persisted = match vector_db.backend {
            VectorBackend::Memory => false,
            VectorBackend::Disk => tokio::fs::try_exists(&vector_db.storage_path)
                .await
                .unwrap_or(false),
            VectorBackend::Qdrant => true,
        };

        if !persisted {
            tracing::debug!("No persisted vector index to restore");
            return Ok(false);
        }

        self.get_or_init_index().await?;
        Ok(true)
    }
}
