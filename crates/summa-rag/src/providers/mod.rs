//! Provider abstractions for embeddings, reranking, text generation and vector storage
//!
//! Every external collaborator of the core sits behind one of these traits so
//! backends can be swapped (or faked in tests) without touching retrieval or
//! summarization.

pub mod embedding;
pub mod fallback;
pub mod llm;
pub mod local;
pub mod ollama;
pub mod qdrant;
pub mod rerank_http;
pub mod reranker;
pub mod retry;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use fallback::FallbackIndex;
pub use llm::TextGenerator;
pub use local::{DiskIndex, InMemoryIndex};
pub use qdrant::QdrantIndex;
pub use reranker::Reranker;
pub use vector_store::{ScoreKind, VectorIndex};

use std::sync::Arc;

use crate::config::{VectorBackend, VectorDbConfig};
use crate::error::Result;

/// Build the configured vector index backend
///
/// With `fallback_to_local`, a Qdrant backend is wrapped so that a local disk
/// index serves calls whenever the cluster fails.
pub async fn build_vector_index(
    config: &VectorDbConfig,
    dimensions: usize,
) -> Result<Arc<dyn VectorIndex>> {
    let index: Arc<dyn VectorIndex> = match config.backend {
        VectorBackend::Memory => {
            tracing::info!("Using in-memory vector index");
            Arc::new(InMemoryIndex::new(dimensions))
        }
        VectorBackend::Disk => {
            tracing::info!("Using disk vector index at {}", config.storage_path.display());
            Arc::new(DiskIndex::open(&config.storage_path, dimensions).await?)
        }
        VectorBackend::Qdrant => {
            tracing::info!(
                "Using Qdrant vector index at {} (collection: {})",
                config.qdrant_url,
                config.qdrant_collection
            );
            let qdrant = Arc::new(QdrantIndex::new(config, dimensions)?);

            if config.fallback_to_local {
                let local = Arc::new(DiskIndex::open(&config.storage_path, dimensions).await?);
                Arc::new(FallbackIndex::new(qdrant, local))
            } else {
                qdrant
            }
        }
    };

    Ok(index)
}
