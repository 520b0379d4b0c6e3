//! Ingestion pipeline orchestration

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::state::RagContext;
use crate::summarization::RecursiveSummarizer;
use crate::types::{Chunk, Document};

use super::chunker::TextChunker;

/// Outcome of ingesting one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub document_id: Uuid,
    pub source: String,
    /// Chunks stored in the vector index
    pub chunks: usize,
    pub summary: String,
}

/// Chunk, embed, index and summarize documents
pub struct IngestPipeline {
    ctx: RagContext,
    /// Text chunker
    chunker: TextChunker,
    summarizer: RecursiveSummarizer,
}

impl IngestPipeline {
    /// Create a new ingestion pipeline
    pub fn new(ctx: RagContext) -> Self {
        let chunker = TextChunker::from_config(&ctx.config().chunking);
        let summarizer = RecursiveSummarizer::from_context(&ctx);
        Self {
            ctx,
            chunker,
            summarizer,
        }
    }

    /// Full ingestion: chunk + embed + upsert + summarize
    ///
    /// The first ingestion creates the vector index.
    pub async fn ingest(&self, document: Document) -> Result<IngestReport> {
        let chunks = self.chunker.chunk_document(&document);

        let stored = if chunks.is_empty() {
            tracing::warn!("'{}' produced no chunks, nothing to index", document.source);
            0
        } else {
            let embeddings = self.embed_chunks(&chunks).await?;
            let index = self.ctx.get_or_init_index().await?;
            index.upsert(&chunks, &embeddings).await?
        };

        let summary = self.summarizer.summarize_document(&document).await;

        tracing::info!(
            "Ingested '{}': {} chars, {} chunks, {} char summary",
            document.source,
            document.char_len(),
            stored,
            summary.chars().count()
        );

        Ok(IngestReport {
            document_id: document.id,
            source: document.source,
            chunks: stored,
            summary,
        })
    }

    /// Ingest documents one after another, stopping at the first error
    pub async fn ingest_all(&self, documents: Vec<Document>) -> Result<Vec<IngestReport>> {
        let mut reports = Vec::with_capacity(documents.len());
        for document in documents {
            reports.push(self.ingest(document).await?);
        }
        Ok(reports)
    }

    async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>> {
        let batch_size = self.ctx.config().embeddings.batch_size.max(1);
        let embedder = self.ctx.embedder();

        let mut embeddings = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let batch_embeddings = embedder.embed_batch(&texts).await?;
            if batch_embeddings.len() != texts.len() {
                return Err(Error::embedding(format!(
                    "{} returned {} embeddings for {} texts",
                    embedder.name(),
                    batch_embeddings.len(),
                    texts.len()
                )));
            }
            embeddings.extend(batch_embeddings);
        }

        tracing::debug!("Embedded {} chunks with {}", chunks.len(), embedder.name());
        Ok(embeddings)
    }
}
