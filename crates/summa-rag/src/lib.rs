//! summa-rag: hybrid retrieval and recursive summarization for document RAG
//!
//! Documents are chunked, embedded and stored in a vector index, and each one
//! gets a bounded-length summary from the recursive summarizer. Queries run a
//! vector search, rerank the candidates with a cross-encoder and fuse both
//! scores before handing the top results to the generation model.
//!
//! Models and storage are reached through the traits in [`providers`]; the
//! shared [`RagContext`] wires them together.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod state;
pub mod summarization;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use generation::{Answer, AnswerGenerator};
pub use ingestion::{IngestPipeline, IngestReport};
pub use retrieval::HybridSearcher;
pub use state::RagContext;
pub use summarization::RecursiveSummarizer;
pub use types::{Chunk, Document, ScoredResult, SearchCandidate, SummaryUnit};
