//! Core value types for documents, retrieval and summarization

pub mod document;
pub mod search;
pub mod summary;

pub use document::{Chunk, Document};
pub use search::{ScoredResult, SearchCandidate};
pub use summary::SummaryUnit;
