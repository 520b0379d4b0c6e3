//! Hybrid retrieval: vector search, reranking and score fusion

pub mod fusion;
pub mod search;

pub use fusion::{fuse_score, FusionWeights};
pub use search::HybridSearcher;
