//! Retrieval candidates and ranked results

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One vector-index hit, before reranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCandidate {
    /// Stored chunk text
    pub content: String,
    /// Stored chunk metadata
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Raw backend score (distance or similarity, see `ScoreKind`)
    pub vector_score: f32,
}

impl SearchCandidate {
    pub fn new(content: impl Into<String>, vector_score: f32) -> Self {
        Self {
            content: content.into(),
            metadata: HashMap::new(),
            vector_score,
        }
    }

    /// Value of a string metadata field
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

/// A candidate annotated with rerank and fused scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub content: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Raw backend score, unchanged by normalization
    pub vector_score: f32,
    /// Cross-encoder relevance
    pub rerank_score: f32,
    /// Weighted fusion of the two, used for ordering
    pub final_score: f32,
}

impl ScoredResult {
    pub fn from_candidate(candidate: SearchCandidate, rerank_score: f32, final_score: f32) -> Self {
        Self {
            content: candidate.content,
            metadata: candidate.metadata,
            vector_score: candidate.vector_score,
            rerank_score,
            final_score,
        }
    }
}
