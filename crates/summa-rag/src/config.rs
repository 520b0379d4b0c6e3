//! Configuration for the RAG core

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Upper bound on per-request retries for the HTTP collaborators
pub const MAX_RETRIES: u32 = 10;

/// Main RAG configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Ollama/LLM configuration
    pub llm: LlmConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Cross-encoder reranker configuration
    pub reranker: RerankerConfig,
    /// Vector database configuration
    pub vector_db: VectorDbConfig,
    /// Retrieval chunking configuration
    pub chunking: ChunkingConfig,
    /// Hybrid retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Summarization configuration
    pub summarization: SummarizationConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file
    ///
    /// Missing sections and fields fall back to their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&raw)?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: RagConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SUMMA_*` environment variable overrides on top of this config
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup (used by `with_env_overrides`)
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(key: &str, value: String) -> Result<T> {
            value
                .parse::<T>()
                .map_err(|_| Error::config(format!("Invalid value for {}: {:?}", key, value)))
        }

        if let Some(v) = lookup("SUMMA_OLLAMA_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Some(v) = lookup("SUMMA_OLLAMA_MODEL") {
            self.llm.generate_model = v;
        }
        if let Some(v) = lookup("SUMMA_OLLAMA_EMBED_MODEL") {
            self.llm.embed_model = v;
        }
        if let Some(v) = lookup("SUMMA_RERANKER_URL") {
            self.reranker.base_url = v;
        }
        if let Some(v) = lookup("SUMMA_RERANKER_MODEL") {
            self.reranker.model = v;
        }
        if let Some(v) = lookup("SUMMA_VECTOR_BACKEND") {
            self.vector_db.backend = parse("SUMMA_VECTOR_BACKEND", v)?;
        }
        if let Some(v) = lookup("SUMMA_VECTOR_STORE_PATH") {
            self.vector_db.storage_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("SUMMA_QDRANT_URL") {
            self.vector_db.qdrant_url = v;
        }
        if let Some(v) = lookup("SUMMA_QDRANT_COLLECTION") {
            self.vector_db.qdrant_collection = v;
        }
        if let Some(v) = lookup("SUMMA_SUMMARY_MAX_RECURSION") {
            self.summarization.max_recursion = parse("SUMMA_SUMMARY_MAX_RECURSION", v)?;
        }
        if let Some(v) = lookup("SUMMA_SUMMARY_MAX_LENGTH") {
            self.summarization.max_length = parse("SUMMA_SUMMARY_MAX_LENGTH", v)?;
        }
        if let Some(v) = lookup("SUMMA_TOP_K") {
            self.retrieval.top_k = parse("SUMMA_TOP_K", v)?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject configurations the core cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.embeddings.dimensions == 0 {
            return Err(Error::config("embeddings.dimensions must be > 0"));
        }
        if self.chunking.chunk_size == 0 {
            return Err(Error::config("chunking.chunk_size must be > 0"));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::config("chunking.chunk_overlap must be smaller than chunk_size"));
        }
        if self.retrieval.oversample == 0 {
            return Err(Error::config("retrieval.oversample must be > 0"));
        }
        let weights = [self.retrieval.vector_weight, self.retrieval.rerank_weight];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::config("retrieval weights must be finite and non-negative"));
        }
        if self.llm.max_retries > MAX_RETRIES || self.reranker.max_retries > MAX_RETRIES {
            return Err(Error::config(format!("max_retries must be at most {}", MAX_RETRIES)));
        }
        if self.summarization.max_length == 0 {
            return Err(Error::config("summarization.max_length must be > 0"));
        }
        if self.summarization.chunk_size == 0 {
            return Err(Error::config("summarization.chunk_size must be > 0"));
        }
        if self.summarization.summary_concurrency == 0 {
            return Err(Error::config("summarization.summary_concurrency must be > 0"));
        }
        Ok(())
    }
}

/// LLM (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub embed_model: String,
    /// Generation model name
    pub generate_model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
    /// Context window size (tokens)
    pub context_size: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            generate_model: "llama3".to_string(),
            temperature: 0.3,
            timeout_secs: 120,
            max_retries: 2,
            context_size: 8192,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding dimensions (768 for nomic-embed-text)
    pub dimensions: usize,
    /// Texts per embedding batch during ingestion
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimensions: 768,
            batch_size: 32,
        }
    }
}

/// Cross-encoder reranker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankerConfig {
    /// Base URL of the rerank service (`POST {base_url}/rerank`)
    pub base_url: String,
    /// Cross-encoder model name
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".to_string(),
            model: "cross-encoder/ms-marco-MiniLM-L-6-v2".to_string(),
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

/// Vector backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    /// Process-local index, lost on restart
    Memory,
    /// Local index persisted to a JSON snapshot
    #[default]
    Disk,
    /// Remote Qdrant cluster
    Qdrant,
}

impl std::str::FromStr for VectorBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "disk" => Ok(Self::Disk),
            "qdrant" => Ok(Self::Qdrant),
            other => Err(Error::config(format!("Unknown vector backend: {}", other))),
        }
    }
}

/// Vector database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    /// Which backend serves the index
    pub backend: VectorBackend,
    /// Snapshot path for the disk backend (also the fallback target)
    pub storage_path: PathBuf,
    /// Qdrant REST URL
    pub qdrant_url: String,
    /// Qdrant collection name
    pub qdrant_collection: String,
    /// Optional Qdrant API key
    pub qdrant_api_key: Option<String>,
    /// Serve from a local disk index when the Qdrant cluster fails
    pub fallback_to_local: bool,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        let storage_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("./data"))
            .join("summa-rag")
            .join("vectorstore.json");

        Self {
            backend: VectorBackend::Disk,
            storage_path,
            qdrant_url: "http://localhost:6333".to_string(),
            qdrant_collection: "document_store".to_string(),
            qdrant_api_key: None,
            fallback_to_local: true,
        }
    }
}

/// Retrieval chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between chunks in characters
    pub chunk_overlap: usize,
    /// Minimum chunk size (skip smaller chunks)
    pub min_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            min_chunk_size: 1,
        }
    }
}

/// How backend scores are treated before fusion
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScoreNormalization {
    /// Treat every raw score as a distance in [0, 1]
    #[default]
    AsDistance,
    /// Invert similarity-scored backends before fusion
    PerBackend,
}

/// Hybrid retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Default number of results
    pub top_k: usize,
    /// Candidate pool multiplier handed to the reranker
    pub oversample: usize,
    /// Weight of the (inverted) vector score
    pub vector_weight: f32,
    /// Weight of the rerank score
    pub rerank_weight: f32,
    /// Score semantics applied during fusion
    pub score_normalization: ScoreNormalization,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            oversample: 2,
            vector_weight: 0.3,
            rerank_weight: 0.7,
            score_normalization: ScoreNormalization::AsDistance,
        }
    }
}

/// What happens once chunk summaries already fit under the target length
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Return the labelled chunk summaries as-is
    #[default]
    ShortCircuit,
    /// Run one merge prompt over the chunk summaries, including the final
    /// pass that is truncated once the recursion depth is used up
    AlwaysMerge,
}

/// Summarization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizationConfig {
    /// Maximum merge-and-recurse passes before forced truncation
    pub max_recursion: u32,
    /// Target summary length in characters
    pub max_length: usize,
    /// Packer chunk size used when the input is too long
    pub chunk_size: usize,
    /// Merge behavior once summaries fit
    pub merge_policy: MergePolicy,
    /// Chunk summaries generated concurrently (1 = sequential)
    pub summary_concurrency: usize,
}

impl Default for SummarizationConfig {
    fn default() -> Self {
        Self {
            max_recursion: 3,
            max_length: 2000,
            chunk_size: 4000,
            merge_policy: MergePolicy::ShortCircuit,
            summary_concurrency: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = RagConfig::default();
        assert_eq!(config.summarization.max_recursion, 3);
        assert_eq!(config.summarization.max_length, 2000);
        assert_eq!(config.summarization.chunk_size, 4000);
        assert_eq!(config.retrieval.oversample, 2);
        assert!((config.retrieval.vector_weight - 0.3).abs() < f32::EPSILON);
        assert!((config.retrieval.rerank_weight - 0.7).abs() < f32::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let raw = r#"
            [summarization]
            max_length = 3000
            merge_policy = "always_merge"

            [vector_db]
            backend = "memory"
        "#;

        let config = RagConfig::from_toml_str(raw).unwrap();
        assert_eq!(config.summarization.max_length, 3000);
        assert_eq!(config.summarization.max_recursion, 3);
        assert_eq!(config.summarization.merge_policy, MergePolicy::AlwaysMerge);
        assert_eq!(config.vector_db.backend, VectorBackend::Memory);
        assert_eq!(config.llm.generate_model, "llama3");
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let raw = r#"
            [summarization]
            max_length = 0
        "#;
        assert!(matches!(RagConfig::from_toml_str(raw), Err(Error::Config(_))));
    }

    #[test]
    fn test_overrides() {
        let mut vars = HashMap::new();
        vars.insert("SUMMA_VECTOR_BACKEND", "qdrant");
        vars.insert("SUMMA_SUMMARY_MAX_LENGTH", "3500");
        vars.insert("SUMMA_OLLAMA_MODEL", "qwen2");

        let config = RagConfig::default()
            .with_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.vector_db.backend, VectorBackend::Qdrant);
        assert_eq!(config.summarization.max_length, 3500);
        assert_eq!(config.llm.generate_model, "qwen2");
    }

    #[test]
    fn test_non_finite_weights_rejected() {
        let mut config = RagConfig::default();
        config.retrieval.vector_weight = f32::NAN;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.retrieval.vector_weight = 0.3;
        config.retrieval.rerank_weight = f32::INFINITY;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_retries_capped() {
        let mut config = RagConfig::default();
        config.llm.max_retries = MAX_RETRIES;
        assert!(config.validate().is_ok());

        config.llm.max_retries = MAX_RETRIES + 1;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.llm.max_retries = 2;
        config.reranker.max_retries = u32::MAX;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_bad_override() {
        let result = RagConfig::default()
            .with_overrides(|k| (k == "SUMMA_TOP_K").then(|| "many".to_string()));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
