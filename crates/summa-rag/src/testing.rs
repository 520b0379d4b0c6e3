//! Deterministic provider fakes shared by unit tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, Reranker, TextGenerator};
use crate::state::RagContext;

/// Bag-of-words embedding hashed into a few buckets
pub struct HashEmbedder;

impl HashEmbedder {
    pub const DIMENSIONS: usize = 16;
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0f32; Self::DIMENSIONS];
        for word in text.split_whitespace() {
            let word = word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
            let bucket = word.bytes().map(usize::from).sum::<usize>() % Self::DIMENSIONS;
            v[bucket] += 1.0;
        }
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        Self::DIMENSIONS
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Scores by the share of query words found in the candidate
pub struct KeywordReranker;

#[async_trait]
impl Reranker for KeywordReranker {
    async fn score(&self, query: &str, candidate: &str) -> Result<f32> {
        let candidate = candidate.to_lowercase();
        let words: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if words.is_empty() {
            return Ok(0.0);
        }
        let hits = words.iter().filter(|w| candidate.contains(w.as_str())).count();
        Ok(hits as f32 / words.len() as f32)
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

type Script = dyn Fn(usize, &str) -> Result<String> + Send + Sync;

/// Text generator driven by a closure of (call index, prompt)
pub struct ScriptedGenerator {
    script: Box<Script>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(script: impl Fn(usize, &str) -> Result<String> + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always answers `text`
    pub fn fixed(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_, _| Ok(text.clone()))
    }

    /// Always fails as if the model server were down
    pub fn failing() -> Self {
        Self::new(|_, _| Err(Error::backend_unavailable("scripted", "connection refused")))
    }

    /// Number of generate calls so far
    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }

    /// Prompts received, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let call = {
            let mut prompts = self.prompts.lock();
            prompts.push(prompt.to_string());
            prompts.len() - 1
        };
        (self.script)(call, prompt)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Context with hash embeddings, keyword reranking and a fixed generator
pub fn fake_context(config: RagConfig) -> RagContext {
    fake_context_with(config, Arc::new(ScriptedGenerator::fixed("summary")))
}

pub fn fake_context_with(config: RagConfig, generator: Arc<ScriptedGenerator>) -> RagContext {
    RagContext::new(config, Arc::new(HashEmbedder), Arc::new(KeywordReranker), generator)
}
