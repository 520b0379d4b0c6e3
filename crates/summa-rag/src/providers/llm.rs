//! Text generation provider

use async_trait::async_trait;

use crate::error::Result;

/// Prompt in, text out
///
/// Used for per-chunk summaries, summary merges and RAG answers. Prompts
/// are fully rendered by `PromptBuilder` before they reach the model.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;

    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logs
    fn name(&self) -> &str;

    /// Model identifier, e.g. `llama3`
    fn model(&self) -> &str;
}
