//! Retrieval-augmented answers

use serde::{Deserialize, Serialize};

use crate::retrieval::HybridSearcher;
use crate::state::RagContext;
use crate::types::ScoredResult;

use super::prompt::PromptBuilder;

/// Generated answer with the context it was grounded on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub context: Vec<ScoredResult>,
}

/// Answers questions from hybrid search results
pub struct AnswerGenerator {
    ctx: RagContext,
    searcher: HybridSearcher,
}

impl AnswerGenerator {
    pub fn new(ctx: RagContext) -> Self {
        let searcher = HybridSearcher::new(ctx.clone());
        Self { ctx, searcher }
    }

    /// Retrieve the top `k` chunks and answer `question` from them
    ///
    /// A generation failure is reported in the answer text rather than as
    /// an error, so the retrieved context is still returned.
    pub async fn answer(&self, question: &str, k: usize) -> Answer {
        let context = self.searcher.search(question, k).await;
        let prompt = PromptBuilder::build_rag_prompt(question, &PromptBuilder::build_context(&context));

        let answer = match self.ctx.generator().generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Answer generation failed: {}", e);
                format!("error while generating answer: {}", e)
            }
        };

        Answer { answer, context }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::{RagConfig, VectorBackend};
    use crate::providers::{EmbeddingProvider, InMemoryIndex, VectorIndex};
    use crate::testing::{fake_context_with, HashEmbedder, ScriptedGenerator};
    use crate::types::{Chunk, Document};

    fn memory_config() -> RagConfig {
        let mut config = RagConfig::default();
        config.vector_db.backend = VectorBackend::Memory;
        config
    }

    async fn seeded(generator: Arc<ScriptedGenerator>) -> AnswerGenerator {
        let texts = vec![
            "The capital of France is Paris".to_string(),
            "Rust has no garbage collector".to_string(),
        ];
        let doc = Document::new("facts.txt", texts.join(" "));
        let chunks: Vec<Chunk> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| Chunk::new(&doc, t.clone(), 0, 0, i as u32))
            .collect();
        let index = Arc::new(InMemoryIndex::new(HashEmbedder::DIMENSIONS));
        let embeddings = HashEmbedder.embed_batch(&texts).await.unwrap();
        index.upsert(&chunks, &embeddings).await.unwrap();

        AnswerGenerator::new(fake_context_with(memory_config(), generator).with_index(index))
    }

    #[tokio::test]
    async fn test_answer_uses_numbered_context() {
        let generator = Arc::new(ScriptedGenerator::fixed("Paris"));
        let answer = seeded(generator.clone()).await.answer("capital of France", 1).await;

        assert_eq!(answer.answer, "Paris");
        assert_eq!(answer.context.len(), 1);
        let prompt = &generator.prompts()[0];
        assert!(prompt.contains("Document 1:\nThe capital of France is Paris"));
        assert!(prompt.contains("Question: capital of France"));
    }

    #[tokio::test]
    async fn test_generation_failure_in_answer_text() {
        let answer = seeded(Arc::new(ScriptedGenerator::failing()))
            .await
            .answer("capital of France", 2)
            .await;

        assert!(answer.answer.starts_with("error while generating answer: "));
        assert_eq!(answer.context.len(), 2);
    }
}
