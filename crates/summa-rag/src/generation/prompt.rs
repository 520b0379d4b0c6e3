//! Prompt templates for summarization, merging and RAG answers

use crate::types::ScoredResult;

/// Prompt builder for the generation model
pub struct PromptBuilder;

impl PromptBuilder {
    /// Prompt asking for a summary of raw document content
    pub fn build_summary_prompt(content: &str) -> String {
        format!(
            r#"Summarize the following document content. Extract the main topics, key points and important details.
Produce a comprehensive but concise summary that keeps the core of the document.

Document content:
{content}

Summary:"#,
            content = content
        )
    }

    /// Prompt asking to merge partial summaries of one document
    pub fn build_merge_prompt(summaries: &str) -> String {
        format!(
            r#"Below are several summaries of different parts of the same document. Combine them into one coherent, complete overall summary.
Make sure the final summary covers all important information and reads as logically connected, well-structured prose.

Partial summaries:
{summaries}

Combined summary:"#,
            summaries = summaries
        )
    }

    /// Number retrieved results as `Document {i}:` blocks
    pub fn build_context(results: &[ScoredResult]) -> String {
        results
            .iter()
            .enumerate()
            .map(|(i, r)| format!("Document {}:\n{}", i + 1, r.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Prompt answering a question from retrieved context only
    pub fn build_rag_prompt(question: &str, context: &str) -> String {
        format!(
            r#"Use the following retrieved context to answer the question. If you don't know the answer, say that you don't know; do not try to make one up.

Context:
{context}

Question: {question}

Answer:"#,
            context = context,
            question = question
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_prompts_are_distinct() {
        let summary = PromptBuilder::build_summary_prompt("x");
        let merge = PromptBuilder::build_merge_prompt("x");
        let rag = PromptBuilder::build_rag_prompt("x", "x");

        assert_ne!(summary, merge);
        assert_ne!(summary, rag);
        assert_ne!(merge, rag);
        assert!(summary.contains("Document content:\nx"));
        assert!(merge.contains("Partial summaries:\nx"));
    }

    #[test]
    fn test_build_context_numbering() {
        let result = |content: &str| ScoredResult {
            content: content.to_string(),
            metadata: HashMap::new(),
            vector_score: 0.1,
            rerank_score: 0.9,
            final_score: 0.9,
        };
        let context = PromptBuilder::build_context(&[result("alpha"), result("beta")]);
        assert_eq!(context, "Document 1:\nalpha\n\nDocument 2:\nbeta");
    }
}
