//! Recursive map-reduce summarization with bounded depth
//!
//! Text that fits `max_length` is summarized in one call. Longer text is
//! packed into chunks, each chunk is summarized, and the labelled summaries
//! are combined. If the combination is still too long the same procedure
//! runs on it, at most `max_recursion` more times.

use futures::stream::{self, StreamExt};
use std::sync::Arc;

use crate::config::{MergePolicy, SummarizationConfig};
use crate::generation::PromptBuilder;
use crate::ingestion::packer::pack;
use crate::providers::TextGenerator;
use crate::state::RagContext;
use crate::types::{Document, SummaryUnit};

/// Returned when no summary could be produced for a text
pub const SUMMARY_FAILED: &str = "summary generation failed";

/// Stands in for a chunk whose summary call failed
pub const CHUNK_SUMMARY_FAILED: &str = "[summary of this part failed]";

/// Recursive summarizer over a text generation model
pub struct RecursiveSummarizer {
    generator: Arc<dyn TextGenerator>,
    config: SummarizationConfig,
}

impl RecursiveSummarizer {
    pub fn new(generator: Arc<dyn TextGenerator>, config: SummarizationConfig) -> Self {
        Self { generator, config }
    }

    /// Summarizer using the context's generator and summarization settings
    pub fn from_context(ctx: &RagContext) -> Self {
        Self::new(Arc::clone(ctx.generator()), ctx.config().summarization.clone())
    }

    pub fn config(&self) -> &SummarizationConfig {
        &self.config
    }

    /// Summarize one text with the configured depth and length
    pub async fn summarize_text(&self, text: &str) -> String {
        let units = [SummaryUnit::Raw(text.to_string())];
        self.summarize(&units, self.config.max_recursion, self.config.max_length)
            .await
    }

    /// Summarize one document's content
    pub async fn summarize_document(&self, document: &Document) -> String {
        tracing::info!(
            "Summarizing '{}' ({} chars)",
            document.source,
            document.char_len()
        );
        self.summarize_text(&document.content).await
    }

    /// Summarize several documents as one text
    ///
    /// Contents are joined with a blank line; an empty batch is summarized
    /// as empty text.
    pub async fn summarize_documents(&self, documents: &[Document]) -> String {
        let units: Vec<SummaryUnit> = documents
            .iter()
            .map(|d| SummaryUnit::Raw(d.content.clone()))
            .collect();

        tracing::info!("Summarizing {} documents together", documents.len());
        self.summarize(&units, self.config.max_recursion, self.config.max_length)
            .await
    }

    /// Reduce `units` to a summary of at most roughly `max_length` chars
    ///
    /// Never fails. A failed chunk is replaced by a placeholder; when nothing
    /// at all could be summarized the result is [`SUMMARY_FAILED`]. At most
    /// `max_recursion + 1` chunked passes run; after the last one the text is
    /// truncated to `max_length` chars plus `"..."`.
    pub async fn summarize(
        &self,
        units: &[SummaryUnit],
        max_recursion: u32,
        max_length: usize,
    ) -> String {
        let mut level: Vec<SummaryUnit> = units.to_vec();
        let mut remaining = max_recursion;

        loop {
            let text = join_units(&level);
            let text_len = text.chars().count();

            if text_len <= max_length {
                return self.summarize_direct(&text).await;
            }

            let chunks = pack(&text, self.config.chunk_size);
            tracing::info!(
                "Text of {} chars split into {} chunks (recursion left: {})",
                text_len,
                chunks.len(),
                remaining
            );

            let summaries = self.summarize_chunks(&chunks).await;
            if summaries.iter().all(Option::is_none) {
                tracing::error!("All {} chunk summaries failed", chunks.len());
                return SUMMARY_FAILED.to_string();
            }

            let combined = combine_parts(&summaries);
            let combined_len = combined.chars().count();

            if remaining == 0 {
                tracing::warn!(
                    "Maximum recursion depth reached, truncating {} chars to {}",
                    combined_len,
                    max_length
                );
                let last = self.apply_merge_policy(combined).await;
                return truncate_chars(&last, max_length);
            }

            if combined_len > max_length {
                tracing::info!(
                    "Combined summary still {} chars, summarizing again",
                    combined_len
                );
                level = vec![SummaryUnit::Partial(combined)];
                remaining -= 1;
                continue;
            }

            return self.apply_merge_policy(combined).await;
        }
    }

    async fn apply_merge_policy(&self, combined: String) -> String {
        match self.config.merge_policy {
            MergePolicy::ShortCircuit => combined,
            MergePolicy::AlwaysMerge => self.merge(combined).await,
        }
    }

    async fn summarize_direct(&self, text: &str) -> String {
        let prompt = PromptBuilder::build_summary_prompt(text);
        match self.generator.generate(&prompt).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!("Summary generation failed: {}", e);
                SUMMARY_FAILED.to_string()
            }
        }
    }

    /// One entry per chunk, in chunk order; `None` marks a failed chunk
    async fn summarize_chunks(&self, chunks: &[String]) -> Vec<Option<String>> {
        let total = chunks.len();

        stream::iter(chunks.iter().enumerate())
            .map(|(i, chunk)| async move {
                let prompt = PromptBuilder::build_summary_prompt(chunk);
                match self.generator.generate(&prompt).await {
                    Ok(summary) => {
                        tracing::debug!("Summarized chunk {}/{}", i + 1, total);
                        Some(summary)
                    }
                    Err(e) => {
                        tracing::error!("Summary of chunk {}/{} failed: {}", i + 1, total, e);
                        None
                    }
                }
            })
            .buffered(self.config.summary_concurrency.max(1))
            .collect()
            .await
    }

    async fn merge(&self, combined: String) -> String {
        let prompt = PromptBuilder::build_merge_prompt(&combined);
        match self.generator.generate(&prompt).await {
            Ok(merged) => merged,
            Err(e) => {
                tracing::warn!("Merge of chunk summaries failed, keeping parts: {}", e);
                combined
            }
        }
    }
}

fn join_units(units: &[SummaryUnit]) -> String {
    units
        .iter()
        .map(SummaryUnit::text)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn combine_parts(summaries: &[Option<String>]) -> String {
    summaries
        .iter()
        .enumerate()
        .map(|(i, s)| format!("Part {}:\n{}", i + 1, s.as_deref().unwrap_or(CHUNK_SUMMARY_FAILED)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn truncate_chars(text: &str, max_length: usize) -> String {
    match text.char_indices().nth(max_length) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
