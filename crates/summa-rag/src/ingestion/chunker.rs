//! Sentence-aware chunking with overlap and position tracking

use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;
use crate::types::{Chunk, Document};

/// Text chunker with configurable size and overlap
///
/// Produces the retrieval chunks stored in the vector index. Sizes and
/// positions are in characters.
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between chunks
    overlap: usize,
    /// Minimum chunk size
    min_size: usize,
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            overlap: overlap.min(chunk_size.saturating_sub(1)),
            min_size: 1,
        }
    }

    /// Create from configuration
    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap).with_min_size(config.min_chunk_size)
    }

    /// Drop chunks shorter than `min_size` characters
    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size;
        self
    }

    /// Chunk a document
    pub fn chunk_document(&self, doc: &Document) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        let mut current_chunk = String::new();
        let mut current_len = 0usize;
        let mut current_start = 0usize;
        let mut chunk_index = 0u32;
        let mut char_pos = 0usize;

        for sentence in doc.content.split_sentence_bounds() {
            let sentence_len = sentence.chars().count();

            // If adding this sentence exceeds chunk size, save current chunk
            if current_len > 0 && current_len + sentence_len > self.chunk_size {
                if self.emit(doc, &current_chunk, current_start, char_pos, chunk_index, &mut chunks) {
                    chunk_index += 1;
                }

                // Start new chunk with overlap
                current_chunk = self.overlap_text(&current_chunk);
                current_len = current_chunk.chars().count();
                current_start = char_pos - current_len;
            }

            current_chunk.push_str(sentence);
            current_len += sentence_len;
            char_pos += sentence_len;
        }

        // Save final chunk
        self.emit(doc, &current_chunk, current_start, char_pos, chunk_index, &mut chunks);

        chunks
    }

    fn emit(
        &self,
        doc: &Document,
        text: &str,
        char_start: usize,
        char_end: usize,
        chunk_index: u32,
        chunks: &mut Vec<Chunk>,
    ) -> bool {
        let content = text.trim();
        if content.is_empty() || content.chars().count() < self.min_size {
            return false;
        }

        chunks.push(Chunk::new(doc, content.to_string(), char_start, char_end, chunk_index));
        true
    }

    /// Get overlap text from the end of a chunk, starting on a word boundary
    fn overlap_text(&self, text: &str) -> String {
        if self.overlap == 0 {
            return String::new();
        }

        let total = text.chars().count();
        if total <= self.overlap {
            return text.to_string();
        }

        let start = text
            .char_indices()
            .nth(total - self.overlap)
            .map(|(i, _)| i)
            .unwrap_or(0);
        let tail = &text[start..];

        // Try to start at a sentence boundary, then a word boundary
        if let Some(pos) = tail.find(". ").filter(|&p| p + 2 < tail.len()) {
            return tail[pos + 2..].to_string();
        }
        if let Some(pos) = tail.find(' ') {
            return tail[pos + 1..].to_string();
        }

        tail.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(content: &str) -> Document {
        Document::new("test.txt", content)
    }

    #[test]
    fn test_short_document_single_chunk() {
        let d = doc("One sentence. Two sentences.");
        let chunks = TextChunker::new(500, 50).chunk_document(&d);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "One sentence. Two sentences.");
        assert_eq!(chunks[0].char_start, 0);
        assert_eq!(chunks[0].char_end, d.char_len());
        assert_eq!(chunks[0].document_id, d.id);
    }

    #[test]
    fn test_chunks_respect_size_and_order() {
        let text = (0..20)
            .map(|i| format!("Sentence number {i} is here."))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = TextChunker::new(100, 0).chunk_document(&doc(&text));

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i as u32);
            assert!(chunk.content.chars().count() <= 100);
        }
        assert!(chunks[0].content.starts_with("Sentence number 0"));
        assert!(chunks.last().unwrap().content.ends_with("Sentence number 19 is here."));
    }

    #[test]
    fn test_overlap_repeats_tail() {
        let text = "Alpha beta gamma delta. Epsilon zeta eta theta. Iota kappa lambda mu.";
        let chunks = TextChunker::new(30, 15).chunk_document(&doc(text));

        assert!(chunks.len() >= 2);
        assert!(chunks[1].char_start < chunks[0].char_end);
        let chars: Vec<char> = text.chars().collect();
        let span: String = chars[chunks[1].char_start..chunks[1].char_end].iter().collect();
        assert_eq!(span.trim(), chunks[1].content);
    }

    #[test]
    fn test_min_size_drops_fragments() {
        let chunker = TextChunker::new(500, 0).with_min_size(20);
        assert!(chunker.chunk_document(&doc("Tiny.")).is_empty());
        assert!(TextChunker::new(500, 0).chunk_document(&doc("   ")).is_empty());
    }

    #[test]
    fn test_positions_count_chars() {
        let d = doc("文档一。文档二。");
        let chunks = TextChunker::new(4, 0).chunk_document(&d);
        assert_eq!(chunks.len(), 2);
        assert_eq!((chunks[1].char_start, chunks[1].char_end), (4, 8));
    }
}
