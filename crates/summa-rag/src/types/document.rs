//! Document and chunk types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A loaded document, immutable for one processing pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Opaque source identifier (file path, upload name, external id)
    pub source: String,
    /// Raw text content
    pub content: String,
    /// When the document was loaded
    pub loaded_at: chrono::DateTime<chrono::Utc>,
    /// Loader-provided metadata
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Document {
    /// Create a new document
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            content: content.into(),
            loaded_at: chrono::Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// A retrieval chunk of a document, the unit stored in the vector index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Parent document ID
    pub document_id: Uuid,
    /// Parent document source identifier
    pub source: String,
    /// Text content
    pub content: String,
    /// Character position in original document
    pub char_start: usize,
    pub char_end: usize,
    /// Chunk index within document
    pub chunk_index: u32,
    /// Metadata inherited from the document
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Chunk {
    /// Create a new chunk of `doc`
    pub fn new(
        doc: &Document,
        content: String,
        char_start: usize,
        char_end: usize,
        chunk_index: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id: doc.id,
            source: doc.source.clone(),
            content,
            char_start,
            char_end,
            chunk_index,
            metadata: doc.metadata.clone(),
        }
    }

    /// Convert to vector metadata for storage
    ///
    /// Document metadata is carried over; the chunk's own keys win on conflict.
    pub fn to_vector_metadata(&self) -> HashMap<String, serde_json::Value> {
        let mut meta = self.metadata.clone();
        meta.insert("chunk_id".to_string(), serde_json::json!(self.id.to_string()));
        meta.insert("doc_id".to_string(), serde_json::json!(self.document_id.to_string()));
        meta.insert("source".to_string(), serde_json::json!(self.source));
        meta.insert("chunk_index".to_string(), serde_json::json!(self.chunk_index));
        meta.insert("char_start".to_string(), serde_json::json!(self.char_start));
        meta.insert("char_end".to_string(), serde_json::json!(self.char_end));
        meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_metadata_overrides_document_keys() {
        let doc = Document::new("notes.txt", "hello world")
            .with_metadata("source", serde_json::json!("stale"))
            .with_metadata("author", serde_json::json!("kim"));
        let chunk = Chunk::new(&doc, "hello".to_string(), 0, 5, 0);

        let meta = chunk.to_vector_metadata();
        assert_eq!(meta["source"], serde_json::json!("notes.txt"));
        assert_eq!(meta["author"], serde_json::json!("kim"));
        assert_eq!(meta["doc_id"], serde_json::json!(doc.id.to_string()));
    }

    #[test]
    fn test_char_len_counts_chars() {
        let doc = Document::new("zh.txt", "文档摘要");
        assert_eq!(doc.char_len(), 4);
        assert_eq!(doc.content.len(), 12);
    }
}
