//! Local vector index backends
//!
//! `InMemoryIndex` is a brute-force cosine index guarded by a `RwLock`.
//! `DiskIndex` wraps it and rewrites a JSON snapshot after every upsert.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{Chunk, SearchCandidate};

use super::vector_store::{ScoreKind, VectorIndex};

/// One stored point
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredVector {
    id: String,
    vector: Vec<f32>,
    content: String,
    metadata: HashMap<String, serde_json::Value>,
}

impl StoredVector {
    fn to_candidate(&self, vector_score: f32) -> SearchCandidate {
        SearchCandidate {
            content: self.content.clone(),
            metadata: self.metadata.clone(),
            vector_score,
        }
    }
}

/// Cosine distance scaled to [0, 1]: 0 for identical direction, 1 for opposite
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        // Zero vectors carry no direction
        return 1.0;
    }

    let cosine = (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0);
    (1.0 - cosine) / 2.0
}

/// Process-local brute-force vector index
pub struct InMemoryIndex {
    dimensions: usize,
    entries: RwLock<Vec<StoredVector>>,
}

impl InMemoryIndex {
    /// Create an empty index for vectors of `dimensions`
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            entries: RwLock::new(Vec::new()),
        }
    }

    fn from_entries(dimensions: usize, entries: Vec<StoredVector>) -> Self {
        Self {
            dimensions,
            entries: RwLock::new(entries),
        }
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(Error::vector_db(format!(
                "Dimension mismatch: expected {}, got {}",
                self.dimensions,
                vector.len()
            )));
        }
        Ok(())
    }

    fn check_batch(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()> {
        if chunks.len() != embeddings.len() {
            return Err(Error::vector_db(format!(
                "Got {} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }
        for embedding in embeddings {
            self.check_dimensions(embedding)?;
        }
        Ok(())
    }

    fn upsert_sync(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<usize> {
        self.check_batch(chunks, embeddings)?;
        merge_into(&mut self.entries.write(), chunks, embeddings);
        Ok(chunks.len())
    }

    fn search_sync(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchCandidate>> {
        self.check_dimensions(query_embedding)?;

        let entries = self.entries.read();
        let mut scored: Vec<(f32, &StoredVector)> = entries
            .iter()
            .map(|e| (cosine_distance(query_embedding, &e.vector), e))
            .collect();

        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(distance, entry)| entry.to_candidate(distance))
            .collect())
    }

    fn filter_sync(&self, key: &str, value: &serde_json::Value, limit: usize) -> Vec<SearchCandidate> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.metadata.get(key) == Some(value))
            .take(limit)
            .map(|e| e.to_candidate(0.0))
            .collect()
    }

    fn snapshot(&self) -> Vec<StoredVector> {
        self.entries.read().clone()
    }

    fn replace(&self, entries: Vec<StoredVector>) {
        *self.entries.write() = entries;
    }
}

/// Insert new points, replacing any with the same chunk id
fn merge_into(entries: &mut Vec<StoredVector>, chunks: &[Chunk], embeddings: &[Vec<f32>]) {
    for (chunk, embedding) in chunks.iter().zip(embeddings) {
        let stored = StoredVector {
            id: chunk.id.to_string(),
            vector: embedding.clone(),
            content: chunk.content.clone(),
            metadata: chunk.to_vector_metadata(),
        };

        match entries.iter_mut().find(|e| e.id == stored.id) {
            Some(existing) => *existing = stored,
            None => entries.push(stored),
        }
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn upsert(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<usize> {
        self.upsert_sync(chunks, embeddings)
    }

    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchCandidate>> {
        self.search_sync(query_embedding, k)
    }

    async fn get_by_filter(
        &self,
        key: &str,
        value: &serde_json::Value,
        limit: usize,
    ) -> Result<Vec<SearchCandidate>> {
        Ok(self.filter_sync(key, value, limit))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.read().len())
    }

    fn score_kind(&self) -> ScoreKind {
        ScoreKind::Distance
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    dimensions: usize,
    entries: Vec<StoredVector>,
}

/// In-memory index persisted to a JSON snapshot file
pub struct DiskIndex {
    path: PathBuf,
    inner: InMemoryIndex,
    /// Serializes upserts so each snapshot write sees the previous one
    write_lock: tokio::sync::Mutex<()>,
}

impl DiskIndex {
    /// Open the snapshot at `path`, starting empty if it does not exist
    pub async fn open(path: impl AsRef<Path>, dimensions: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let inner = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
                if snapshot.dimensions != dimensions {
                    return Err(Error::vector_db(format!(
                        "Snapshot {} has dimension {}, expected {}",
                        path.display(),
                        snapshot.dimensions,
                        dimensions
                    )));
                }
                tracing::info!(
                    "Loaded {} vectors from {}",
                    snapshot.entries.len(),
                    path.display()
                );
                InMemoryIndex::from_entries(dimensions, snapshot.entries)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No snapshot at {}, starting empty", path.display());
                InMemoryIndex::new(dimensions)
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            inner,
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Snapshot file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec(snapshot)?;

        // Write-then-rename: readers never see a partial snapshot
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        Ok(())
    }
}

#[async_trait]
impl VectorIndex for DiskIndex {
    async fn upsert(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<usize> {
        self.inner.check_batch(chunks, embeddings)?;
        let _guard = self.write_lock.lock().await;

        // Searchable only once the snapshot holding it is on disk
        let mut snapshot = Snapshot {
            dimensions: self.inner.dimensions,
            entries: self.inner.snapshot(),
        };
        merge_into(&mut snapshot.entries, chunks, embeddings);
        self.persist(&snapshot).await?;

        self.inner.replace(snapshot.entries);
        Ok(chunks.len())
    }

    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchCandidate>> {
        self.inner.search_sync(query_embedding, k)
    }

    async fn get_by_filter(
        &self,
        key: &str,
        value: &serde_json::Value,
        limit: usize,
    ) -> Result<Vec<SearchCandidate>> {
        Ok(self.inner.filter_sync(key, value, limit))
    }

    async fn len(&self) -> Result<usize> {
        self.inner.len().await
    }

    fn score_kind(&self) -> ScoreKind {
        ScoreKind::Distance
    }

    async fn health_check(&self) -> Result<bool> {
        // Not yet persisted counts as healthy
        Ok(tokio::fs::metadata(&self.path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(true))
    }

    fn name(&self) -> &str {
        "disk"
    }
}
