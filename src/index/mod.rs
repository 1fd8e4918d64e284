//! Vector index over document chunks.
//!
//! Embeddings come from an [`EmbeddingPort`]; similarity is brute-force
//! cosine over everything held in memory, which is plenty for the handful of
//! PDFs a single quiz session ingests.

mod embedding;

use std::future::Future;

use crate::ingest::Chunk;
use crate::{QuizError, Result};

pub use embedding::EmbeddingClient;

/// Turns text into vectors.
pub trait EmbeddingPort {
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>>>;

    /// Embed many texts in one call. `Ok(None)` means the backend has no
    /// batch mode and callers should fall back to [`EmbeddingPort::embed`].
    fn embed_batch(&self, texts: &[String]) -> impl Future<Output = Result<Option<Vec<Vec<f32>>>>> {
        let _ = texts;
        async { Ok::<Option<Vec<Vec<f32>>>, QuizError>(None) }
    }
}

/// Supplies prompt context for a topic.
pub trait Retriever {
    fn retrieve(&self, topic: &str) -> impl Future<Output = Result<String>>;
}

impl<T: Retriever + ?Sized> Retriever for &T {
    fn retrieve(&self, topic: &str) -> impl Future<Output = Result<String>> {
        (**self).retrieve(topic)
    }
}

pub trait VectorIndex {
    /// Embed and store chunks. Returns how many were added.
    fn index(&mut self, chunks: Vec<Chunk>) -> impl Future<Output = Result<usize>>;

    /// Nearest chunks to `text`, best first.
    fn query(&self, text: &str, k: usize) -> impl Future<Output = Result<Vec<ScoredChunk>>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Cosine similarity, higher is closer.
    pub score: f32,
}

struct IndexedChunk {
    chunk: Chunk,
    embedding: Vec<f32>,
}

pub struct MemoryIndex<E> {
    embedder: E,
    entries: Vec<IndexedChunk>,
    top_k: usize,
}

impl<E: EmbeddingPort> MemoryIndex<E> {
    pub fn new(embedder: E, top_k: usize) -> Self {
        Self {
            embedder,
            entries: Vec::new(),
            top_k: top_k.max(1),
        }
    }

    /// Drop every indexed chunk, keeping the embedder.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    async fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if let Some(vectors) = self.embedder.embed_batch(texts).await? {
            if vectors.len() != texts.len() {
                return Err(QuizError::transport(
                    "embedding",
                    format!("got {} vectors for {} texts", vectors.len(), texts.len()),
                ));
            }
            return Ok(vectors);
        }

        tracing::debug!("batch embedding unavailable, embedding {} texts one by one", texts.len());
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embedder.embed(text).await?);
        }
        Ok(vectors)
    }
}

impl<E: EmbeddingPort> VectorIndex for MemoryIndex<E> {
    async fn index(&mut self, chunks: Vec<Chunk>) -> Result<usize> {
        if chunks.is_empty() {
            return Err(QuizError::NoDocuments);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embed_all(&texts).await?;
        let added = chunks.len();

        self.entries.extend(
            chunks
                .into_iter()
                .zip(vectors)
                .map(|(chunk, embedding)| IndexedChunk { chunk, embedding }),
        );

        tracing::info!("Indexed {} chunks ({} total)", added, self.entries.len());
        Ok(added)
    }

    async fn query(&self, text: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        if self.entries.is_empty() {
            return Err(QuizError::NoDocuments);
        }

        let query = self.embedder.embed(text).await?;
        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(&query, &entry.embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<E: EmbeddingPort> Retriever for MemoryIndex<E> {
    async fn retrieve(&self, topic: &str) -> Result<String> {
        let results = self.query(topic, self.top_k).await?;
        if let Some(best) = results.first() {
            tracing::debug!(
                "best context for {:?}: {} page {} (score {:.3})",
                topic,
                best.chunk.source,
                best.chunk.page,
                best.score
            );
        }

        Ok(results
            .iter()
            .map(|r| r.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}

/// Cosine similarity of two vectors; 0 for mismatched or zero-length input.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
