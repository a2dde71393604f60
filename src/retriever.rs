/// In-memory retrieval index over transcript chunks.
///
/// Holds the chunk list and its embedding matrix as one immutable
/// snapshot: row i of the matrix is always the embedding of chunk i. The
/// snapshot is built once at startup and only read afterwards, so it can
/// be shared freely across queries.
///
/// The corpus is small (typically hundreds of chunks), so top-K is an
/// exhaustive linear scan; no index structure.
use std::cmp::Ordering;

use crate::embedder::{Embedder, EmbedderError};

/// How many chunks to send to the embedder per request during the
/// startup build.
const BUILD_BATCH_SIZE: usize = 32;

/// One retrieval hit: the chunk's position in the corpus and its cosine
/// similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub index: usize,
    pub score: f32,
}

/// Immutable snapshot of chunks and their embeddings.
pub struct CorpusIndex {
    chunks: Vec<String>,
    embeddings: Vec<Vec<f32>>,
}

impl CorpusIndex {
    /// Embed `chunks` and build the index. Chunk order is preserved; the
    /// matrix is appended in lockstep so row/chunk alignment holds by
    /// construction.
    pub fn build(chunks: Vec<String>, embedder: &dyn Embedder) -> Result<Self, EmbedderError> {
        Self::build_with_progress(chunks, embedder, |_, _| {})
    }

    /// Like [`build`](Self::build), reporting `(embedded_so_far, total)`
    /// after each batch.
    pub fn build_with_progress<F>(
        chunks: Vec<String>,
        embedder: &dyn Embedder,
        mut on_progress: F,
    ) -> Result<Self, EmbedderError>
    where
        F: FnMut(usize, usize),
    {
        let total = chunks.len();
        let mut embeddings = Vec::with_capacity(total);

        for batch in chunks.chunks(BUILD_BATCH_SIZE) {
            let texts: Vec<&str> = batch.iter().map(String::as_str).collect();
            embeddings.extend(embedder.embed_batch(&texts)?);
            on_progress(embeddings.len(), total);
        }

        debug_assert_eq!(embeddings.len(), chunks.len());
        Ok(Self { chunks, embeddings })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// The chunk text at `index`. Panics if out of range, like slice
    /// indexing; callers only pass indices returned by [`top_k`](Self::top_k).
    #[must_use]
    pub fn chunk(&self, index: usize) -> &str {
        &self.chunks[index]
    }

    #[must_use]
    pub fn embedding(&self, index: usize) -> &[f32] {
        &self.embeddings[index]
    }

    /// Score every chunk against `query` and return the best
    /// `min(k, len)` hits, ordered by descending score, ties by ascending
    /// chunk index. Deterministic for identical inputs.
    #[must_use]
    pub fn top_k(&self, query: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<ScoredChunk> = self
            .embeddings
            .iter()
            .enumerate()
            .map(|(index, v)| ScoredChunk {
                index,
                score: cosine_similarity(query, v),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.index.cmp(&b.index))
        });
        scored.truncate(k.min(self.chunks.len()));
        scored
    }
}

/// Cosine similarity between two vectors. Returns 0.0 when either vector
/// has zero norm (a pathological embedding, not empty input) so the
/// degenerate case never divides by zero.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
