/// Mock embedder for testing purposes.
///
/// Generates deterministic embeddings from a text hash, so tests run
/// without a live Ollama server.
use std::hash::{DefaultHasher, Hash, Hasher};

use super::{Embedder, EmbedderError};

/// A mock embedder that produces deterministic unit vectors from text
/// hashes. Similar texts do NOT get similar vectors; only identity is
/// preserved, which is enough for retrieval-pipeline tests.
pub struct MockEmbedder {
    pub dimensions: usize,
}

impl MockEmbedder {
    /// Create a new `MockEmbedder` with the given dimensionality.
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self { dimensions: 384 }
    }
}

impl Embedder for MockEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);

        // Walk a small LCG seeded by the text hash; components stay in
        // (0, 1] so any two mock vectors have positive cosine similarity.
        let mut state = hasher.finish() | 1;
        let mut embedding = Vec::with_capacity(self.dimensions);
        for _ in 0..self.dimensions {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            embedding.push(((state >> 40) as f32 + 1.0) / 16_777_216.0);
        }

        // L2 normalize
        let norm_sq: f32 = embedding.iter().map(|v| v * v).sum();
        if norm_sq > 0.0 {
            let inv = 1.0 / norm_sq.sqrt();
            for v in &mut embedding {
                *v *= inv;
            }
        }

        Ok(embedding)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
