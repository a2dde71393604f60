/// Embedder trait and shared types for text embedding.
///
/// The embedding model is an external capability: text in, fixed-dimension
/// vector out. The concrete implementation talks to a local Ollama server.
pub mod mock;
pub mod ollama;

use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Error, Debug)]
pub enum EmbedderError {
    #[error("embedding request failed: {0}")]
    RequestFailed(String),

    #[error("embedding endpoint returned status {0}")]
    BadStatus(reqwest::StatusCode),

    #[error("malformed embedding response: {0}")]
    MalformedResponse(String),
}

/// Trait for text embedding implementations.
///
/// All implementations must be `Send + Sync` to allow concurrent use
/// behind `Arc`.
pub trait Embedder: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError>;

    /// Embed multiple text strings into vectors, one per input, in order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError>;

    /// Return the dimensionality of the embedding vectors.
    fn dimensions(&self) -> usize;
}
