/// Text embedding via a local Ollama server.
///
/// Wraps the `/api/embed` endpoint: a batch of strings in, one
/// fixed-dimension vector per string out. The model itself is a black box;
/// this module only does the HTTP plumbing.
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{Embedder, EmbedderError};

/// Per-request timeout. Corpus batches can be large and the first request
/// may trigger a model load on the server side.
const EMBED_TIMEOUT_SECS: u64 = 120;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embedder backed by Ollama's `/api/embed` endpoint.
pub struct OllamaEmbedder {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedder {
    /// Create an embedder for `model` served at `base_url`
    /// (e.g. `http://localhost:11434`).
    pub fn new(base_url: &str, model: &str, dimensions: usize) -> Result<Self, EmbedderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(EMBED_TIMEOUT_SECS))
            .build()
            .map_err(|e| EmbedderError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/embed", base_url.trim_end_matches('/')),
            model: model.to_string(),
            dimensions,
        })
    }

    fn request(&self, input: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest {
                model: &self.model,
                input,
            })
            .send()
            .map_err(|e| EmbedderError::RequestFailed(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(EmbedderError::BadStatus(resp.status()));
        }

        let body: EmbedResponse = resp
            .json()
            .map_err(|e| EmbedderError::MalformedResponse(e.to_string()))?;

        if body.embeddings.len() != input.len() {
            return Err(EmbedderError::MalformedResponse(format!(
                "expected {} vectors, got {}",
                input.len(),
                body.embeddings.len()
            )));
        }
        for v in &body.embeddings {
            if v.len() != self.dimensions {
                return Err(EmbedderError::MalformedResponse(format!(
                    "expected {}-dimensional vectors, got {}",
                    self.dimensions,
                    v.len()
                )));
            }
        }

        Ok(body.embeddings)
    }
}

impl Embedder for OllamaEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let mut vectors = self.request(&[text])?;
        vectors
            .pop()
            .ok_or_else(|| EmbedderError::MalformedResponse("empty embeddings array".into()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
