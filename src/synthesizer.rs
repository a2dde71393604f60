/// Answer synthesis via a local Ollama server.
///
/// The language model is a black box reached over HTTP: prompt in,
/// generated text out. This module owns the prompt template, the
/// `/api/generate` call, and a best-effort server/model availability
/// probe used at startup.
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Generation can take a while on CPU-only hosts.
const GENERATE_TIMEOUT_SECS: u64 = 300;
const TAGS_TIMEOUT_SECS: u64 = 5;

/// Errors from the answer-synthesis call.
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("completion request failed: {0}")]
    RequestFailed(String),

    #[error("completion endpoint returned status {0}")]
    BadStatus(reqwest::StatusCode),

    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
}

/// Sampling and length options forwarded to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: usize,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            top_p: 0.9,
            max_tokens: 200,
        }
    }
}

/// Trait for answer-generation implementations, so orchestration can be
/// tested without a live model.
pub trait Generator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, SynthesisError>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptionsBody,
}

/// Ollama calls the output-length cap `num_predict`.
#[derive(Serialize)]
struct GenerateOptionsBody {
    temperature: f32,
    top_p: f32,
    num_predict: usize,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Deserialize)]
struct TagModel {
    name: String,
}

/// Generator backed by Ollama's `/api/generate` endpoint.
pub struct OllamaGenerator {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
    options: GenerationOptions,
}

impl OllamaGenerator {
    pub fn new(
        base_url: &str,
        model: &str,
        options: GenerationOptions,
    ) -> Result<Self, SynthesisError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(GENERATE_TIMEOUT_SECS))
            .build()
            .map_err(|e| SynthesisError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            options,
        })
    }

    /// List the model names the server reports, via `GET /api/tags`.
    ///
    /// Used as a startup availability probe; callers treat failure as
    /// "server unreachable", not as a fatal condition.
    pub fn list_models(&self) -> Result<Vec<String>, SynthesisError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(TAGS_TIMEOUT_SECS))
            .build()
            .map_err(|e| SynthesisError::RequestFailed(e.to_string()))?;

        let resp = client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .map_err(|e| SynthesisError::RequestFailed(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(SynthesisError::BadStatus(resp.status()));
        }

        let tags: TagsResponse = resp
            .json()
            .map_err(|e| SynthesisError::MalformedResponse(e.to_string()))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Generator for OllamaGenerator {
    fn generate(&self, prompt: &str) -> Result<String, SynthesisError> {
        debug!("Sending {} chars of prompt to {}", prompt.len(), self.model);

        let resp = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
                options: GenerateOptionsBody {
                    temperature: self.options.temperature,
                    top_p: self.options.top_p,
                    num_predict: self.options.max_tokens,
                },
            })
            .send()
            .map_err(|e| SynthesisError::RequestFailed(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(SynthesisError::BadStatus(resp.status()));
        }

        let body: GenerateResponse = resp
            .json()
            .map_err(|e| SynthesisError::MalformedResponse(e.to_string()))?;

        Ok(strip_surrounding_quotes(body.response.trim()).to_string())
    }
}

/// Assemble the synthesis prompt from the question and the retrieved
/// excerpts (already joined with blank lines, best match first).
#[must_use]
pub fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "You are a helpful AI assistant analyzing sales call transcripts. \
         Based on the provided transcript excerpts, answer the question concisely \
         and accurately. Focus only on the information present in the transcripts. \
         Do not include quotes or extra commentary.\n\
         \n\
         Question: {question}\n\
         \n\
         Relevant transcript excerpts:\n\
         {context}\n\
         \n\
         Please provide a concise answer based only on the transcript information:"
    )
}

/// Models sometimes wrap the whole answer in quotes despite the prompt;
/// drop one matching leading/trailing quote character.
fn strip_surrounding_quotes(s: &str) -> &str {
    let s = s.strip_prefix(['"', '\'']).unwrap_or(s);
    s.strip_suffix(['"', '\'']).unwrap_or(s)
}
