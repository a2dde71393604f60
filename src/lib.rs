//! # callqa — Offline Transcript Q&A
//!
//! Answers natural-language questions about a fixed corpus of sales-call
//! transcripts. Transcripts are chunked and embedded once at startup; each
//! question is embedded, matched against the chunk embeddings by cosine
//! similarity, and the best excerpts are handed to a local LLM (Ollama)
//! for answer synthesis.
//!
//! ## Architecture
//!
//! - **[`config`]** — JSON configuration loading, validation, defaults
//! - **[`corpus`]** — transcript discovery and loading (`*.txt` directory)
//! - **[`chunker`]** — bounded-size segmentation with timestamp boundary hints
//! - **[`embedder`]** — text embedding trait + Ollama `/api/embed` client
//! - **[`retriever`]** — immutable chunk/embedding snapshot, cosine top-K
//! - **[`synthesizer`]** — prompt assembly + Ollama `/api/generate` client
//! - **[`qa`]** — per-question orchestration over the above

pub mod chunker;
pub mod config;
pub mod corpus;
pub mod embedder;
pub mod qa;
pub mod retriever;
pub mod synthesizer;
