/// Question answering over the corpus index.
///
/// Per query: embed the question, retrieve the top chunks, assemble the
/// prompt, and forward to the generator. Failures are question-level:
/// they surface to the caller and never poison the session state (the
/// index is read-only after startup).
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::embedder::{Embedder, EmbedderError};
use crate::retriever::CorpusIndex;
use crate::synthesizer::{Generator, SynthesisError, build_prompt};

/// Chunks forwarded into the synthesis prompt, independent of the
/// search-facing `search_top_k`.
pub const ANSWER_TOP_K: usize = 3;

/// Fixed answer when retrieval comes back empty.
pub const NO_RELEVANT_ANSWER: &str =
    "I couldn't find any relevant information in the transcripts to answer your question.";

/// A question-level failure. The session stays usable; only this answer
/// is lost.
#[derive(Error, Debug)]
pub enum AnswerError {
    #[error("failed to embed question: {0}")]
    Embed(#[from] EmbedderError),

    #[error("failed to generate answer: {0}")]
    Synthesis(#[from] SynthesisError),
}

/// The assembled Q&A pipeline: shared immutable index plus the two
/// external capabilities.
pub struct QaSystem {
    index: CorpusIndex,
    embedder: Arc<dyn Embedder>,
    generator: Box<dyn Generator>,
    search_top_k: usize,
}

impl QaSystem {
    pub fn new(
        index: CorpusIndex,
        embedder: Arc<dyn Embedder>,
        generator: Box<dyn Generator>,
        search_top_k: usize,
    ) -> Self {
        Self {
            index,
            embedder,
            generator,
            search_top_k,
        }
    }

    #[must_use]
    pub fn index(&self) -> &CorpusIndex {
        &self.index
    }

    /// Answer one question from the transcripts.
    ///
    /// Short-circuits with [`NO_RELEVANT_ANSWER`] when retrieval returns
    /// nothing (empty corpus), without calling the generator.
    pub fn answer(&self, question: &str) -> Result<String, AnswerError> {
        let query = self.embedder.embed(question)?;

        // Scan a search-sized window for logging/inspection, but only
        // the top ANSWER_TOP_K go into the prompt.
        let hits = self
            .index
            .top_k(&query, self.search_top_k.max(ANSWER_TOP_K));
        if hits.is_empty() {
            info!("No chunks retrieved; skipping generation");
            return Ok(NO_RELEVANT_ANSWER.to_string());
        }

        for hit in &hits {
            debug!("Retrieved chunk {} (score {:.4})", hit.index, hit.score);
        }

        // Best match first, blank line between excerpts.
        let context = hits
            .iter()
            .take(ANSWER_TOP_K)
            .map(|h| self.index.chunk(h.index))
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = build_prompt(question, &context);
        Ok(self.generator.generate(&prompt)?)
    }
}
