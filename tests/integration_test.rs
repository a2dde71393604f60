/// End-to-end integration tests for the callqa pipeline.
///
/// Tests the complete flow:
///   transcripts on disk → load → chunk → embed → retrieve → prompt → answer
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use callqa::chunker;
use callqa::config::Config;
use callqa::corpus;
use callqa::embedder::Embedder;
use callqa::embedder::mock::MockEmbedder;
use callqa::qa::{NO_RELEVANT_ANSWER, QaSystem};
use callqa::retriever::{CorpusIndex, cosine_similarity};
use callqa::synthesizer::{Generator, SynthesisError};
use tempfile::tempdir;

/// Generator stub that records every prompt it receives.
struct CapturingGenerator {
    prompts: Arc<Mutex<Vec<String>>>,
}

impl Generator for CapturingGenerator {
    fn generate(&self, prompt: &str) -> Result<String, SynthesisError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok("Weekly mowing costs $40.".to_string())
    }
}

fn load_and_chunk(dir: &Path, chunk_size: usize) -> Vec<String> {
    let transcripts = corpus::load_transcripts(dir).unwrap();
    chunker::chunk_all(transcripts.iter().map(|t| t.content.as_str()), chunk_size)
}

/// The canonical scenario: one transcript, two timestamped utterances,
/// chunk_size large enough for a single chunk. The question must retrieve
/// that chunk with positive similarity and pass it into the prompt.
#[test]
fn test_single_chunk_corpus_end_to_end() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("mowing_call.txt"),
        "0:02\nHi, we offer weekly mowing at $40.\n0:05\nWe also do bagging for $10 extra.",
    )
    .unwrap();

    let chunks = load_and_chunk(dir.path(), 1000);
    assert_eq!(chunks.len(), 1, "corpus should collapse to a single chunk");
    assert!(chunks[0].contains("weekly mowing at $40"));
    assert!(chunks[0].contains("bagging for $10 extra"));
    assert!(!chunks[0].contains("0:02"), "timestamps must be stripped");

    let embedder = Arc::new(MockEmbedder::new(128));
    let index = CorpusIndex::build(chunks, embedder.as_ref()).unwrap();

    // Retrieval: mock vectors have strictly positive components, so the
    // question scores > 0 against the chunk.
    let question = "What is the mowing price?";
    let query = embedder.embed(question).unwrap();
    let hits = index.top_k(&query, 3);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].index, 0);
    assert!(hits[0].score > 0.0, "similarity should be positive, got {}", hits[0].score);

    // Orchestration: the retrieved chunk must reach the synthesis prompt.
    let prompts = Arc::new(Mutex::new(Vec::new()));
    let generator = CapturingGenerator {
        prompts: prompts.clone(),
    };
    let system = QaSystem::new(index, embedder, Box::new(generator), 5);

    let answer = system.answer(question).unwrap();
    assert_eq!(answer, "Weekly mowing costs $40.");

    let prompts = prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("weekly mowing at $40"));
    assert!(prompts[0].contains(&format!("Question: {question}")));
}

/// Multi-file corpus: chunks follow transcript load order and retrieval
/// is exact for a query identical to an indexed chunk.
#[test]
fn test_multi_transcript_retrieval() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("call_a.txt"),
        "0:01\nWe discussed the annual maintenance contract.",
    )
    .unwrap();
    fs::write(
        dir.path().join("call_b.txt"),
        "0:01\nThe customer asked about winter snow removal.",
    )
    .unwrap();

    let chunks = load_and_chunk(dir.path(), 500);
    assert_eq!(chunks.len(), 2);

    let embedder = MockEmbedder::new(64);
    let index = CorpusIndex::build(chunks.clone(), &embedder).unwrap();

    // Alignment: row i is the embedding of chunk i.
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(index.chunk(i), chunk);
        let expected = embedder.embed(chunk).unwrap();
        assert!(
            (cosine_similarity(index.embedding(i), &expected) - 1.0).abs() < 1e-6,
            "row {i} out of alignment"
        );
    }

    // A query identical to a chunk must rank that chunk first with
    // similarity ~1.0.
    let query = embedder.embed(&chunks[1]).unwrap();
    let hits = index.top_k(&query, 2);
    assert_eq!(hits[0].index, 1);
    assert!((hits[0].score - 1.0).abs() < 1e-4);
}

/// An empty index answers with the fixed fallback and never calls the
/// generator.
#[test]
fn test_empty_corpus_answer() {
    let embedder = Arc::new(MockEmbedder::new(32));
    let index = CorpusIndex::build(Vec::new(), embedder.as_ref()).unwrap();

    let prompts = Arc::new(Mutex::new(Vec::new()));
    let generator = CapturingGenerator {
        prompts: prompts.clone(),
    };
    let system = QaSystem::new(index, embedder, Box::new(generator), 5);

    let answer = system.answer("anything at all?").unwrap();
    assert_eq!(answer, NO_RELEVANT_ANSWER);
    assert!(prompts.lock().unwrap().is_empty());
}

/// Config defaults drive the pipeline parameters used above.
#[test]
fn test_config_defaults_and_validation() {
    let config = Config::default();

    assert_eq!(config.chunk_size, 500);
    assert_eq!(config.search_top_k, 5);
    assert_eq!(config.ollama.embed_dimensions, 384);
    assert!(config.validate().is_ok());

    let mut bad_config = Config::default();
    bad_config.chunk_size = 0;
    assert!(bad_config.validate().is_err());
}

/// Chunking a sizable timestamped transcript: content survives, order is
/// kept, every chunk is bounded by the soft cap plus one line.
#[test]
fn test_chunking_large_transcript() {
    let mut transcript = String::new();
    for minute in 0..40 {
        transcript.push_str(&format!("{minute}:00\n"));
        transcript.push_str(&format!(
            "Speaker A talks about item {minute} for a while here.\n"
        ));
        transcript.push_str(&format!("Speaker B responds to item {minute}.\n"));
    }

    let chunks = chunker::chunk(&transcript, 500);
    assert!(chunks.len() > 1);

    for c in &chunks {
        assert!(!c.trim().is_empty());
        assert!(c.chars().count() <= 500 + 60, "chunk exceeds soft cap allowance");
        assert!(!chunker::is_timestamp_line(c));
    }

    // All 40 items survive, in order, exactly once.
    let joined = chunks.join(" ");
    for minute in 0..40 {
        assert_eq!(
            joined.matches(&format!("about item {minute} ")).count(),
            1,
            "item {minute} lost or duplicated"
        );
    }
}
