use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use callqa::chunker;
use callqa::config::Config;
use callqa::corpus;
use callqa::embedder::Embedder;
use callqa::embedder::ollama::OllamaEmbedder;
use callqa::qa::QaSystem;
use callqa::retriever::CorpusIndex;
use callqa::synthesizer::OllamaGenerator;

#[derive(Parser, Debug)]
#[command(
    name = "callqa",
    version,
    about = "Offline Q&A over sales-call transcripts via a local Ollama server"
)]
struct Cli {
    /// Path to the JSON config file
    #[arg(long, default_value = "config.json")]
    config: String,

    /// Override the transcript directory from the config
    #[arg(long)]
    transcripts: Option<String>,

    /// Answer a single question and exit instead of starting the
    /// interactive loop
    #[arg(long)]
    question: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(&cli.config).context("failed to load configuration")?;
    if let Some(dir) = cli.transcripts {
        config.transcript_dir = dir;
    }
    config.validate().context("invalid configuration")?;

    let system = build_system(&config)?;

    match cli.question {
        Some(question) => {
            let answer = system.answer(&question)?;
            println!("{answer}");
            Ok(())
        }
        None => run_interactive(&system),
    }
}

/// One-time startup build: load transcripts, chunk, embed, assemble the
/// Q&A pipeline. Any failure here is fatal; the process must not serve
/// questions over a partial corpus.
fn build_system(config: &Config) -> Result<QaSystem> {
    info!("Loading transcripts from {}/...", config.transcript_dir);
    let transcripts = corpus::load_transcripts(Path::new(&config.transcript_dir))?;

    let chunks = chunker::chunk_all(
        transcripts.iter().map(|t| t.content.as_str()),
        config.chunk_size,
    );
    info!("Created {} chunks", chunks.len());

    let embedder = Arc::new(
        OllamaEmbedder::new(
            &config.ollama.base_url,
            &config.ollama.embed_model,
            config.ollama.embed_dimensions,
        )
        .context("failed to create embedder")?,
    );

    let generator = OllamaGenerator::new(
        &config.ollama.base_url,
        &config.ollama.generate_model,
        config.generation.clone(),
    )
    .context("failed to create generator")?;

    check_server(&generator, &config.ollama.base_url);

    info!("Creating embeddings for chunks...");
    let bar = ProgressBar::new(chunks.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/{len} chunks {msg}")
            .expect("valid template")
            .progress_chars("█▓░"),
    );
    let index = CorpusIndex::build_with_progress(chunks, embedder.as_ref(), |done, _| {
        bar.set_position(done as u64);
    })
    .context("failed to embed transcript chunks")?;
    bar.finish_and_clear();
    info!("Embedded {} chunks", index.len());

    let embedder: Arc<dyn Embedder> = embedder;
    Ok(QaSystem::new(
        index,
        embedder,
        Box::new(generator),
        config.search_top_k,
    ))
}

/// Best-effort availability probe: log what the server offers and warn
/// when the configured generation model is missing. Never fatal; the
/// first real request will surface a hard failure with context.
fn check_server(generator: &OllamaGenerator, base_url: &str) {
    match generator.list_models() {
        Ok(models) => {
            info!("Ollama is running at {base_url}");
            for name in &models {
                info!("  available model: {name}");
            }
            if !models.iter().any(|m| m == generator.model()) {
                warn!(
                    "Model {} not found on the server; run: ollama pull {}",
                    generator.model(),
                    generator.model()
                );
            }
        }
        Err(e) => {
            warn!("Cannot reach Ollama at {base_url}: {e}");
            warn!("Questions will fail until the server is available");
        }
    }
}

/// Read-question / print-answer loop. Question-level failures are printed
/// and the loop continues; only EOF or a quit token ends the session.
fn run_interactive(system: &QaSystem) -> Result<()> {
    println!("Ready. Ask questions about the transcripts.");
    println!("Type 'quit' or 'exit' to end the session.");
    println!();

    let stdin = io::stdin();
    loop {
        print!("Enter your question: ");
        io::stdout().flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let question = line.trim();

        if question.is_empty() {
            continue;
        }
        if matches!(question.to_lowercase().as_str(), "quit" | "exit" | "q") {
            println!("Goodbye!");
            break;
        }

        match system.answer(question) {
            Ok(answer) => {
                println!();
                println!("Answer:");
                println!("{}", "-".repeat(40));
                println!("{answer}");
                println!("{}", "-".repeat(40));
                println!();
            }
            Err(e) => {
                eprintln!("Error answering question: {e}");
                println!();
            }
        }
    }

    Ok(())
}
