/// Configuration module for callqa.
///
/// Handles loading, validating, and providing default configuration values.
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::synthesizer::GenerationOptions;

// ── Default value functions ──────────────────────────────────────────

fn default_transcript_dir() -> String {
    "transcripts".to_string()
}

fn default_chunk_size() -> usize {
    500
}

fn default_search_top_k() -> usize {
    5
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_embed_model() -> String {
    "all-minilm".to_string()
}

fn default_generate_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_dimensions() -> usize {
    384
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default = "default_transcript_dir")]
    pub transcript_dir: String,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_search_top_k")]
    pub search_top_k: usize,

    #[serde(default)]
    pub ollama: OllamaConfig,

    #[serde(default)]
    pub generation: GenerationOptions,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OllamaConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_embed_model")]
    pub embed_model: String,

    #[serde(default = "default_dimensions")]
    pub embed_dimensions: usize,

    #[serde(default = "default_generate_model")]
    pub generate_model: String,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            transcript_dir: default_transcript_dir(),
            chunk_size: default_chunk_size(),
            search_top_k: default_search_top_k(),
            ollama: OllamaConfig::default(),
            generation: GenerationOptions::default(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            embed_model: default_embed_model(),
            embed_dimensions: default_dimensions(),
            generate_model: default_generate_model(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If `config_path` is empty, defaults to `"config.json"`.
    /// If the file does not exist, returns a default config and optionally
    /// generates a template file.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            "config.json"
        } else {
            config_path
        };

        if !Path::new(path).exists() {
            info!("{path} not found, using defaults");
            let cfg = Self::default();

            // Generate template only for the default path
            if path == "config.json" {
                match cfg.save(path) {
                    Ok(()) => info!("Generated config template: {path}"),
                    Err(e) => warn!("Failed to generate config template: {e}"),
                }
            }

            return Ok(cfg);
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {path}: {e}");
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {path}");
        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data).with_context(|| format!("failed to write config: {path}"))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.chunk_size > 0, "chunk_size must be positive");
        anyhow::ensure!(self.search_top_k > 0, "search_top_k must be positive");
        anyhow::ensure!(
            self.ollama.embed_dimensions > 0,
            "ollama.embed_dimensions must be positive"
        );
        anyhow::ensure!(
            !self.transcript_dir.is_empty(),
            "transcript_dir must not be empty"
        );
        anyhow::ensure!(
            !self.ollama.base_url.is_empty(),
            "ollama.base_url must not be empty"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.generation.top_p),
            "generation.top_p must be within [0, 1]"
        );
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────
