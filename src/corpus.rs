/// Transcript discovery and loading.
///
/// The corpus is a directory of UTF-8 `.txt` files, loaded once at
/// startup. A directory with no matching files is a fatal condition; the
/// system must not start with an empty corpus.
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

/// One loaded transcript. The filename is kept for startup logging;
/// chunks derived from the content do not carry it downstream.
#[derive(Debug, Clone)]
pub struct Transcript {
    pub filename: String,
    pub content: String,
}

/// Load every `*.txt` file under `dir`, in glob order.
///
/// Errors if the pattern expands to nothing or any file fails to read.
pub fn load_transcripts(dir: &Path) -> Result<Vec<Transcript>> {
    let pattern = dir.join("*.txt");
    let pattern = pattern.to_string_lossy();

    let mut transcripts = Vec::new();
    for entry in glob::glob(&pattern).context("invalid transcript pattern")? {
        let path = entry.context("failed to read directory entry")?;
        if !path.is_file() {
            continue;
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read transcript: {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        info!("Loaded: {filename} ({} characters)", content.chars().count());
        transcripts.push(Transcript { filename, content });
    }

    anyhow::ensure!(
        !transcripts.is_empty(),
        "no transcript files found in {}",
        dir.display()
    );

    info!("Total transcripts loaded: {}", transcripts.len());
    Ok(transcripts)
}
