//! Sentence embedding command

use anyhow::{Context, Result};
use forecast_lib::SentenceEmbedder;
use std::path::Path;
use tracing::info;

use crate::output::print_json;

/// Embed `text` and print the vector as a JSON array
pub fn embed_text(model_path: &Path, tokenizer_path: &Path, text: &str) -> Result<()> {
    let embedder =
        SentenceEmbedder::load(model_path, tokenizer_path).context("Error loading embedding model")?;
    let embedding = embedder.embed(text).context("Embedding error")?;
    info!(dimensions = embedding.len(), "Text embedded");

    print_json(&embedding)
}
