//! fastembed-backed local embedding model.
//!
//! The model is downloaded from Hugging Face on first use and cached; after
//! that embeddings run offline. Loading happens once, in
//! [`ModelProvider::new`], so a missing model is detected at startup.

use anyhow::{bail, Result};
use std::sync::Mutex;

use super::EmbeddingProvider;
use crate::config::EmbeddingConfig;

/// Embedding provider running a sentence-embedding model in-process.
pub struct ModelProvider {
    model_name: String,
    dims: usize,
    batch_size: usize,
    model: Mutex<fastembed::TextEmbedding>,
}

impl ModelProvider {
    /// Load the configured model.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown model names or if the model files
    /// cannot be fetched or initialized.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let (fastembed_model, dims) = resolve_model(&config.model)?;

        let model = fastembed::TextEmbedding::try_new(
            fastembed::InitOptions::new(fastembed_model).with_show_download_progress(false),
        )
        .map_err(|e| anyhow::anyhow!("Failed to initialize local embedding model: {}", e))?;

        Ok(Self {
            model_name: config.model.clone(),
            dims,
            batch_size: config.batch_size,
            model: Mutex::new(model),
        })
    }
}

impl EmbeddingProvider for ModelProvider {
    fn model_name(&self) -> &str {
        &self.model_name
    }
    fn dims(&self) -> usize {
        self.dims
    }
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut model = self
            .model
            .lock()
            .map_err(|_| anyhow::anyhow!("embedding model lock poisoned"))?;

        let embeddings = model
            .embed(texts.to_vec(), Some(self.batch_size))
            .map_err(|e| anyhow::anyhow!("Local embedding failed: {}", e))?;

        if let Some(bad) = embeddings.iter().find(|v| v.len() != self.dims) {
            bail!(
                "model '{}' produced {} dims, expected {}",
                self.model_name,
                bad.len(),
                self.dims
            );
        }

        Ok(embeddings)
    }
}

fn resolve_model(name: &str) -> Result<(fastembed::EmbeddingModel, usize)> {
    match name {
        "all-minilm-l6-v2" => Ok((fastembed::EmbeddingModel::AllMiniLML6V2, 384)),
        "bge-small-en-v1.5" => Ok((fastembed::EmbeddingModel::BGESmallENV15, 384)),
        "bge-base-en-v1.5" => Ok((fastembed::EmbeddingModel::BGEBaseENV15, 768)),
        "bge-large-en-v1.5" => Ok((fastembed::EmbeddingModel::BGELargeENV15, 1024)),
        "nomic-embed-text-v1.5" => Ok((fastembed::EmbeddingModel::NomicEmbedTextV15, 768)),
        "multilingual-e5-small" => Ok((fastembed::EmbeddingModel::MultilingualE5Small, 384)),
        other => bail!(
            "Unknown local embedding model: '{}'. Supported models: \
             all-minilm-l6-v2, bge-small-en-v1.5, bge-base-en-v1.5, bge-large-en-v1.5, \
             nomic-embed-text-v1.5, multilingual-e5-small",
            other
        ),
    }
}
