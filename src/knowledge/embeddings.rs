//! Text embeddings
//!
//! The index only needs "texts in, vectors out", so the embedding model sits
//! behind a small trait. Production uses the OpenAI embeddings endpoint.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// Inputs sent per embeddings request
const BATCH_SIZE: usize = 64;

/// Turns texts into embedding vectors
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    /// Embed every input, returning one vector per input in the same order
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Name of the embedding model, recorded in index snapshots
    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// OpenAI embeddings client
pub struct OpenAiEmbedder {
    client: Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl OpenAiEmbedder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: batch,
            })
            .send()
            .await
            .context("Failed to send request to OpenAI embeddings API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("[Embeddings] API error: {} - {}", status, body);
            anyhow::bail!("OpenAI embeddings error ({}): {}", status, body);
        }

        let mut payload: EmbeddingResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI embeddings response")?;

        if payload.data.len() != batch.len() {
            anyhow::bail!(
                "Embedding count mismatch: sent {} inputs, got {} vectors",
                batch.len(),
                payload.data.len()
            );
        }

        payload.data.sort_by_key(|item| item.index);
        Ok(payload.data.into_iter().map(|item| item.embedding).collect())
    }
}

#[async_trait::async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(inputs.len());
        for batch in inputs.chunks(BATCH_SIZE) {
            tracing::debug!("[Embeddings] Embedding batch of {} inputs", batch.len());
            vectors.extend(self.embed_batch(batch).await?);
        }
        Ok(vectors)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Deterministic embedder for tests: one dimension per ASCII letter
#[cfg(test)]
pub(crate) struct LetterEmbedder {
    model: String,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl LetterEmbedder {
    pub(crate) fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Number of texts embedded so far
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl Embedder for LetterEmbedder {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls
            .fetch_add(inputs.len(), std::sync::atomic::Ordering::SeqCst);
        Ok(inputs
            .iter()
            .map(|text| {
                let mut v = vec![0.0f32; 26];
                for c in text.to_ascii_lowercase().bytes() {
                    if c.is_ascii_lowercase() {
                        v[(c - b'a') as usize] += 1.0;
                    }
                }
                v
            })
            .collect())
    }

    fn model(&self) -> &str {
        &self.model
    }
}
