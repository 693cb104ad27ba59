//! Sentence-embedding retrieval backed by fastembed.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::{Passage, Retriever};

/// Lazily initialized `all-MiniLM-L6-v2` embedding model.
///
/// Inference runs on the blocking pool; the model is moved out of the mutex
/// for the duration of a batch and put back afterwards.
#[derive(Clone)]
pub struct Embedder {
    model: Arc<Mutex<Option<TextEmbedding>>>,
}

impl std::fmt::Debug for Embedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Embedder")
            .field("model", &"AllMiniLML6V2")
            .finish()
    }
}

impl Default for Embedder {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            model: Arc::new(Mutex::new(None)),
        }
    }

    /// Load (downloading on first use) the model weights.
    pub async fn initialize(&self) -> Result<()> {
        let mut model_guard = self.model.lock().await;
        if model_guard.is_none() {
            info!("Initializing fastembed model (all-MiniLM-L6-v2)...");
            let model = tokio::task::spawn_blocking(|| {
                TextEmbedding::try_new(InitOptions::new(EmbeddingModel::AllMiniLML6V2))
            })
            .await??;
            *model_guard = Some(model);
        }
        Ok(())
    }

    /// Embed a batch of texts, in order.
    pub async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let mut model_guard = self.model.lock().await;
        let mut owned_model = model_guard
            .take()
            .context("Embedder not initialized")?;

        let (embeddings_res, returned_model) = tokio::task::spawn_blocking(move || {
            let res = owned_model.embed(texts, None);
            (res, owned_model)
        })
        .await?;

        *model_guard = Some(returned_model);
        embeddings_res.map_err(|e| anyhow::anyhow!(e))
    }

    /// Embed a single text.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .context("Embedding model returned no vector")
    }
}

/// Cosine-similarity ranking over pre-computed passage embeddings.
#[derive(Debug, Clone)]
pub struct EmbeddingRetriever {
    embedder: Embedder,
    vectors: Vec<(String, Vec<f32>)>,
}

impl EmbeddingRetriever {
    /// Passages without an embedding are skipped.
    #[must_use]
    pub fn new(embedder: Embedder, passages: Vec<Passage>) -> Self {
        let total = passages.len();
        let vectors: Vec<(String, Vec<f32>)> = passages
            .into_iter()
            .filter_map(|p| p.embedding.map(|v| (p.text, v)))
            .collect();

        if vectors.len() < total {
            warn!(
                skipped = total - vectors.len(),
                "Passages without embeddings ignored; re-run ingest with the embedding backend"
            );
        }

        Self { embedder, vectors }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

#[async_trait]
impl Retriever for EmbeddingRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>> {
        if self.vectors.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let query_vec = self.embedder.embed(query).await?;
        Ok(top_k(&query_vec, &self.vectors, k))
    }
}

/// Texts of the `k` entries most similar to `query`, best first.
fn top_k(query: &[f32], vectors: &[(String, Vec<f32>)], k: usize) -> Vec<String> {
    let mut scored: Vec<(f32, &str)> = vectors
        .iter()
        .map(|(text, v)| (cosine_similarity(query, v), text.as_str()))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored
        .into_iter()
        .take(k)
        .map(|(_, text)| text.to_string())
        .collect()
}

/// Cosine similarity; 0.0 for mismatched lengths or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
