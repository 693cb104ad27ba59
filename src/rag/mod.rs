//! Retrieval-augmented prompting.
//!
//! Passages are produced offline by [`ingest`], stored as JSON lines by
//! [`index`], and ranked per query by a [`Retriever`]. [`prompt`] turns the
//! retrieved passages plus the conversation into model input.

pub mod chunking;
pub mod embedding;
pub mod index;
pub mod ingest;
pub mod lexical;
pub mod prompt;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{RetrievalBackend, RetrievalConfig};
pub use embedding::{Embedder, EmbeddingRetriever};
pub use index::{IndexError, PassageIndex};
pub use lexical::LexicalRetriever;

/// A unit of retrievable text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Stable identifier (`<source>#<n>`).
    pub id: String,
    /// Passage text.
    pub text: String,
    /// Corpus-relative path of the document it came from.
    pub source: String,
    /// Sentence embedding, present when ingested for the embedding backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// Ranks passages against a query.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Texts of the `k` best passages for `query`, best first.
    async fn retrieve(&self, query: &str, k: usize) -> anyhow::Result<Vec<String>>;
}

/// Build the configured retriever from the passage index.
///
/// A missing index is not fatal: the server answers without context.
pub async fn load_retriever(config: &RetrievalConfig) -> anyhow::Result<Arc<dyn Retriever>> {
    let path = Path::new(&config.index_path);
    let index = if path.exists() {
        PassageIndex::load(path)?
    } else {
        warn!(
            name: "rag.index.missing",
            path = %path.display(),
            "Passage index not found; answering without context"
        );
        PassageIndex::default()
    };

    info!(
        name: "rag.index.loaded",
        passages = index.len(),
        backend = ?config.backend,
        "Passage index loaded"
    );

    let retriever: Arc<dyn Retriever> = match config.backend {
        RetrievalBackend::Lexical => Arc::new(LexicalRetriever::new(index.into_passages())),
        RetrievalBackend::Embedding => {
            let embedder = Embedder::new();
            embedder.initialize().await?;
            Arc::new(EmbeddingRetriever::new(embedder, index.into_passages()))
        }
    };
    Ok(retriever)
}
