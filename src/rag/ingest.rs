//! Corpus ingestion: documents on disk → passage index file.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};
use walkdir::WalkDir;

use super::chunking::Chunker;
use super::{Embedder, Passage, PassageIndex};
use crate::config::{RetrievalBackend, RetrievalConfig};

/// File extensions read from the corpus directory.
const DOCUMENT_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// Log a progress line every this many passages.
const PROGRESS_EVERY: usize = 1000;

/// Texts embedded per model call.
const EMBED_BATCH: usize = 64;

/// Outcome of an ingest run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Documents that produced passages.
    pub documents: usize,
    /// Documents that could not be read.
    pub skipped: usize,
    /// Passages in the index.
    pub passages: usize,
}

/// Split every document under `corpus_dir` into passages.
///
/// Unreadable files are logged and skipped; the run continues.
pub fn collect_passages(corpus_dir: &Path, chunker: &Chunker) -> (Vec<Passage>, IngestReport) {
    let mut passages = Vec::new();
    let mut report = IngestReport::default();

    let entries = WalkDir::new(corpus_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable corpus entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_document(entry.path()));

    for entry in entries {
        let path = entry.path();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Error reading document, skipping");
                report.skipped += 1;
                continue;
            }
        };

        let source = path
            .strip_prefix(corpus_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");

        let chunks = chunker.chunk(&text);
        if chunks.is_empty() {
            continue;
        }
        report.documents += 1;

        for (n, chunk) in chunks.into_iter().enumerate() {
            passages.push(Passage {
                id: format!("{source}#{n}"),
                text: chunk,
                source: source.clone(),
                embedding: None,
            });
            if passages.len() % PROGRESS_EVERY == 0 {
                info!(
                    name: "ingest.progress",
                    passages = passages.len(),
                    "Indexed {} passages so far...",
                    passages.len()
                );
            }
        }
    }

    report.passages = passages.len();
    (passages, report)
}

/// Attach embeddings to every passage.
pub async fn embed_passages(embedder: &Embedder, passages: &mut [Passage]) -> Result<()> {
    for batch in passages.chunks_mut(EMBED_BATCH) {
        let texts = batch.iter().map(|p| p.text.clone()).collect();
        let vectors = embedder.embed_batch(texts).await?;
        for (passage, vector) in batch.iter_mut().zip(vectors) {
            passage.embedding = Some(vector);
        }
    }
    Ok(())
}

/// Build the passage index described by `config` and write it to disk.
pub async fn run_ingest(config: &RetrievalConfig) -> Result<IngestReport> {
    let corpus_dir = Path::new(&config.corpus_dir);
    if !corpus_dir.is_dir() {
        anyhow::bail!("corpus directory not found: {}", corpus_dir.display());
    }

    info!(
        name: "ingest.started",
        corpus_dir = %corpus_dir.display(),
        chunk_size = config.chunk_size,
        "Indexing corpus"
    );

    let chunker = Chunker::new(config.chunk_size);
    let (mut passages, report) = collect_passages(corpus_dir, &chunker);

    if config.backend == RetrievalBackend::Embedding && !passages.is_empty() {
        let embedder = Embedder::new();
        embedder.initialize().await?;
        embed_passages(&embedder, &mut passages).await?;
    }

    let index_path = Path::new(&config.index_path);
    PassageIndex::new(passages)
        .save(index_path)
        .with_context(|| format!("writing {}", index_path.display()))?;

    info!(
        name: "ingest.completed",
        documents = report.documents,
        skipped = report.skipped,
        passages = report.passages,
        index_path = %index_path.display(),
        "Indexing complete"
    );
    Ok(report)
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            DOCUMENT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}
