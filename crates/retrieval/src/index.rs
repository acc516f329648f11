use std::cmp::Ordering;
use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use serde::Serialize;
use tracing::{info, warn};
use transit_core::{Chunk, SourceTag};

use crate::chunking::TextSplitter;
use crate::embedder::{cosine_similarity, Embedder};
use crate::loader::{self, DocumentSources};

/// Returned by [`RetrievalIndex::query`] when nothing was indexed.
pub const NOT_INITIALIZED: &str = "Pipeline not initialized.";
pub const DEFAULT_TOP_K: usize = 3;

#[derive(Debug, Clone)]
struct IndexedChunk {
    chunk: Chunk,
    embedding: Vec<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievalStats {
    pub initialized: bool,
    pub chunks_loaded: usize,
    pub schedule_chunks: usize,
    pub policy_chunks: usize,
    pub embedder: Option<String>,
}

/// Flat in-memory vector index. Built once, read-only afterwards.
#[derive(Clone)]
pub struct RetrievalIndex {
    entries: Vec<IndexedChunk>,
    embedder: Option<Arc<dyn Embedder>>,
}

impl RetrievalIndex {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            embedder: None,
        }
    }

    /// Loads both sources and indexes whatever was found. `make_embedder` only runs when
    /// there is at least one chunk, so a missing provider key is harmless without sources.
    pub async fn from_sources<F>(sources: &DocumentSources, make_embedder: F) -> Result<Self>
    where
        F: FnOnce() -> Result<Arc<dyn Embedder>>,
    {
        info!("building retrieval index");
        let chunks = loader::load(sources, &TextSplitter::default())?;
        if chunks.is_empty() {
            warn!("no documents found to index");
            return Ok(Self::empty());
        }

        Self::build(chunks, make_embedder()?).await
    }

    pub async fn build(chunks: Vec<Chunk>, embedder: Arc<dyn Embedder>) -> Result<Self> {
        if chunks.is_empty() {
            warn!("no documents found to index");
            return Ok(Self::empty());
        }

        let texts = chunks
            .iter()
            .map(|chunk| chunk.text.clone())
            .collect::<Vec<_>>();
        let embeddings = embedder
            .embed_batch(&texts)
            .await
            .with_context(|| format!("failed embedding {} chunks", texts.len()))?;

        ensure!(
            embeddings.len() == chunks.len(),
            "{} returned {} embeddings for {} chunks",
            embedder.model_name(),
            embeddings.len(),
            chunks.len()
        );

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedChunk { chunk, embedding })
            .collect::<Vec<_>>();

        info!(
            chunks = entries.len(),
            embedder = embedder.model_name(),
            "retrieval index ready"
        );

        Ok(Self {
            entries,
            embedder: Some(embedder),
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.embedder.is_some()
    }

    pub fn stats(&self) -> RetrievalStats {
        let count = |tag: SourceTag| {
            self.entries
                .iter()
                .filter(|entry| entry.chunk.source_tag == tag)
                .count()
        };

        RetrievalStats {
            initialized: self.is_initialized(),
            chunks_loaded: self.entries.len(),
            schedule_chunks: count(SourceTag::Schedule),
            policy_chunks: count(SourceTag::Policy),
            embedder: self
                .embedder
                .as_ref()
                .map(|embedder| embedder.model_name().to_string()),
        }
    }

    /// Top `k` chunks by cosine similarity, best first. Equal scores keep index order.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let Some(embedder) = &self.embedder else {
            return Ok(Vec::new());
        };

        let query_embedding = embedder
            .embed(query)
            .await
            .context("failed embedding search query")?;

        let mut scored = self
            .entries
            .iter()
            .map(|entry| (cosine_similarity(&query_embedding, &entry.embedding), entry))
            .collect::<Vec<_>>();

        scored.sort_by(|(a, _), (b, _)| b.partial_cmp(a).unwrap_or(Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, entry)| ScoredChunk {
                chunk: entry.chunk.clone(),
                score,
            })
            .collect())
    }

    /// Text of the top `k` chunks joined by blank lines, or [`NOT_INITIALIZED`].
    pub async fn query(&self, query: &str, k: usize) -> Result<String> {
        if !self.is_initialized() {
            return Ok(NOT_INITIALIZED.to_string());
        }

        info!(query = %query, top_k = k, "searching");
        let hits = self.search(query, k).await?;

        Ok(hits
            .into_iter()
            .map(|hit| hit.chunk.text)
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}
