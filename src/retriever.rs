use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;

use crate::chunker::Chunk;
use crate::constants::{DEFAULT_CONTEXT_WIDTH, DEFAULT_SEARCH_WIDTH};
use crate::embeddings::{Embedder, normalize};
use crate::index::FlatL2Index;

/// How many neighbours to search for, and how many of them to hand to the
/// language model as context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalWidths {
    pub search: usize,
    pub context: usize,
}

impl RetrievalWidths {
    pub fn new(search: usize, context: usize) -> Result<Self> {
        anyhow::ensure!(search >= 1, "search width must be at least 1");
        anyhow::ensure!(context >= 1, "context width must be at least 1");
        anyhow::ensure!(
            context <= search,
            "context width ({context}) cannot exceed search width ({search})"
        );
        Ok(Self { search, context })
    }
}

impl Default for RetrievalWidths {
    fn default() -> Self {
        Self {
            search: DEFAULT_SEARCH_WIDTH,
            context: DEFAULT_CONTEXT_WIDTH,
        }
    }
}

/// A chunk selected for a question, with its squared L2 distance to the
/// question embedding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub index: usize,
    pub text: String,
    pub distance: f32,
}

/// Chunks plus their embedding index. Built once; read-only afterwards.
pub struct Retriever {
    chunks: Vec<Chunk>,
    index: FlatL2Index,
    embedder: Arc<dyn Embedder>,
    widths: RetrievalWidths,
}

impl Retriever {
    /// Embeds every chunk in batches of `batch_size` and builds the index.
    pub async fn build(
        chunks: Vec<Chunk>,
        embedder: Arc<dyn Embedder>,
        widths: RetrievalWidths,
        batch_size: usize,
    ) -> Result<Self> {
        let batch_size = batch_size.max(1);
        let total_batches = chunks.len().div_ceil(batch_size);

        tracing::info!(
            "Embedding {} chunks with '{}' in {} batches of up to {}",
            chunks.len(),
            embedder.model_name(),
            total_batches,
            batch_size
        );

        let mut index: Option<FlatL2Index> = None;

        for (batch_idx, batch) in chunks.chunks(batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
            let embeddings = embedder.embed_batch(&texts).await.with_context(|| {
                format!("Embedding batch {}/{} failed", batch_idx + 1, total_batches)
            })?;

            if embeddings.len() != texts.len() {
                return Err(anyhow::anyhow!(
                    "Batch {}/{}: received {} embeddings for {} chunks",
                    batch_idx + 1,
                    total_batches,
                    embeddings.len(),
                    texts.len()
                ));
            }

            for mut embedding in embeddings {
                normalize(&mut embedding);
                let target = index.get_or_insert_with(|| {
                    tracing::info!("Initialized flat L2 index with dimension {}", embedding.len());
                    FlatL2Index::new(embedding.len())
                });
                target.add(&embedding)?;
            }

            tracing::debug!("Batch {}/{} embedded", batch_idx + 1, total_batches);
        }

        Ok(Self {
            chunks,
            index: index.unwrap_or_else(|| FlatL2Index::new(0)),
            embedder,
            widths,
        })
    }

    /// Returns at most `widths.context` chunks nearest to the question,
    /// ordered by ascending distance.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<RetrievedChunk>> {
        if self.index.is_empty() {
            return Ok(vec![]);
        }

        let mut query = self.embedder.embed_query(question).await?;
        normalize(&mut query);

        let neighbours = self.index.search(&query, self.widths.search)?;
        tracing::debug!(
            "Found {} neighbours, keeping {}",
            neighbours.len(),
            self.widths.context.min(neighbours.len())
        );

        Ok(neighbours
            .into_iter()
            .take(self.widths.context)
            .filter_map(|(id, distance)| {
                self.chunks.get(id).map(|chunk| RetrievedChunk {
                    index: chunk.index,
                    text: chunk.text.clone(),
                    distance,
                })
            })
            .collect())
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn dimension(&self) -> usize {
        self.index.dim()
    }

    pub fn widths(&self) -> RetrievalWidths {
        self.widths
    }

    pub fn embedding_model(&self) -> &str {
        self.embedder.model_name()
    }
}
