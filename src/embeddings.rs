use anyhow::Result;
use async_trait::async_trait;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::ollama;

const QUERY_CACHE_CAPACITY: usize = 1000;

/// Turns text into fixed-length vectors.
///
/// Implementations return raw model output; callers normalize with
/// [`normalize`] before indexing or searching.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn model_name(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut result = Vec::with_capacity(texts.len());
        for text in texts {
            result.push(self.embed(text).await?);
        }
        Ok(result)
    }

    /// Embedding for a user question. Implementations may cache these.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(text).await
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum OllamaEmbeddingRequest<'a> {
    Single { model: &'a str, input: &'a str },
    Batch { model: &'a str, input: &'a [String] },
}

#[derive(Deserialize)]
struct OllamaEmbeddingResponse {
    #[serde(default)]
    embedding: Option<Vec<f32>>,
    #[serde(default)]
    embeddings: Option<Vec<Vec<f32>>>,
}

/// Embedding service using the Ollama `/api/embed` endpoint with LRU caching
/// of question embeddings.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    ollama_url: String,
    model: String,
    query_cache: RwLock<LruCache<String, Vec<f32>>>,
}

impl OllamaEmbedder {
    pub fn new(ollama_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let capacity = NonZeroUsize::new(QUERY_CACHE_CAPACITY)
            .ok_or_else(|| anyhow::anyhow!("query cache capacity must be non-zero"))?;

        Ok(Self {
            client: ollama::build_client(timeout)?,
            ollama_url: ollama::normalize_base_url(ollama_url),
            model: model.to_string(),
            query_cache: RwLock::new(LruCache::new(capacity)),
        })
    }

    /// Creates the embedder and checks that Ollama serves the model.
    pub async fn connect(ollama_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let embedder = Self::new(ollama_url, model, timeout)?;

        tracing::info!("Ollama URL: {}", embedder.ollama_url);
        tracing::info!("Ollama embedding model: {}", embedder.model);

        ollama::verify_model(&embedder.client, &embedder.ollama_url, &embedder.model).await?;
        Ok(embedder)
    }

    async fn post_embed(
        &self,
        request: &OllamaEmbeddingRequest<'_>,
    ) -> Result<OllamaEmbeddingResponse> {
        let response = self
            .client
            .post(format!("{}/api/embed", self.ollama_url))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Ollama API error: {} - {}",
                response.status(),
                response.text().await.unwrap_or_default()
            ));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = OllamaEmbeddingRequest::Single {
            model: &self.model,
            input: text,
        };
        let embedding_response = self.post_embed(&request).await?;

        if let Some(embedding) = embedding_response.embedding {
            Ok(embedding)
        } else if let Some(embeddings) = embedding_response.embeddings {
            embeddings
                .into_iter()
                .next()
                .ok_or_else(|| anyhow::anyhow!("Empty embeddings array from Ollama"))
        } else {
            Err(anyhow::anyhow!("No embedding returned from Ollama"))
        }
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        if texts.len() == 1 {
            return Ok(vec![self.embed(&texts[0]).await?]);
        }

        let request = OllamaEmbeddingRequest::Batch {
            model: &self.model,
            input: texts,
        };
        let embedding_response = self.post_embed(&request).await?;

        if let Some(embeddings) = embedding_response.embeddings {
            if embeddings.len() == texts.len() {
                return Ok(embeddings);
            }
            tracing::warn!(
                "Batch embedding returned {} embeddings for {} texts, falling back to sequential",
                embeddings.len(),
                texts.len()
            );
        } else if embedding_response.embedding.is_some() {
            tracing::warn!(
                "Model '{}' doesn't support batch embeddings, falling back to sequential",
                self.model
            );
        }

        tracing::info!("Processing {} embeddings sequentially", texts.len());
        let mut result = Vec::with_capacity(texts.len());
        for text in texts {
            result.push(self.embed(text).await?);
        }
        Ok(result)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(cached) = self.query_cache.write().await.get(text) {
            tracing::debug!("Query embedding cache hit");
            return Ok(cached.clone());
        }

        let embedding = self.embed(text).await?;
        self.query_cache
            .write()
            .await
            .put(text.to_string(), embedding.clone());
        Ok(embedding)
    }
}

/// Normalize a vector to unit length in-place.
/// If the vector has zero or very small norm, it is left unchanged.
pub fn normalize(v: &mut [f32]) {
    let norm_sq: f32 = v.iter().map(|x| x * x).sum();
    if norm_sq > 1e-20 {
        let norm = norm_sq.sqrt();
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
