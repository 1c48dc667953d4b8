use anyhow::Result;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::chunker::{Chunk, chunk_paragraphs};
use crate::confidence::{ConfidenceSignal, estimate};
use crate::embeddings::Embedder;
use crate::error::TutorError;
use crate::generation::{GenerationClient, TextGenerator};
use crate::mcq::{Mcq, parse_mcqs};
use crate::prompts::PromptTemplates;
use crate::retriever::{RetrievalWidths, RetrievedChunk, Retriever};

pub const EXPLANATION_UNAVAILABLE: &str =
    "The explanation service is unavailable right now. Please try again later.";
pub const MCQS_UNAVAILABLE: &str = "Practice questions could not be generated right now.";
pub const NO_MCQS: &str = "No MCQs generated for this question.";

/// Knobs for building a [`Tutor`].
#[derive(Debug, Clone)]
pub struct TutorOptions {
    pub min_chunk_chars: usize,
    pub widths: RetrievalWidths,
    pub embedding_batch_size: usize,
    pub mcq_count: usize,
    pub templates: PromptTemplates,
}

impl Default for TutorOptions {
    fn default() -> Self {
        Self {
            min_chunk_chars: crate::constants::DEFAULT_MIN_CHUNK_CHARS,
            widths: RetrievalWidths::default(),
            embedding_batch_size: crate::constants::DEFAULT_EMBEDDING_BATCH_SIZE,
            mcq_count: crate::constants::DEFAULT_MCQ_COUNT,
            templates: PromptTemplates::default(),
        }
    }
}

/// Everything the caller needs to render one answer.
#[derive(Debug, Clone, Serialize)]
pub struct TutorAnswer {
    pub question: String,
    pub explanation: String,
    pub confidence: ConfidenceSignal,
    pub mcqs: Vec<Mcq>,
    pub context: Vec<RetrievedChunk>,
    /// User-visible notes about degraded or empty output.
    pub notices: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TutorStats {
    pub document: String,
    pub document_sha256: String,
    pub chunks: usize,
    pub dimension: usize,
    pub embedding_model: String,
    pub generation_model: String,
    pub search_width: usize,
    pub context_width: usize,
    pub mcq_count: usize,
}

/// The question-answering pipeline over one reference document.
///
/// Built once at startup and shared read-only between requests.
pub struct Tutor {
    document: String,
    document_sha256: String,
    retriever: Retriever,
    generation: GenerationClient,
    mcq_count: usize,
}

impl Tutor {
    /// Chunks and embeds `text`, returning a ready tutor.
    pub async fn build(
        document: &str,
        text: &str,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn TextGenerator>,
        options: TutorOptions,
    ) -> Result<Self> {
        let chunks = chunk_paragraphs(text, options.min_chunk_chars);
        tracing::info!("Created {} chunks from {}", chunks.len(), document);
        Self::from_chunks(document, text, chunks, embedder, generator, options).await
    }

    /// Builds a tutor over chunks the caller already split from `text`.
    pub async fn from_chunks(
        document: &str,
        text: &str,
        chunks: Vec<Chunk>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn TextGenerator>,
        options: TutorOptions,
    ) -> Result<Self> {
        let retriever = Retriever::build(
            chunks,
            embedder,
            options.widths,
            options.embedding_batch_size,
        )
        .await?;

        Ok(Self {
            document: document.to_string(),
            document_sha256: compute_document_hash(text.as_bytes()),
            retriever,
            generation: GenerationClient::new(generator, options.templates),
            mcq_count: options.mcq_count,
        })
    }

    pub fn chunk_count(&self) -> usize {
        self.retriever.chunks().len()
    }

    /// Answers one question: retrieval, explanation, MCQs and confidence.
    ///
    /// A failure of one generation call degrades that part of the answer and
    /// adds a notice; only when both fail is the error returned.
    pub async fn answer(&self, question: &str) -> Result<TutorAnswer, TutorError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(TutorError::EmptyQuestion);
        }

        let context = self
            .retriever
            .retrieve(question)
            .await
            .map_err(TutorError::Embedding)?;
        tracing::info!("Retrieved {} chunks", context.len());

        let (explanation, mcq_text) = futures::join!(
            self.generation.explain(question, &context),
            self.generation.generate_mcqs(&context, self.mcq_count)
        );

        let mut notices = Vec::new();

        let (explanation, mcqs) = match (explanation, mcq_text) {
            (Err(explain_err), Err(mcq_err)) => {
                tracing::error!("Explanation failed: {}", explain_err);
                tracing::error!("MCQ generation failed: {}", mcq_err);
                return Err(TutorError::Generation(explain_err));
            }
            (explanation, mcq_text) => {
                let explanation = explanation.unwrap_or_else(|e| {
                    tracing::warn!("Explanation failed, answering in degraded mode: {}", e);
                    notices.push(EXPLANATION_UNAVAILABLE.to_string());
                    EXPLANATION_UNAVAILABLE.to_string()
                });
                let mcqs = match mcq_text {
                    Ok(text) => {
                        let mcqs = parse_mcqs(&text);
                        if mcqs.is_empty() {
                            notices.push(NO_MCQS.to_string());
                        } else if mcqs.len() < self.mcq_count {
                            tracing::debug!(
                                "Model produced {} usable MCQs of {} requested",
                                mcqs.len(),
                                self.mcq_count
                            );
                        }
                        mcqs
                    }
                    Err(e) => {
                        tracing::warn!("MCQ generation failed, answering without MCQs: {}", e);
                        notices.push(MCQS_UNAVAILABLE.to_string());
                        Vec::new()
                    }
                };
                (explanation, mcqs)
            }
        };

        let explanation = if explanation.trim().is_empty() {
            "No explanation found.".to_string()
        } else {
            explanation.trim().to_string()
        };

        Ok(TutorAnswer {
            question: question.to_string(),
            explanation,
            confidence: estimate(context.len()),
            mcqs,
            context,
            notices,
        })
    }

    pub fn stats(&self) -> TutorStats {
        let widths = self.retriever.widths();
        TutorStats {
            document: self.document.clone(),
            document_sha256: self.document_sha256.clone(),
            chunks: self.chunk_count(),
            dimension: self.retriever.dimension(),
            embedding_model: self.retriever.embedding_model().to_string(),
            generation_model: self.generation.model_name().to_string(),
            search_width: widths.search,
            context_width: widths.context,
            mcq_count: self.mcq_count,
        }
    }
}

fn compute_document_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
