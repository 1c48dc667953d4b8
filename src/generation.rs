use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::ollama;
use crate::prompts::PromptTemplates;
use crate::retriever::RetrievedChunk;

/// Failures talking to the text-generation service.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation service unreachable: {0}")]
    Unreachable(String),

    #[error("generation service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("generation service response has no text: {0}")]
    MissingResponse(String),
}

/// Sends a prompt to a language model and returns its raw completion.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn model_name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize, Debug)]
struct OllamaGenerateResponse {
    response: String,
}

/// Non-streaming client for Ollama's `/api/generate`.
pub struct OllamaGenerator {
    client: reqwest::Client,
    ollama_url: String,
    model: String,
    temperature: f32,
}

impl OllamaGenerator {
    pub fn new(ollama_url: &str, model: &str, temperature: f32, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: ollama::build_client(timeout)?,
            ollama_url: ollama::normalize_base_url(ollama_url),
            model: model.to_string(),
            temperature,
        })
    }

    /// Creates the generator and checks that Ollama serves the model.
    pub async fn connect(
        ollama_url: &str,
        model: &str,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self> {
        let generator = Self::new(ollama_url, model, temperature, timeout)?;
        tracing::info!("Ollama generation model: {}", generator.model);
        ollama::verify_model(&generator.client, &generator.ollama_url, &generator.model).await?;
        Ok(generator)
    }

    fn request<'a>(&'a self, prompt: &'a str) -> OllamaGenerateRequest<'a> {
        OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
            },
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let started = Instant::now();

        let response = self
            .client
            .post(format!("{}/api/generate", self.ollama_url))
            .json(&self.request(prompt))
            .send()
            .await
            .map_err(|e| GenerationError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status { status, body });
        }

        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::Unreachable(e.to_string()))?;
        let text = parse_generate_body(&body)?;

        tracing::debug!(
            model = %self.model,
            elapsed_ms = %started.elapsed().as_millis(),
            chars = %text.chars().count(),
            "Generation finished"
        );

        Ok(text)
    }
}

fn parse_generate_body(body: &str) -> Result<String, GenerationError> {
    serde_json::from_str::<OllamaGenerateResponse>(body)
        .map(|payload| payload.response)
        .map_err(|e| GenerationError::MissingResponse(e.to_string()))
}

/// Builds the tutor's two prompts and sends them to the generator.
pub struct GenerationClient {
    generator: Arc<dyn TextGenerator>,
    templates: PromptTemplates,
}

impl GenerationClient {
    pub fn new(generator: Arc<dyn TextGenerator>, templates: PromptTemplates) -> Self {
        Self {
            generator,
            templates,
        }
    }

    pub fn model_name(&self) -> &str {
        self.generator.model_name()
    }

    /// Explanation of `question` grounded only in `chunks`.
    pub async fn explain(
        &self,
        question: &str,
        chunks: &[RetrievedChunk],
    ) -> Result<String, GenerationError> {
        let prompt = self.templates.explain(question, chunks);
        tracing::debug!("Explanation prompt: {} chars", prompt.len());
        self.generator.generate(&prompt).await
    }

    /// Raw text for `count` multiple-choice questions about `chunks`.
    pub async fn generate_mcqs(
        &self,
        chunks: &[RetrievedChunk],
        count: usize,
    ) -> Result<String, GenerationError> {
        let prompt = self.templates.mcq(chunks, count);
        tracing::debug!("MCQ prompt: {} chars", prompt.len());
        self.generator.generate(&prompt).await
    }
}
