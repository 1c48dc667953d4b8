//! Shared Ollama plumbing: HTTP client construction and model discovery.
//!
//! Both the embedder and the generator check the same `/api/tags` endpoint at
//! startup so a missing model fails fast instead of on the first question.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Model information from Ollama API
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaModel {
    /// Model name (e.g., "phi3:latest")
    pub name: String,
    /// Model size in bytes
    #[serde(default)]
    pub size: u64,
}

/// Response wrapper for /api/tags endpoint
#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

/// Builds the pooled client used for every Ollama call.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Some(Duration::from_secs(300)))
        .tcp_keepalive(Some(Duration::from_secs(30)))
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Normalizes a base URL: adds `http://` when missing and drops trailing slashes.
pub fn normalize_base_url(base_url: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    if base.starts_with("http://") || base.starts_with("https://") {
        base.to_string()
    } else {
        format!("http://{base}")
    }
}

/// Fetch available models from Ollama
pub async fn fetch_models(client: &Client, base_url: &str) -> Result<Vec<OllamaModel>> {
    let url = format!("{base_url}/api/tags");

    let response = client
        .get(&url)
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                anyhow::anyhow!("Ollama not responding at {base_url} (timeout)")
            } else if e.is_connect() {
                anyhow::anyhow!("Cannot connect to Ollama at {base_url}. Make sure Ollama is running.")
            } else {
                anyhow::anyhow!("Request to {url} failed: {e}")
            }
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow::anyhow!(
            "Failed to list models from Ollama: {} - {}",
            status,
            body
        ));
    }

    let tags: TagsResponse = response
        .json()
        .await
        .context("Invalid /api/tags response from Ollama")?;

    Ok(tags.models)
}

/// Returns true when `model` (with or without a tag) is among `available`.
pub fn model_available(available: &[OllamaModel], model: &str) -> bool {
    available.iter().any(|m| m.name.starts_with(model))
}

/// Checks that Ollama is reachable and that `model` has been pulled.
pub async fn verify_model(client: &Client, base_url: &str, model: &str) -> Result<()> {
    let models = fetch_models(client, base_url).await?;

    if !model_available(&models, model) {
        let names: Vec<_> = models.iter().map(|m| m.name.as_str()).collect();
        return Err(anyhow::anyhow!(
            "Model '{}' not found. Available: {:?}. Run: ollama pull {}",
            model,
            names,
            model
        ));
    }

    tracing::info!("Model '{}' verified at {}", model, base_url);
    Ok(())
}
