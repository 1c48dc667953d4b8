//! Configuration loading for the tutor
//!
//! Centralizes environment variable reading into a single struct.

use anyhow::Result;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::*;
use crate::retriever::RetrievalWidths;

/// Tutor configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Reference document path
    pub document_path: PathBuf,

    /// Ollama server URL
    pub ollama_url: String,

    pub embedding_model: String,

    pub generation_model: String,

    pub temperature: f32,

    /// Per-request timeout for Ollama calls
    pub ollama_timeout: Duration,

    pub embedding_batch_size: usize,

    pub min_chunk_chars: usize,

    pub search_width: usize,

    pub context_width: usize,

    /// Number of MCQs requested per answer
    pub mcq_count: usize,

    /// Directory holding optional prompt overrides
    pub prompts_dir: PathBuf,

    /// Address the HTTP API binds to
    pub http_bind: String,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Self {
            document_path: PathBuf::from(string("DOCUMENT_PATH", DEFAULT_DOCUMENT_PATH)),
            ollama_url: string("OLLAMA_URL", DEFAULT_OLLAMA_URL),
            embedding_model: string("OLLAMA_EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            generation_model: string("OLLAMA_GENERATION_MODEL", DEFAULT_GENERATION_MODEL),
            temperature: parse_or(&lookup, "GENERATION_TEMPERATURE", DEFAULT_TEMPERATURE),
            ollama_timeout: lookup("OLLAMA_TIMEOUT_SECS")
                .and_then(|s| s.trim().parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_OLLAMA_TIMEOUT),
            embedding_batch_size: parse_or(
                &lookup,
                "EMBEDDING_BATCH_SIZE",
                DEFAULT_EMBEDDING_BATCH_SIZE,
            ),
            min_chunk_chars: parse_or(&lookup, "MIN_CHUNK_CHARS", DEFAULT_MIN_CHUNK_CHARS),
            search_width: parse_or(&lookup, "SEARCH_WIDTH", DEFAULT_SEARCH_WIDTH),
            context_width: parse_or(&lookup, "CONTEXT_WIDTH", DEFAULT_CONTEXT_WIDTH),
            mcq_count: parse_or(&lookup, "MCQ_COUNT", DEFAULT_MCQ_COUNT),
            prompts_dir: PathBuf::from(string("PROMPTS_DIR", DEFAULT_PROMPTS_DIR)),
            http_bind: string("TUTOR_HTTP_BIND", DEFAULT_HTTP_BIND),
        }
    }

    /// Rejects combinations that cannot work, before anything is started.
    pub fn validate(&self) -> Result<()> {
        self.widths()?;
        anyhow::ensure!(
            (1..=MAX_MCQ_COUNT).contains(&self.mcq_count),
            "MCQ_COUNT must be between 1 and {MAX_MCQ_COUNT}, got {}",
            self.mcq_count
        );
        anyhow::ensure!(
            self.embedding_batch_size > 0,
            "EMBEDDING_BATCH_SIZE must be positive"
        );
        anyhow::ensure!(
            self.temperature.is_finite() && self.temperature >= 0.0,
            "GENERATION_TEMPERATURE must be a non-negative number"
        );
        Ok(())
    }

    pub fn widths(&self) -> Result<RetrievalWidths> {
        RetrievalWidths::new(self.search_width, self.context_width)
    }

    /// Build a summary string for display
    pub fn summary(&self) -> String {
        format!(
            "DOCUMENT={}  OLLAMA={}  EMBED={}  GENERATE={}  WIDTHS={}/{}",
            self.document_path.display(),
            self.ollama_url,
            self.embedding_model,
            self.generation_model,
            self.search_width,
            self.context_width
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = config_with(&[]);

        assert_eq!(config.document_path, PathBuf::from("./sets.txt"));
        assert_eq!(config.ollama_url, "http://localhost:11434");
        assert_eq!(config.embedding_model, "all-minilm");
        assert_eq!(config.generation_model, "phi3");
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.search_width, 10);
        assert_eq!(config.context_width, 3);
        assert_eq!(config.mcq_count, 4);
        assert_eq!(config.min_chunk_chars, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_overrides() {
        let config = config_with(&[
            ("DOCUMENT_PATH", "/srv/sets.txt"),
            ("OLLAMA_GENERATION_MODEL", "llama3.1"),
            ("SEARCH_WIDTH", "20"),
            ("CONTEXT_WIDTH", " 5 "),
            ("OLLAMA_TIMEOUT_SECS", "30"),
        ]);

        assert_eq!(config.document_path, PathBuf::from("/srv/sets.txt"));
        assert_eq!(config.generation_model, "llama3.1");
        assert_eq!(config.widths().unwrap(), RetrievalWidths::new(20, 5).unwrap());
        assert_eq!(config.ollama_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_unparseable_numbers_fall_back() {
        let config = config_with(&[("MCQ_COUNT", "four"), ("GENERATION_TEMPERATURE", "hot")]);
        assert_eq!(config.mcq_count, 4);
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_validate_rejects_bad_combinations() {
        assert!(config_with(&[("CONTEXT_WIDTH", "11")]).validate().is_err());
        assert!(config_with(&[("MCQ_COUNT", "0")]).validate().is_err());
        assert!(config_with(&[("MCQ_COUNT", "21")]).validate().is_err());
        assert!(config_with(&[("EMBEDDING_BATCH_SIZE", "0")]).validate().is_err());
        assert!(config_with(&[("GENERATION_TEMPERATURE", "-1")]).validate().is_err());
    }

    #[test]
    fn test_config_summary() {
        let summary = config_with(&[]).summary();
        assert!(summary.contains("DOCUMENT=./sets.txt"));
        assert!(summary.contains("OLLAMA=http://localhost:11434"));
        assert!(summary.contains("WIDTHS=10/3"));
    }
}
