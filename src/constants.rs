//! Defaults for every configurable value.

use std::time::Duration;

/// Reference document read at startup
pub const DEFAULT_DOCUMENT_PATH: &str = "./sets.txt";

/// Ollama server URL
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Ollama name for all-MiniLM-L6-v2
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm";

pub const DEFAULT_GENERATION_MODEL: &str = "phi3";

/// Low temperature keeps explanations close to the source text
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Upper bound on a single Ollama request
pub const DEFAULT_OLLAMA_TIMEOUT: Duration = Duration::from_secs(600);

pub const DEFAULT_EMBEDDING_BATCH_SIZE: usize = 32;

/// Paragraphs must be longer than this many characters to become chunks
pub const DEFAULT_MIN_CHUNK_CHARS: usize = 50;

/// Neighbours fetched from the index per question
pub const DEFAULT_SEARCH_WIDTH: usize = 10;

/// Neighbours actually passed to the model as context
pub const DEFAULT_CONTEXT_WIDTH: usize = 3;

/// Practice questions requested per answer
pub const DEFAULT_MCQ_COUNT: usize = 4;

/// Upper bound accepted for MCQ_COUNT
pub const MAX_MCQ_COUNT: usize = 20;

pub const DEFAULT_PROMPTS_DIR: &str = "./prompts";

pub const DEFAULT_HTTP_BIND: &str = "127.0.0.1:8501";
