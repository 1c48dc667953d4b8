use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use sets_tutor::chunker::chunk_paragraphs;
use sets_tutor::config::Config;
use sets_tutor::embeddings::OllamaEmbedder;
use sets_tutor::generation::OllamaGenerator;
use sets_tutor::prompts::PromptTemplates;
use sets_tutor::{Tutor, TutorOptions, server};

fn get_log_dir() -> String {
    std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string())
}

fn get_log_level() -> String {
    std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
}

fn get_log_max_mb() -> u64 {
    std::env::var("LOG_MAX_MB")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(5)
}

fn setup_logging() -> Result<()> {
    let log_dir = get_log_dir();
    let log_level = get_log_level();
    let log_max_mb = get_log_max_mb();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let is_development = std::env::var("DEVELOPMENT").is_ok() || std::env::var("DEV").is_ok();
    let force_console = std::env::var("CONSOLE_LOGS").is_ok();

    if is_development || force_console {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .compact()
            .init();
        tracing::info!("Development mode: logging to console");
    } else {
        std::fs::create_dir_all(&log_dir)?;
        let log_file = format!("{}/sets-tutor.log", log_dir);
        let file_appender = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)?;

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(file_appender)
            .json()
            .init();
    }

    tracing::info!("Logging initialized");
    tracing::info!("Log directory: {}", log_dir);
    tracing::info!("Log level: {}", log_level);
    tracing::info!("Log max size: {}MB (auto-truncate)", log_max_mb);

    Ok(())
}

fn start_log_cleanup_task(log_dir: String, max_mb: u64) {
    let max_bytes = max_mb * 1024 * 1024;
    let log_file = format!("{}/sets-tutor.log", log_dir);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(300));

        loop {
            interval.tick().await;

            if let Ok(metadata) = std::fs::metadata(&log_file)
                && metadata.len() > max_bytes
                && let Err(e) = std::fs::write(
                    &log_file,
                    format!("[LOG TRUNCATED - Size exceeded {}MB]\n", max_mb),
                )
            {
                eprintln!("Failed to truncate log file: {}", e);
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenv::dotenv() {
        eprintln!("Warning: Could not load .env file: {}", e);
    }
    setup_logging()?;
    start_log_cleanup_task(get_log_dir(), get_log_max_mb());

    let config = Config::from_env();
    config.validate().context("Invalid configuration")?;
    tracing::info!("{}", config.summary());

    let text = tokio::fs::read_to_string(&config.document_path)
        .await
        .with_context(|| {
            format!(
                "Failed to read reference document {}",
                config.document_path.display()
            )
        })?;

    let options = TutorOptions {
        min_chunk_chars: config.min_chunk_chars,
        widths: config.widths()?,
        embedding_batch_size: config.embedding_batch_size,
        mcq_count: config.mcq_count,
        templates: PromptTemplates::load(&config.prompts_dir),
    };

    let document = config.document_path.display().to_string();
    let chunks = chunk_paragraphs(&text, options.min_chunk_chars);
    if chunks.is_empty() {
        anyhow::bail!(
            "Reference document {} has no paragraphs longer than {} characters",
            document,
            options.min_chunk_chars
        );
    }
    tracing::info!("Created {} chunks from {}", chunks.len(), document);

    let embedder = OllamaEmbedder::connect(
        &config.ollama_url,
        &config.embedding_model,
        config.ollama_timeout,
    )
    .await?;
    let generator = OllamaGenerator::connect(
        &config.ollama_url,
        &config.generation_model,
        config.temperature,
        config.ollama_timeout,
    )
    .await?;

    let tutor = Tutor::from_chunks(
        &document,
        &text,
        chunks,
        Arc::new(embedder),
        Arc::new(generator),
        options,
    )
    .await
    .context("Failed to build the retrieval index")?;

    tracing::info!("Tutor ready with {} chunks", tutor.chunk_count());

    let listener = tokio::net::TcpListener::bind(&config.http_bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.http_bind))?;

    server::serve(listener, Arc::new(tutor)).await
}
