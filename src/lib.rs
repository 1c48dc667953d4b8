//! Retrieval-augmented tutor for the Class 11 Sets chapter.
//!
//! The reference document is split into paragraphs, embedded through Ollama
//! and kept in a flat L2 index. Each question retrieves the nearest
//! paragraphs, asks a local model for an explanation and a set of practice
//! MCQs, and returns both with a confidence hint.

pub mod chunker;
pub mod confidence;
pub mod config;
pub mod constants;
pub mod embeddings;
pub mod error;
pub mod generation;
pub mod index;
pub mod mcq;
pub mod ollama;
pub mod prompts;
pub mod retriever;
pub mod server;
pub mod tutor;

pub use error::TutorError;
pub use tutor::{Tutor, TutorAnswer, TutorOptions};
