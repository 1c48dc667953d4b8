//! Stub collaborators shared by the integration tests.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use sets_tutor::embeddings::Embedder;
use sets_tutor::generation::{GenerationError, TextGenerator};
use sets_tutor::{Tutor, TutorOptions};

pub const SETS_DOCUMENT: &str = "Sets

A set is a well-defined collection of objects. The objects in a set are called its elements or members.

In roster form, all the elements of a set are listed, separated by commas and enclosed within braces. For example, the set of all even positive integers less than 7 is written as {2, 4, 6}.

In set-builder form, all the elements of a set possess a single common property which is not possessed by any element outside the set. For example, {2, 3, 5, 7} in set-builder form is {x : x is a prime number less than 10}.

A set which does not contain any element is called the empty set or the null set, and is denoted by the symbol \u{2205} or { }.

Exercise 1.1";

pub const MCQ_TEXT: &str = "Q1. Which of the following is the set-builder form of {2, 3, 5, 7}?
A. {x : x is an odd number less than 10}
B. {x : x is a prime number less than 10}
C. {x : x is a natural number less than 8}
D. {x : x is an even number less than 10}
Answer: B

Q2. How are the elements of a set listed in roster form?
A. Separated by commas within braces
B. Separated by semicolons within brackets
C. Written as a property
D. Not listed at all
Answer: A

Q3. What is the empty set?
A. A set with one element
B. A set containing zero
C. A set with no elements
Answer: C

Q4. The objects in a set are called its
A. Elements
B. Factors
C. Roots
D. Terms
Answer: A";

const VOCABULARY: [&str; 8] = [
    "set", "builder", "roster", "element", "empty", "prime", "braces", "property",
];

/// Embeds text as vocabulary counts so retrieval is deterministic.
#[derive(Default)]
pub struct KeywordEmbedder {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn model_name(&self) -> &str {
        "keyword-stub"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let lower = text.to_lowercase();
        let mut vector: Vec<f32> = VOCABULARY
            .iter()
            .map(|word| lower.matches(word).count() as f32)
            .collect();
        vector.push(0.5);
        Ok(vector)
    }
}

/// Indexes like [`KeywordEmbedder`] but fails every question embedding, as
/// when Ollama goes away after startup.
#[derive(Default)]
pub struct QueryFailingEmbedder {
    pub inner: KeywordEmbedder,
    pub query_calls: AtomicUsize,
}

#[async_trait]
impl Embedder for QueryFailingEmbedder {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.inner.embed(text).await
    }

    async fn embed_query(&self, _text: &str) -> Result<Vec<f32>> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        Err(anyhow::anyhow!("embedding service down"))
    }
}

/// Replies to explanation prompts and MCQ prompts with canned text.
pub struct ScriptedGenerator {
    pub explanation: Result<String, u16>,
    pub mcqs: Result<String, u16>,
    pub calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(explanation: Result<&str, u16>, mcqs: Result<&str, u16>) -> Self {
        Self {
            explanation: explanation.map(str::to_string),
            mcqs: mcqs.map(str::to_string),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn healthy() -> Self {
        Self::new(
            Ok("{x : x is a prime number less than 10}"),
            Ok(MCQ_TEXT),
        )
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn model_name(&self) -> &str {
        "scripted-stub"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let scripted = if prompt.contains("multiple-choice questions") {
            &self.mcqs
        } else {
            &self.explanation
        };
        scripted.clone().map_err(|status| GenerationError::Status {
            status,
            body: "scripted failure".to_string(),
        })
    }
}

pub async fn build_tutor(
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn TextGenerator>,
) -> Tutor {
    Tutor::build(
        "sets.txt",
        SETS_DOCUMENT,
        embedder,
        generator,
        TutorOptions::default(),
    )
    .await
    .expect("tutor builds over the stub document")
}
