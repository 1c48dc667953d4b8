//! Prompt templates for the explanation and MCQ requests.
//!
//! Templates use `{question}`, `{content}`, `{count}` and `{format}`
//! placeholders and can be replaced at deploy time by dropping `explain.txt`
//! or `mcq.txt` into the prompts directory.

use std::path::Path;

use crate::retriever::RetrievedChunk;

/// Sentence the model must return when the content does not answer the question.
pub const NOT_FOUND_ANSWER: &str = "Answer not found in the provided material.";

const CHOICE_LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

const DEFAULT_EXPLAIN_TEMPLATE: &str = r#"
You are a strict mathematics teacher for Class 11.

Answer the question ONLY using the information given below.

Rules:
- Use definitions and examples exactly as stated in the content.
- If a mathematical term appears (example: prime number, natural number),
  first identify its definition from the content.
- Do NOT assume or invent conditions.
- Do NOT use outside knowledge.
- If the answer cannot be clearly formed from the content, respond exactly with:
  "Answer not found in the provided material."

Question:
{question}

Content:
{content}

Final Answer:
"#;

const DEFAULT_MCQ_TEMPLATE: &str = r#"
You are a mathematics teacher for Class 11.

Generate EXACTLY {count} multiple-choice questions (MCQs)
based ONLY on the content below.

IMPORTANT RULES:
- Generate EXACTLY {count} questions
- Each question must have 4 options: A, B, C, D
- The answer must be exactly one of A, B, C, or D
- Write the answer line strictly as: Answer: A
- Do NOT add any extra information
- Do NOT repeat questions

Content:
{content}

FORMAT:
{format}
"#;

#[derive(Debug, Clone)]
pub struct PromptTemplates {
    explain: String,
    mcq: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            explain: DEFAULT_EXPLAIN_TEMPLATE.to_string(),
            mcq: DEFAULT_MCQ_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Loads `explain.txt` and `mcq.txt` from `prompts_dir`, falling back to
    /// the compiled-in template for each file that is missing.
    pub fn load(prompts_dir: &Path) -> Self {
        let defaults = Self::default();
        Self {
            explain: load_template(prompts_dir, "explain.txt", defaults.explain),
            mcq: load_template(prompts_dir, "mcq.txt", defaults.mcq),
        }
    }

    pub fn explain(&self, question: &str, chunks: &[RetrievedChunk]) -> String {
        let content = join_content(chunks);
        render(
            &self.explain,
            &[("question", question.trim()), ("content", &content)],
        )
    }

    pub fn mcq(&self, chunks: &[RetrievedChunk], count: usize) -> String {
        let content = join_content(chunks);
        let format = format_example(count);
        render(
            &self.mcq,
            &[
                ("count", &count.to_string()),
                ("format", &format),
                ("content", &content),
            ],
        )
    }
}

/// Fills `{name}` placeholders in a single pass. Substituted values are never
/// rescanned, and braces that do not name a known placeholder are kept.
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        let placeholder = tail.find('}').and_then(|end| {
            let name = &tail[1..end];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (end, *value))
        });

        match placeholder {
            Some((end, value)) => {
                out.push_str(value);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn load_template(dir: &Path, file_name: &str, default: String) -> String {
    let path = dir.join(file_name);
    match std::fs::read_to_string(&path) {
        Ok(template) => {
            tracing::info!("Loaded prompt template from {}", path.display());
            template
        }
        Err(_) => {
            tracing::info!(
                "Using default prompt (no external file found at {})",
                path.display()
            );
            default
        }
    }
}

fn join_content(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Example blocks showing the exact MCQ layout, answers cycling A..D.
fn format_example(count: usize) -> String {
    (0..count)
        .map(|i| {
            let answer = CHOICE_LETTERS[i % CHOICE_LETTERS.len()];
            format!(
                "Q{}. Question\nA. option\nB. option\nC. option\nD. option\nAnswer: {}",
                i + 1,
                answer
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
