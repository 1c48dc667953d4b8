use crate::generation::GenerationError;

/// Errors surfaced to callers of [`crate::tutor::Tutor::answer`].
#[derive(Debug, thiserror::Error)]
pub enum TutorError {
    #[error("Please enter a question.")]
    EmptyQuestion,

    #[error("could not embed the question: {0:#}")]
    Embedding(anyhow::Error),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl TutorError {
    /// True for errors caused by the request rather than a backend.
    pub fn is_user_error(&self) -> bool {
        matches!(self, TutorError::EmptyQuestion)
    }
}
