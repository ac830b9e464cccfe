//! Grading error types.
//!
//! Malformed question or answer data is never an error: it degrades to a
//! conservative canonical shape or to zero credit. The only failures surfaced
//! here are configuration errors that would otherwise award credit silently.

use thiserror::Error;

/// Errors raised while resolving or grading questions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GradingError {
    /// The question type slug is not one the validator knows how to grade.
    #[error("unknown question type: {0}")]
    UnknownQuestionType(String),

    /// A specific question could not be resolved into a gradable form.
    #[error("question '{question_id}' cannot be graded: {source}")]
    Question {
        question_id: String,
        #[source]
        source: Box<GradingError>,
    },
}

impl GradingError {
    /// Attach the offending question ID to this error.
    pub fn for_question(self, question_id: impl Into<String>) -> Self {
        GradingError::Question {
            question_id: question_id.into(),
            source: Box::new(self),
        }
    }

    /// The question ID this error refers to, if any.
    pub fn question_id(&self) -> Option<&str> {
        match self {
            GradingError::Question { question_id, .. } => Some(question_id),
            GradingError::UnknownQuestionType(_) => None,
        }
    }

    /// The unrecognised type slug at the root of this error.
    pub fn unknown_type(&self) -> Option<&str> {
        match self {
            GradingError::UnknownQuestionType(slug) => Some(slug),
            GradingError::Question { source, .. } => source.unknown_type(),
        }
    }
}
