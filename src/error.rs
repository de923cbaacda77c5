use thiserror::Error;

use crate::session::Status;

/// Reasons a quiz cannot back a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    #[error("quiz has no questions")]
    NoQuestions,

    #[error("question {question_id} has {count} choice(s), at least 2 are required")]
    TooFewChoices { question_id: String, count: usize },

    #[error("question {question_id} marks choice {index} as correct but only has {len} choices")]
    CorrectChoiceOutOfRange {
        question_id: String,
        index: usize,
        len: usize,
    },
}

/// Errors returned by `QuizSession` operations.
///
/// A rejected operation never changes session state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("cannot build session: {0}")]
    Construction(#[from] ConstructionError),

    #[error("`{operation}` is not allowed while the quiz is {status}")]
    InvalidTransition {
        operation: &'static str,
        status: Status,
    },

    #[error("choice {index} is out of range, the current question has {len} choices")]
    InvalidChoice { index: usize, len: usize },

    #[error("the current question must be answered first")]
    AnswerRequired,

    #[error("already at the first question")]
    AtBoundary,
}

/// Errors raised while reading quiz files.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed quiz JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] ConstructionError),

    #[error("no bundled quiz named {0}")]
    UnknownBundled(String),
}
