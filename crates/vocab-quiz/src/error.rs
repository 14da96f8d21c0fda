//! Quiz error types.

use thiserror::Error;

/// Errors raised while generating, storing, or answering quizzes.
#[derive(Debug, Error)]
pub enum QuizError {
    /// Malformed input, such as a missing choice id or a choice count below two.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A term, quiz, or choice does not exist or belongs elsewhere.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Too few distinct candidates to build the quiz.
    #[error("Not enough distinct choices: requested {requested}, found {available}")]
    InsufficientChoices { requested: usize, available: usize },

    /// SQLite error.
    #[error("SQLite error: {0}")]
    Storage(#[from] rusqlite::Error),
}

/// Result type for quiz operations.
pub type QuizResult<T> = Result<T, QuizError>;
