//! # vocab-quiz
//!
//! Multiple-choice quizzes generated from vocabulary terms.
//!
//! ## Features
//!
//! - Definition-to-term and term-to-definition question types
//! - Distractors drawn from the term's vocabularies, widening to every term when short
//! - Atomic get-or-create of one quiz per (term, question type)
//! - Point-in-time answer history per user
//! - SQLite persistence

pub mod config;
pub mod db;
pub mod error;
pub mod generator;
pub mod models;
pub mod recorder;

pub use config::Config;
pub use db::Database;
pub use error::{QuizError, QuizResult};
pub use generator::{generate, GeneratorSettings, TermSource};
pub use models::{
    AnswerOutcome, Choice, ChoiceId, HistoryId, QuestionType, Quiz, QuizHistory, QuizId, Term,
    TermId, UserId, Vocabulary, VocabularyId,
};
pub use recorder::record_answer;
