//! Data models for vocabulary quizzes.

use crate::error::QuizError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifiers.
pub type TermId = Uuid;
pub type VocabularyId = Uuid;
pub type QuizId = Uuid;
pub type ChoiceId = Uuid;
pub type HistoryId = Uuid;
/// Users live outside this crate; the id comes from the identity context.
pub type UserId = Uuid;

/// Longest choice text, in characters.
pub const MAX_CHOICE_CHARS: usize = 255;

/// A word/definition pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// Unique identifier.
    pub id: TermId,
    /// Owning user, if any.
    pub owner: Option<UserId>,
    /// The word itself.
    pub name: String,
    /// Its definition.
    pub definition: String,
    /// When created.
    pub created_at: DateTime<Utc>,
    /// When last updated.
    pub updated_at: DateTime<Utc>,
}

impl Term {
    /// Create a new term.
    pub fn new(name: impl Into<String>, definition: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner: None,
            name: name.into(),
            definition: definition.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set owner.
    pub fn with_owner(mut self, owner: UserId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Text this term contributes as an answer option.
    pub fn choice_text(&self, question_type: QuestionType) -> String {
        match question_type {
            QuestionType::DefToTerm => self.name.clone(),
            QuestionType::TermToDef => truncate_chars(&self.definition, MAX_CHOICE_CHARS),
        }
    }

    /// Text shown as the question.
    pub fn prompt_text(&self, question_type: QuestionType) -> &str {
        match question_type {
            QuestionType::DefToTerm => &self.definition,
            QuestionType::TermToDef => &self.name,
        }
    }
}

/// A named collection of terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Unique identifier.
    pub id: VocabularyId,
    /// Owning user.
    pub owner: Option<UserId>,
    /// Title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Visible to other users.
    pub is_public: bool,
    /// When created.
    pub created_at: DateTime<Utc>,
}

impl Vocabulary {
    /// Create a new private vocabulary.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: None,
            title: title.into(),
            description: None,
            is_public: false,
            created_at: Utc::now(),
        }
    }

    /// Set description.
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Set owner.
    pub fn with_owner(mut self, owner: UserId) -> Self {
        self.owner = Some(owner);
        self
    }
}

/// Which side of a term is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QuestionType {
    /// Show the definition, pick the term.
    #[default]
    #[serde(rename = "DT")]
    DefToTerm,
    /// Show the term, pick the definition.
    #[serde(rename = "TD")]
    TermToDef,
}

impl QuestionType {
    /// Two-letter code used in URLs and storage.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DefToTerm => "DT",
            Self::TermToDef => "TD",
        }
    }

    /// Get display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DefToTerm => "Definition → Term",
            Self::TermToDef => "Term → Definition",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for QuestionType {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DT" => Ok(Self::DefToTerm),
            "TD" => Ok(Self::TermToDef),
            other => Err(QuizError::InvalidArgument(format!(
                "unknown question type: {other}"
            ))),
        }
    }
}

/// One answer option of a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Unique identifier.
    pub id: ChoiceId,
    /// Parent quiz.
    pub quiz_id: QuizId,
    /// Display text.
    pub text: String,
    /// Whether this is the answer.
    pub is_correct: bool,
    /// Zero-based display position, unique within the quiz.
    pub order: u16,
}

impl Choice {
    /// Create a choice with a placeholder order.
    pub fn new(quiz_id: QuizId, text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            quiz_id,
            text: text.into(),
            is_correct,
            order: 0,
        }
    }
}

/// A generated multiple-choice question for one term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    /// Unique identifier.
    pub id: QuizId,
    /// Source term.
    pub term_id: TermId,
    /// User whose request generated it.
    pub created_by: Option<UserId>,
    /// Question type.
    pub question_type: QuestionType,
    /// When generated.
    pub created_at: DateTime<Utc>,
    /// Choices sorted by `order`.
    pub choices: Vec<Choice>,
}

impl Quiz {
    /// Look up a choice of this quiz.
    pub fn choice(&self, id: ChoiceId) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == id)
    }

    /// The correct choice.
    pub fn correct_choice(&self) -> Option<&Choice> {
        self.choices.iter().find(|c| c.is_correct)
    }
}

/// One user's answer to one quiz. Never updated after insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizHistory {
    /// Unique identifier.
    pub id: HistoryId,
    /// Who answered.
    pub user_id: UserId,
    /// Quiz answered.
    pub quiz_id: QuizId,
    /// Selected choice; cleared if the choice is deleted.
    pub selected_choice_id: Option<ChoiceId>,
    /// Correctness at the time of answering.
    pub is_correct: bool,
    /// When answered.
    pub answered_at: DateTime<Utc>,
}

/// Result of the last submission, shown once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerOutcome {
    Correct,
    Wrong,
    Invalid,
}

impl AnswerOutcome {
    pub fn from_correct(is_correct: bool) -> Self {
        if is_correct {
            Self::Correct
        } else {
            Self::Wrong
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Wrong => "wrong",
            Self::Invalid => "invalid",
        }
    }
}

/// Trim and case-fold text for duplicate detection.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Keep at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_choice_text() {
        let term = Term::new("Photosynthesis", "Process converting light to chemical energy");
        assert_eq!(term.choice_text(QuestionType::DefToTerm), "Photosynthesis");
        assert_eq!(
            term.choice_text(QuestionType::TermToDef),
            "Process converting light to chemical energy"
        );
        assert_eq!(term.prompt_text(QuestionType::DefToTerm), term.definition);
        assert_eq!(term.prompt_text(QuestionType::TermToDef), "Photosynthesis");
    }

    #[test]
    fn test_definition_truncated_by_chars() {
        let long = "語".repeat(300);
        let term = Term::new("word", long);
        let text = term.choice_text(QuestionType::TermToDef);
        assert_eq!(text.chars().count(), MAX_CHOICE_CHARS);
    }

    #[test]
    fn test_question_type_codes() {
        assert_eq!("DT".parse::<QuestionType>().unwrap(), QuestionType::DefToTerm);
        assert_eq!("TD".parse::<QuestionType>().unwrap(), QuestionType::TermToDef);
        assert!(matches!(
            "dt".parse::<QuestionType>(),
            Err(QuizError::InvalidArgument(_))
        ));
        assert_eq!(QuestionType::default(), QuestionType::DefToTerm);
        assert_eq!(QuestionType::TermToDef.to_string(), "TD");
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Mitochondria "), "mitochondria");
        assert_eq!(normalize("   "), "");
    }
}
