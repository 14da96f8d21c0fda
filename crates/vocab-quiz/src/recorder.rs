//! Answer validation and history records.

use crate::error::{QuizError, QuizResult};
use crate::models::{Choice, ChoiceId, Quiz, QuizHistory, UserId};
use chrono::Utc;
use uuid::Uuid;

/// Parse a submitted choice id.
pub fn parse_choice_id(raw: Option<&str>) -> QuizResult<ChoiceId> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| QuizError::InvalidArgument("missing choice id".to_string()))?;

    Uuid::parse_str(raw)
        .map_err(|e| QuizError::InvalidArgument(format!("malformed choice id {raw:?}: {e}")))
}

/// Find the submitted choice within `quiz`.
pub fn resolve_choice<'q>(quiz: &'q Quiz, raw: Option<&str>) -> QuizResult<&'q Choice> {
    let choice_id = parse_choice_id(raw)?;
    quiz.choice(choice_id).ok_or_else(|| {
        QuizError::NotFound(format!("choice {choice_id} in quiz {}", quiz.id))
    })
}

/// Build the history record for `user` answering `quiz`.
///
/// `is_correct` is copied from the choice now and never recomputed.
pub fn record_answer(user: UserId, quiz: &Quiz, raw: Option<&str>) -> QuizResult<QuizHistory> {
    let choice = resolve_choice(quiz, raw)?;

    Ok(QuizHistory {
        id: Uuid::new_v4(),
        user_id: user,
        quiz_id: quiz.id,
        selected_choice_id: Some(choice.id),
        is_correct: choice.is_correct,
        answered_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionType;

    fn sample_quiz() -> Quiz {
        let quiz_id = Uuid::new_v4();
        let mut right = Choice::new(quiz_id, "Photosynthesis", true);
        right.order = 1;
        let wrong = Choice::new(quiz_id, "Respiration", false);
        Quiz {
            id: quiz_id,
            term_id: Uuid::new_v4(),
            created_by: None,
            question_type: QuestionType::DefToTerm,
            created_at: Utc::now(),
            choices: vec![wrong, right],
        }
    }

    #[test]
    fn test_records_correctness_snapshot() {
        let quiz = sample_quiz();
        let user = Uuid::new_v4();

        let right = quiz.correct_choice().unwrap().id.to_string();
        let history = record_answer(user, &quiz, Some(&right)).unwrap();
        assert!(history.is_correct);
        assert_eq!(history.user_id, user);
        assert_eq!(history.quiz_id, quiz.id);

        let wrong = quiz.choices[0].id.to_string();
        let history = record_answer(user, &quiz, Some(&wrong)).unwrap();
        assert!(!history.is_correct);
    }

    #[test]
    fn test_missing_or_malformed_id() {
        let quiz = sample_quiz();
        let user = Uuid::new_v4();

        assert!(matches!(record_answer(user, &quiz, None), Err(QuizError::InvalidArgument(_))));
        assert!(matches!(record_answer(user, &quiz, Some("  ")), Err(QuizError::InvalidArgument(_))));
        assert!(matches!(record_answer(user, &quiz, Some("42")), Err(QuizError::InvalidArgument(_))));
    }

    #[test]
    fn test_choice_from_other_quiz() {
        let quiz = sample_quiz();
        let other = sample_quiz();
        let foreign = other.choices[0].id.to_string();

        let result = record_answer(Uuid::new_v4(), &quiz, Some(&foreign));
        assert!(matches!(result, Err(QuizError::NotFound(_))));
    }
}
