//! Quiz generation.
//!
//! A quiz is one correct choice taken from the source term plus distractors
//! taken from other terms. Distractors come from the vocabularies the term
//! belongs to first; if those run short the pool widens to every term.

use crate::error::{QuizError, QuizResult};
use crate::models::{normalize, Choice, QuestionType, Quiz, Term, UserId};
use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, warn};
use uuid::Uuid;

/// Where distractor candidates come from.
pub trait TermSource {
    /// Terms sharing at least one vocabulary with `term`.
    fn sibling_terms(&self, term: &Term) -> QuizResult<Vec<Term>>;

    /// Every term in the system.
    fn all_terms(&self) -> QuizResult<Vec<Term>>;
}

/// Generation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorSettings {
    /// Total choices per quiz, correct one included.
    pub choice_count: usize,
    /// Accept quizzes with fewer choices than requested when candidates run out.
    pub allow_underfilled: bool,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            choice_count: 4,
            allow_underfilled: true,
        }
    }
}

/// Build a quiz for `term`. Nothing is persisted.
///
/// # Errors
/// * [`QuizError::InvalidArgument`] if `choice_count < 2` or the term has no
///   text on the side being asked for.
/// * [`QuizError::InsufficientChoices`] if no distractor exists at all, or if
///   fewer than requested exist and under-filled quizzes are disallowed.
pub fn generate<S, R>(
    source: &S,
    term: &Term,
    question_type: QuestionType,
    created_by: Option<UserId>,
    settings: &GeneratorSettings,
    rng: &mut R,
) -> QuizResult<Quiz>
where
    S: TermSource + ?Sized,
    R: Rng + ?Sized,
{
    if settings.choice_count < 2 {
        return Err(QuizError::InvalidArgument(format!(
            "choice count must be at least 2, got {}",
            settings.choice_count
        )));
    }

    let correct_text = term.choice_text(question_type);
    let correct_key = normalize(&correct_text);
    if correct_key.is_empty() {
        return Err(QuizError::InvalidArgument(format!(
            "term {} has no text for {}",
            term.id, question_type
        )));
    }

    let wanted = settings.choice_count - 1;
    let mut seen = HashSet::from([correct_key]);

    let mut distractors = pick_distractors(
        source.sibling_terms(term)?,
        term,
        question_type,
        &mut seen,
        wanted,
        rng,
    );

    if distractors.len() < wanted {
        debug!(
            term_id = %term.id,
            found = distractors.len(),
            wanted,
            "Widening distractor pool to all terms"
        );
        let extra = pick_distractors(
            source.all_terms()?,
            term,
            question_type,
            &mut seen,
            wanted - distractors.len(),
            rng,
        );
        distractors.extend(extra);
    }

    if distractors.is_empty() || (distractors.len() < wanted && !settings.allow_underfilled) {
        return Err(QuizError::InsufficientChoices {
            requested: settings.choice_count,
            available: distractors.len() + 1,
        });
    }
    if distractors.len() < wanted {
        warn!(
            term_id = %term.id,
            requested = settings.choice_count,
            available = distractors.len() + 1,
            "Generating quiz with fewer choices than requested"
        );
    }

    let quiz_id = Uuid::new_v4();
    let mut choices = Vec::with_capacity(distractors.len() + 1);
    choices.push(Choice::new(quiz_id, correct_text, true));
    choices.extend(
        distractors
            .into_iter()
            .map(|text| Choice::new(quiz_id, text, false)),
    );

    choices.shuffle(rng);
    for (idx, choice) in choices.iter_mut().enumerate() {
        choice.order = idx as u16;
    }

    Ok(Quiz {
        id: quiz_id,
        term_id: term.id,
        created_by,
        question_type,
        created_at: Utc::now(),
        choices,
    })
}

/// Shuffle `candidates` and keep up to `k` texts not already in `seen`.
fn pick_distractors<R: Rng + ?Sized>(
    mut candidates: Vec<Term>,
    term: &Term,
    question_type: QuestionType,
    seen: &mut HashSet<String>,
    k: usize,
    rng: &mut R,
) -> Vec<String> {
    candidates.retain(|t| t.id != term.id);
    candidates.shuffle(rng);

    let mut picked = Vec::with_capacity(k);
    for candidate in candidates {
        if picked.len() >= k {
            break;
        }
        let text = candidate.choice_text(question_type);
        let key = normalize(&text);
        if key.is_empty() || !seen.insert(key) {
            continue;
        }
        picked.push(text);
    }
    picked
}
