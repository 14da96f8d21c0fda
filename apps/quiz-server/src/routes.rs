use axum::{
    extract::{Path, State},
    response::Redirect,
    routing::get,
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use uuid::Uuid;
use vocab_quiz::{AnswerOutcome, ChoiceId, QuestionType, QuizError, QuizId, TermId};

use crate::{error::AppError, state::AppState, user::CurrentUser};

#[derive(Debug, Deserialize)]
pub struct AnswerForm {
    choice_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChoiceView {
    pub id: ChoiceId,
    pub text: String,
    pub order: u16,
}

/// A quiz as shown to the player; correctness stays server-side.
#[derive(Debug, Serialize)]
pub struct QuizView {
    pub quiz_id: QuizId,
    pub term_id: TermId,
    pub question_type: QuestionType,
    pub prompt: String,
    pub choices: Vec<ChoiceView>,
    pub last: Option<AnswerOutcome>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/quiz/:term_id", get(show_default_handler).post(answer_default_handler))
        .route("/quiz/:term_id/:question_type", get(show_handler).post(answer_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn show_default_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(term_id): Path<Uuid>,
) -> Result<Json<QuizView>, AppError> {
    show_quiz(state, user, term_id, QuestionType::default()).await
}

pub async fn show_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((term_id, question_type)): Path<(Uuid, String)>,
) -> Result<Json<QuizView>, AppError> {
    show_quiz(state, user, term_id, question_type.parse()?).await
}

pub async fn answer_default_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(term_id): Path<Uuid>,
    Form(form): Form<AnswerForm>,
) -> Result<Redirect, AppError> {
    answer_quiz(state, user, term_id, QuestionType::default(), form).await
}

pub async fn answer_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((term_id, question_type)): Path<(Uuid, String)>,
    Form(form): Form<AnswerForm>,
) -> Result<Redirect, AppError> {
    answer_quiz(state, user, term_id, question_type.parse()?, form).await
}

async fn show_quiz(
    state: AppState,
    CurrentUser(user_id): CurrentUser,
    term_id: TermId,
    question_type: QuestionType,
) -> Result<Json<QuizView>, AppError> {
    let settings = state.settings;

    let (term, quiz) = state
        .with_db(move |db| {
            let term = db
                .get_term(term_id)?
                .ok_or_else(|| QuizError::NotFound(format!("term {term_id}")))?;
            let quiz = db.get_or_create_quiz(
                term_id,
                question_type,
                Some(user_id),
                &settings,
                &mut rand::thread_rng(),
            )?;
            Ok((term, quiz))
        })
        .await?;

    let last = state.take_result(&(user_id, term_id, question_type));

    Ok(Json(QuizView {
        quiz_id: quiz.id,
        term_id,
        question_type,
        prompt: term.prompt_text(question_type).to_string(),
        choices: quiz
            .choices
            .into_iter()
            .map(|c| ChoiceView {
                id: c.id,
                text: c.text,
                order: c.order,
            })
            .collect(),
        last,
    }))
}

async fn answer_quiz(
    state: AppState,
    CurrentUser(user_id): CurrentUser,
    term_id: TermId,
    question_type: QuestionType,
    form: AnswerForm,
) -> Result<Redirect, AppError> {
    let settings = state.settings;

    let outcome = state
        .with_db(move |db| {
            let quiz = db.get_or_create_quiz(
                term_id,
                question_type,
                Some(user_id),
                &settings,
                &mut rand::thread_rng(),
            )?;
            match db.record_answer(user_id, &quiz, form.choice_id.as_deref()) {
                Ok(history) => Ok(AnswerOutcome::from_correct(history.is_correct)),
                Err(QuizError::InvalidArgument(_)) => Ok(AnswerOutcome::Invalid),
                Err(e) => Err(e),
            }
        })
        .await?;

    state.store_result((user_id, term_id, question_type), outcome);

    Ok(Redirect::to(&format!("/quiz/{term_id}/{question_type}")))
}
