use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;
use vocab_quiz::QuizError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing or malformed user identity")]
    Unauthorized,

    #[error(transparent)]
    Quiz(#[from] QuizError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Quiz(QuizError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
            AppError::Quiz(QuizError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Quiz(QuizError::InsufficientChoices { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Quiz(QuizError::Storage(_)) | AppError::Internal(_) => {
                error!("Request failed: {self}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}
