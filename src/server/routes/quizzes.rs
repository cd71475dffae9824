use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use learnify_schema::quizzes::{QuizAttemptCreate, QuizCreate};

use super::require_text;
use crate::db::models::{DbQuiz, DbQuizAttempt};
use crate::error::LearnifyError;
use crate::server::extract::{ApiJson, ApiPath};
use crate::server::guards::caller::Caller;
use crate::server::router::LearnifyState;

pub fn router() -> Router<LearnifyState> {
    Router::new()
        .route("/api/quizzes", post(create_quiz))
        .route("/api/quizzes/{id}/attempts", post(record_attempt))
}

async fn create_quiz(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiJson(body): ApiJson<QuizCreate>,
) -> Result<(StatusCode, Json<DbQuiz>), LearnifyError> {
    caller.require_staff()?;
    require_text("title", &body.title)?;
    Ok((StatusCode::CREATED, Json(state.db.create_quiz(body).await?)))
}

async fn record_attempt(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiPath(quiz_id): ApiPath<i64>,
    ApiJson(body): ApiJson<QuizAttemptCreate>,
) -> Result<(StatusCode, Json<DbQuizAttempt>), LearnifyError> {
    if !(0.0..=100.0).contains(&body.score) {
        return Err(LearnifyError::validation(
            "INVALID_SCORE",
            "score must be between 0 and 100.",
        ));
    }
    if body.time_spent_minutes.is_some_and(|m| m < 0) {
        return Err(LearnifyError::validation(
            "INVALID_DURATION",
            "timeSpentMinutes must not be negative.",
        ));
    }
    let attempt = state.db.record_quiz_attempt(quiz_id, caller.id, body).await?;
    Ok((StatusCode::CREATED, Json(attempt)))
}
