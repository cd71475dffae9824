use axum::{Json, Router, extract::State, routing::get};
use learnify_schema::styles::LearningStyleProfileInput;

use crate::db::models::DbLearningStyleProfile;
use crate::error::LearnifyError;
use crate::server::extract::ApiJson;
use crate::server::guards::caller::Caller;
use crate::server::router::LearnifyState;

pub fn router() -> Router<LearnifyState> {
    Router::new().route(
        "/api/learning-styles/profile",
        get(get_profile).post(upsert_profile),
    )
}

async fn get_profile(
    State(state): State<LearnifyState>,
    caller: Caller,
) -> Result<Json<DbLearningStyleProfile>, LearnifyError> {
    state
        .db
        .get_style_profile(caller.id)
        .await?
        .map(Json)
        .ok_or_else(|| LearnifyError::not_found("Learning style profile"))
}

async fn upsert_profile(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiJson(body): ApiJson<LearningStyleProfileInput>,
) -> Result<Json<DbLearningStyleProfile>, LearnifyError> {
    let scores = [body.visual, body.auditory, body.reading, body.kinesthetic];
    if scores.iter().any(|s| !s.is_finite() || *s < 0.0) {
        return Err(LearnifyError::validation(
            "INVALID_SCORE",
            "style scores must be non-negative numbers.",
        ));
    }
    Ok(Json(state.db.upsert_style_profile(caller.id, body).await?))
}
