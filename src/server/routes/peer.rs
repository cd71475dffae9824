use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use learnify_schema::peer::TeachBackCreate;

use super::require_text;
use crate::db::models::DbTeachBack;
use crate::error::LearnifyError;
use crate::server::extract::ApiJson;
use crate::server::guards::caller::Caller;
use crate::server::router::LearnifyState;

pub fn router() -> Router<LearnifyState> {
    Router::new().route("/api/peer-teaching/teach-back", post(teach_back))
}

async fn teach_back(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiJson(body): ApiJson<TeachBackCreate>,
) -> Result<(StatusCode, Json<DbTeachBack>), LearnifyError> {
    require_text("sessionId", &body.session_id)?;
    require_text("questionId", &body.question_id)?;
    require_text("answer", &body.answer)?;
    Ok((
        StatusCode::CREATED,
        Json(state.db.record_teach_back(caller.id, body).await?),
    ))
}
