use axum::{Json, Router, extract::State, routing::post};
use learnify_schema::feedback::{Feedback, FeedbackRequest};
use tracing::debug;

use super::require_text;
use crate::error::LearnifyError;
use crate::server::extract::ApiJson;
use crate::server::guards::caller::Caller;
use crate::server::router::LearnifyState;

pub fn router() -> Router<LearnifyState> {
    Router::new().route("/api/ai/generate-feedback", post(generate_feedback))
}

async fn generate_feedback(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiJson(body): ApiJson<FeedbackRequest>,
) -> Result<Json<Feedback>, LearnifyError> {
    require_text("studentResponse", &body.student_response)?;
    require_text("questionContext", &body.question_context)?;

    let feedback = state.ai.generate_feedback(&body).await?;
    debug!(
        user.id = caller.id,
        understanding = ?feedback.conceptual_understanding,
        "Feedback generated"
    );
    Ok(Json(feedback))
}
