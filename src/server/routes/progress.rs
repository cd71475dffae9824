use axum::{Json, Router, extract::State, routing::post};
use learnify_rules::Difficulty;
use learnify_rules::adaptation::grade;
use learnify_rules::xp::{accuracy, accuracy_percent, lesson_xp};
use learnify_schema::progress::{GradedResponse, LessonCompleteRequest, LessonCompleteResponse};
use std::collections::{BTreeMap, HashMap};
use tracing::info;

use crate::db::LessonCompletion;
use crate::error::LearnifyError;
use crate::server::extract::ApiJson;
use crate::server::guards::caller::Caller;
use crate::server::router::LearnifyState;

pub fn router() -> Router<LearnifyState> {
    Router::new().route("/api/progress/lesson-complete", post(complete_lesson))
}

async fn complete_lesson(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiJson(body): ApiJson<LessonCompleteRequest>,
) -> Result<Json<LessonCompleteResponse>, LearnifyError> {
    let (lesson, rows) = state
        .db
        .get_lesson(body.lesson_id)
        .await?
        .ok_or_else(|| LearnifyError::not_found(format!("Lesson {}", body.lesson_id)))?;

    let steps = rows
        .into_iter()
        .map(|row| row.into_stored().map(|s| (s.id, s)))
        .collect::<Result<HashMap<_, _>, _>>()?;

    // Unknown steps and steps without an answer key are not graded.
    let graded: BTreeMap<i64, GradedResponse> = body
        .responses
        .into_iter()
        .filter_map(|(step_id, answer)| {
            let step = steps.get(&step_id)?;
            let is_correct = grade(step.question.as_ref(), &answer)?;
            Some((step_id, GradedResponse { answer, is_correct }))
        })
        .collect();

    let total = u32::try_from(graded.len()).unwrap_or(u32::MAX);
    let correct = u32::try_from(graded.values().filter(|g| g.is_correct).count()).unwrap_or(u32::MAX);
    let difficulty = Difficulty::new(i64::from(body.difficulty_level));
    let xp_earned = lesson_xp(difficulty, correct, total);

    let achievements = state
        .db
        .complete_lesson(LessonCompletion {
            user_id: caller.id,
            lesson_id: lesson.id,
            subject_id: lesson.subject_id,
            subject: lesson.subject,
            difficulty: difficulty.get(),
            accuracy: accuracy(correct, total),
            xp: xp_earned,
            responses: graded,
        })
        .await?;

    info!(
        user.id = caller.id,
        lesson.id = lesson.id,
        correct,
        total,
        xp = xp_earned,
        achievements = achievements.len(),
        "Lesson completed"
    );

    Ok(Json(LessonCompleteResponse {
        xp_earned,
        accuracy: accuracy_percent(correct, total),
        achievements,
    }))
}
