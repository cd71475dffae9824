use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use learnify_rules::Difficulty;
use learnify_rules::adaptation::{StoredStep, adapt_step, grade, missing_phases};
use learnify_schema::DeliveredStep;
use learnify_schema::lessons::{
    AnswerCheckRequest, AnswerCheckResponse, LessonCreate, LessonHeader, SubjectCreate,
};
use learnify_schema::users::CreatedResponse;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::require_text;
use crate::db::models::{DbLesson, DbLessonProgress, DbSubject};
use crate::error::LearnifyError;
use crate::server::extract::{ApiJson, ApiPath, ApiQuery};
use crate::server::guards::caller::Caller;
use crate::server::router::LearnifyState;

pub fn router() -> Router<LearnifyState> {
    Router::new()
        .route("/api/subjects", get(list_subjects).post(create_subject))
        .route("/api/lessons", get(list_lessons).post(create_lesson))
        .route("/api/lessons/{id}", get(get_lesson))
        .route(
            "/api/lessons/{id}/steps/{step_id}/check",
            post(check_answer),
        )
}

async fn list_subjects(
    State(state): State<LearnifyState>,
    _caller: Caller,
) -> Result<Json<Vec<DbSubject>>, LearnifyError> {
    Ok(Json(state.db.list_subjects().await?))
}

async fn create_subject(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiJson(body): ApiJson<SubjectCreate>,
) -> Result<(StatusCode, Json<DbSubject>), LearnifyError> {
    caller.require_staff()?;
    require_text("name", &body.name)?;
    let subject = state.db.create_subject(body).await?;
    Ok((StatusCode::CREATED, Json(subject)))
}

async fn list_lessons(
    State(state): State<LearnifyState>,
    _caller: Caller,
) -> Result<Json<Vec<LessonHeader>>, LearnifyError> {
    let lessons = state.db.list_lessons().await?;
    Ok(Json(
        lessons
            .into_iter()
            .map(|l| LessonHeader {
                id: l.id,
                title: l.title,
                subject: l.subject,
                description: l.description,
            })
            .collect(),
    ))
}

async fn create_lesson(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiJson(body): ApiJson<LessonCreate>,
) -> Result<(StatusCode, Json<CreatedResponse>), LearnifyError> {
    caller.require_staff()?;
    require_text("title", &body.title)?;
    require_text("description", &body.description)?;
    require_text("level", &body.level)?;
    require_text("content", &body.content)?;
    if let Some(step) = body
        .steps
        .iter()
        .find(|s| !(Difficulty::MIN.get()..=Difficulty::MAX.get()).contains(&s.difficulty_level))
    {
        return Err(LearnifyError::validation(
            "INVALID_DIFFICULTY",
            format!(
                "step difficultyLevel must be between {} and {}, got {}.",
                Difficulty::MIN.get(),
                Difficulty::MAX.get(),
                step.difficulty_level
            ),
        ));
    }

    let steps = body.steps.len();
    let id = state.db.create_lesson(body, caller.id).await?;
    info!(lesson.id = id, steps, author = caller.id, "Lesson created");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

#[derive(Debug, Deserialize)]
struct LessonQuery {
    difficulty: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LessonView {
    lesson: DbLesson,
    difficulty: u8,
    steps: Vec<DeliveredStep>,
    progress: Option<DbLessonProgress>,
}

async fn load_steps(
    state: &LearnifyState,
    lesson_id: i64,
) -> Result<(DbLesson, Vec<StoredStep>), LearnifyError> {
    let (lesson, rows) = state
        .db
        .get_lesson(lesson_id)
        .await?
        .ok_or_else(|| LearnifyError::not_found(format!("Lesson {lesson_id}")))?;
    let steps = rows
        .into_iter()
        .map(crate::db::models::DbLessonStep::into_stored)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((lesson, steps))
}

async fn get_lesson(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<LessonQuery>,
) -> Result<Json<LessonView>, LearnifyError> {
    let target = query.difficulty.map(Difficulty::new).unwrap_or_default();
    let (lesson, steps) = load_steps(&state, id).await?;

    let missing = missing_phases(&steps);
    if !missing.is_empty() {
        warn!(lesson.id = id, missing = ?missing, "Lesson lacks CPA phases");
    }

    let progress = state.db.get_lesson_progress(caller.id, id).await?;

    Ok(Json(LessonView {
        lesson,
        difficulty: target.get(),
        steps: steps.iter().map(|s| adapt_step(s, target)).collect(),
        progress,
    }))
}

async fn check_answer(
    State(state): State<LearnifyState>,
    _caller: Caller,
    ApiPath((lesson_id, step_id)): ApiPath<(i64, i64)>,
    ApiJson(body): ApiJson<AnswerCheckRequest>,
) -> Result<Json<AnswerCheckResponse>, LearnifyError> {
    let (_, steps) = load_steps(&state, lesson_id).await?;
    let step = steps
        .into_iter()
        .find(|s| s.id == step_id)
        .ok_or_else(|| LearnifyError::not_found(format!("Step {step_id}")))?;

    let correct = grade(step.question.as_ref(), &body.answer).ok_or_else(|| {
        LearnifyError::validation("NOT_GRADABLE", "This step has no question to answer.")
    })?;

    Ok(Json(AnswerCheckResponse {
        step_id,
        correct,
        explanation: step.question.and_then(|q| q.explanation),
    }))
}
