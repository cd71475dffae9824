//! Social-emotional learning: moods, daily affirmations, mindfulness.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use learnify_rules::sel::{MOOD_INTENSITY, age_group, validate_age_group};
use learnify_schema::sel::{
    AffirmationCreate, MindfulnessPromptCreate, MoodCreate, ReflectionRequest,
};
use serde::Deserialize;

use super::require_text;
use crate::db::models::{
    DbAffirmation, DbDailyAffirmation, DbDailyMindfulness, DbMindfulnessPrompt, DbMoodEntry,
};
use crate::error::LearnifyError;
use crate::server::extract::{ApiJson, ApiQuery};
use crate::server::guards::caller::Caller;
use crate::server::router::LearnifyState;

pub fn router() -> Router<LearnifyState> {
    Router::new()
        .route("/api/sel/moods", get(list_moods).post(create_mood))
        .route("/api/sel/affirmations", post(create_affirmation))
        .route("/api/sel/growth-mindset/daily", get(daily_affirmation))
        .route(
            "/api/sel/growth-mindset/acknowledge",
            post(acknowledge_affirmation),
        )
        .route("/api/sel/mindfulness-prompts", post(create_prompt))
        .route("/api/sel/mindfulness-prompts/daily", get(daily_mindfulness))
        .route(
            "/api/sel/mindfulness-prompts/complete",
            post(complete_mindfulness),
        )
}

#[derive(Debug, Deserialize)]
struct MoodQuery {
    date: Option<NaiveDate>,
}

async fn list_moods(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiQuery(query): ApiQuery<MoodQuery>,
) -> Result<Json<Vec<DbMoodEntry>>, LearnifyError> {
    Ok(Json(state.db.list_moods(caller.id, query.date).await?))
}

async fn create_mood(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiJson(body): ApiJson<MoodCreate>,
) -> Result<(StatusCode, Json<DbMoodEntry>), LearnifyError> {
    require_text("mood", &body.mood)?;
    if !MOOD_INTENSITY.contains(&body.intensity) {
        return Err(LearnifyError::validation(
            "INVALID_INTENSITY",
            format!(
                "intensity must be between {} and {}.",
                MOOD_INTENSITY.start(),
                MOOD_INTENSITY.end()
            ),
        ));
    }
    Ok((
        StatusCode::CREATED,
        Json(state.db.create_mood(caller.id, body).await?),
    ))
}

async fn caller_age_group(
    state: &LearnifyState,
    caller: &Caller,
) -> Result<&'static str, LearnifyError> {
    let user = state
        .db
        .get_user(caller.id)
        .await?
        .ok_or_else(|| LearnifyError::not_found(format!("User {}", caller.id)))?;
    Ok(age_group(user.age))
}

async fn daily_affirmation(
    State(state): State<LearnifyState>,
    caller: Caller,
) -> Result<Json<DbDailyAffirmation>, LearnifyError> {
    let group = caller_age_group(&state, &caller).await?;
    let today = Utc::now().date_naive();
    state
        .db
        .daily_affirmation(caller.id, group, today)
        .await?
        .map(Json)
        .ok_or_else(|| LearnifyError::not_found(format!("Affirmation for age group {group}")))
}

async fn acknowledge_affirmation(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiJson(body): ApiJson<ReflectionRequest>,
) -> Result<Json<DbDailyAffirmation>, LearnifyError> {
    let today = Utc::now().date_naive();
    state
        .db
        .acknowledge_affirmation(caller.id, today, body.reflection)
        .await?
        .map(Json)
        .ok_or_else(|| LearnifyError::not_found("Today's affirmation"))
}

async fn daily_mindfulness(
    State(state): State<LearnifyState>,
    caller: Caller,
) -> Result<Json<DbDailyMindfulness>, LearnifyError> {
    let group = caller_age_group(&state, &caller).await?;
    let today = Utc::now().date_naive();
    state
        .db
        .daily_mindfulness(caller.id, group, today)
        .await?
        .map(Json)
        .ok_or_else(|| LearnifyError::not_found(format!("Mindfulness prompt for age group {group}")))
}

async fn complete_mindfulness(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiJson(body): ApiJson<ReflectionRequest>,
) -> Result<Json<DbDailyMindfulness>, LearnifyError> {
    let group = caller_age_group(&state, &caller).await?;
    let today = Utc::now().date_naive();
    state
        .db
        .complete_mindfulness(caller.id, group, today, body.reflection)
        .await?
        .map(Json)
        .ok_or_else(|| LearnifyError::not_found(format!("Mindfulness prompt for age group {group}")))
}

fn check_age_group(group: &str) -> Result<(), LearnifyError> {
    if validate_age_group(group) {
        Ok(())
    } else {
        Err(LearnifyError::validation(
            "INVALID_AGE_GROUP",
            "ageGroup must be one of 5-7, 8-11, 12-14.",
        ))
    }
}

async fn create_affirmation(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiJson(body): ApiJson<AffirmationCreate>,
) -> Result<(StatusCode, Json<DbAffirmation>), LearnifyError> {
    caller.require_staff()?;
    require_text("text", &body.text)?;
    check_age_group(&body.age_group)?;
    Ok((
        StatusCode::CREATED,
        Json(state.db.create_affirmation(body).await?),
    ))
}

async fn create_prompt(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiJson(body): ApiJson<MindfulnessPromptCreate>,
) -> Result<(StatusCode, Json<DbMindfulnessPrompt>), LearnifyError> {
    caller.require_staff()?;
    require_text("title", &body.title)?;
    require_text("instructions", &body.instructions)?;
    check_age_group(&body.age_group)?;
    if body.duration_minutes <= 0 {
        return Err(LearnifyError::validation(
            "INVALID_DURATION",
            "durationMinutes must be positive.",
        ));
    }
    Ok((StatusCode::CREATED, Json(state.db.create_prompt(body).await?)))
}
