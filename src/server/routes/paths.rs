use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use learnify_rules::Difficulty;
use learnify_rules::diagnostic::score;
use learnify_schema::diagnostic::{
    DiagnosticQuestionCreate, DiagnosticQuestionView, DiagnosticSubmit, DiagnosticSubmitResponse,
};
use learnify_schema::paths::LearningPathCreate;
use learnify_schema::users::CreatedResponse;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::require_text;
use crate::db::DiagnosticSubmission;
use crate::db::models::{DbLearningPath, DbLearningPathNode, DbLearningPathProgress};
use crate::error::LearnifyError;
use crate::server::extract::{ApiJson, ApiPath, ApiQuery};
use crate::server::guards::caller::Caller;
use crate::server::router::LearnifyState;

pub fn router() -> Router<LearnifyState> {
    Router::new()
        .route("/api/learning-paths", post(create_path))
        .route("/api/learning-paths/diagnostic", get(placement))
        .route(
            "/api/learning-paths/diagnostic/questions",
            post(create_question),
        )
        .route("/api/learning-paths/diagnostic/submit", post(submit))
        .route("/api/learning-paths/{id}", get(get_path))
        .route(
            "/api/learning-paths/{id}/nodes/{node_id}/complete",
            post(complete_node),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlacementQuery {
    subject_id: Option<i64>,
    topic: Option<String>,
}

async fn placement(
    State(state): State<LearnifyState>,
    _caller: Caller,
    ApiQuery(query): ApiQuery<PlacementQuery>,
) -> Result<Json<Vec<DiagnosticQuestionView>>, LearnifyError> {
    let subject_id = query
        .subject_id
        .ok_or_else(|| LearnifyError::validation("MISSING_FIELD", "subjectId is required."))?;
    let topic = query.topic.filter(|t| !t.trim().is_empty());
    Ok(Json(state.db.placement_questions(subject_id, topic).await?))
}

async fn create_question(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiJson(body): ApiJson<DiagnosticQuestionCreate>,
) -> Result<(StatusCode, Json<CreatedResponse>), LearnifyError> {
    caller.require_staff()?;
    require_text("question", &body.question)?;
    require_text("correctAnswer", &body.correct_answer)?;
    require_text("skill", &body.skill)?;
    if !(Difficulty::MIN.get()..=Difficulty::MAX.get()).contains(&body.difficulty) {
        return Err(LearnifyError::validation(
            "INVALID_DIFFICULTY",
            "difficulty must be between 1 and 5.",
        ));
    }
    if !body.options.is_empty() && !body.options.contains(&body.correct_answer) {
        return Err(LearnifyError::validation(
            "INVALID_ANSWER",
            "correctAnswer must be one of the options.",
        ));
    }
    let id = state.db.create_diagnostic_question(body).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

async fn submit(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiJson(body): ApiJson<DiagnosticSubmit>,
) -> Result<Json<DiagnosticSubmitResponse>, LearnifyError> {
    if body.responses.is_empty() {
        return Err(LearnifyError::validation(
            "MISSING_FIELD",
            "responses must not be empty.",
        ));
    }

    let keys = state.db.answer_keys(body.subject_id).await?;
    let scored = score(&keys, &body.responses);

    let result_id = state
        .db
        .save_diagnostic(DiagnosticSubmission {
            user_id: caller.id,
            subject_id: body.subject_id,
            learning_path_id: body.learning_path_id,
            score: scored.clone(),
        })
        .await?;

    info!(
        user.id = caller.id,
        subject.id = body.subject_id,
        result.id = result_id,
        proficiency = scored.overall_proficiency,
        evaluated = scored.evaluations.len(),
        "Diagnostic scored"
    );

    let learning_insights = if state.ai.is_enabled() {
        let subject = state
            .db
            .list_subjects()
            .await?
            .into_iter()
            .find(|s| s.id == body.subject_id)
            .map_or_else(|| "this subject".to_string(), |s| s.name);
        state.ai.learning_insights(&subject, None, &scored).await
    } else {
        None
    };

    Ok(Json(DiagnosticSubmitResponse {
        result_id,
        score: scored,
        learning_insights,
    }))
}

async fn create_path(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiJson(body): ApiJson<LearningPathCreate>,
) -> Result<(StatusCode, Json<CreatedResponse>), LearnifyError> {
    caller.require_staff()?;
    require_text("title", &body.title)?;
    for node in &body.nodes {
        require_text("node title", &node.title)?;
    }
    let nodes = body.nodes.len();
    let id = state.db.create_path(body).await?;
    info!(path.id = id, nodes, "Learning path created");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PathView {
    path: DbLearningPath,
    nodes: Vec<DbLearningPathNode>,
    progress: Option<DbLearningPathProgress>,
}

async fn get_path(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<PathView>, LearnifyError> {
    let (path, nodes) = state
        .db
        .get_path(id)
        .await?
        .ok_or_else(|| LearnifyError::not_found(format!("Learning path {id}")))?;
    let progress = state.db.get_path_progress(caller.id, id).await?;
    Ok(Json(PathView {
        path,
        nodes,
        progress,
    }))
}

async fn complete_node(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiPath((path_id, node_id)): ApiPath<(i64, i64)>,
) -> Result<Json<DbLearningPathProgress>, LearnifyError> {
    let progress = state.db.complete_node(caller.id, path_id, node_id).await?;
    Ok(Json(progress))
}
