use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use learnify_schema::graph::{ConceptCreate, ConnectionCreate, KnowledgeGraph};
use serde::Deserialize;

use super::require_text;
use crate::db::models::{DbConcept, DbConceptConnection};
use crate::error::LearnifyError;
use crate::server::extract::{ApiJson, ApiQuery};
use crate::server::guards::caller::Caller;
use crate::server::router::LearnifyState;

pub fn router() -> Router<LearnifyState> {
    Router::new()
        .route("/api/knowledge-graph", get(knowledge_graph))
        .route("/api/knowledge-graph/concepts", post(create_concept))
        .route("/api/knowledge-graph/connections", post(create_connection))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphQuery {
    user_id: Option<i64>,
    subject_id: Option<i64>,
}

async fn knowledge_graph(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiQuery(query): ApiQuery<GraphQuery>,
) -> Result<Json<KnowledgeGraph>, LearnifyError> {
    let user_id = caller.viewable_user(&state.db, query.user_id).await?;
    Ok(Json(state.db.knowledge_graph(user_id, query.subject_id).await?))
}

async fn create_concept(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiJson(body): ApiJson<ConceptCreate>,
) -> Result<(StatusCode, Json<DbConcept>), LearnifyError> {
    caller.require_staff()?;
    require_text("name", &body.name)?;
    Ok((StatusCode::CREATED, Json(state.db.create_concept(body).await?)))
}

async fn create_connection(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiJson(body): ApiJson<ConnectionCreate>,
) -> Result<(StatusCode, Json<DbConceptConnection>), LearnifyError> {
    caller.require_staff()?;
    if body.source_id == body.target_id {
        return Err(LearnifyError::validation(
            "INVALID_CONNECTION",
            "A concept cannot connect to itself.",
        ));
    }
    if !(body.strength.is_finite() && body.strength > 0.0) {
        return Err(LearnifyError::validation(
            "INVALID_STRENGTH",
            "strength must be a positive number.",
        ));
    }
    require_text("type", &body.kind)?;
    Ok((
        StatusCode::CREATED,
        Json(state.db.create_connection(body).await?),
    ))
}
