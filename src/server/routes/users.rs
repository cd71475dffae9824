use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use learnify_schema::users::{ParentLinkRequest, UserCreate};
use tracing::info;

use super::require_text;
use crate::db::models::DbUser;
use crate::error::LearnifyError;
use crate::server::extract::{ApiJson, ApiPath};
use crate::server::guards::caller::Caller;
use crate::server::router::LearnifyState;

pub fn router() -> Router<LearnifyState> {
    Router::new()
        .route("/api/users", post(create_user))
        .route("/api/users/me", get(me))
        .route("/api/users/{parent_id}/children", post(link_child))
}

async fn create_user(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiJson(body): ApiJson<UserCreate>,
) -> Result<(StatusCode, Json<DbUser>), LearnifyError> {
    caller.require_admin()?;
    require_text("name", &body.name)?;
    require_text("email", &body.email)?;
    if !body.email.contains('@') {
        return Err(LearnifyError::validation(
            "INVALID_EMAIL",
            "email must be a valid address.",
        ));
    }

    let user = state.db.create_user(body).await?;
    info!(user.id = user.id, user.role = %user.role, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn me(
    State(state): State<LearnifyState>,
    caller: Caller,
) -> Result<Json<DbUser>, LearnifyError> {
    let user = state
        .db
        .get_user(caller.id)
        .await?
        .ok_or_else(|| LearnifyError::not_found(format!("User {}", caller.id)))?;
    Ok(Json(user))
}

async fn link_child(
    State(state): State<LearnifyState>,
    caller: Caller,
    ApiPath(parent_id): ApiPath<i64>,
    ApiJson(body): ApiJson<ParentLinkRequest>,
) -> Result<StatusCode, LearnifyError> {
    caller.require_admin()?;
    state.db.link_parent(parent_id, body.student_id).await?;
    info!(parent_id, student_id = body.student_id, "Parent linked to student");
    Ok(StatusCode::NO_CONTENT)
}
