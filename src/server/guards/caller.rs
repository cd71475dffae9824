//! Identity forwarded by the session layer in front of this service.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use learnify_schema::Role;
use serde_json::json;

use crate::db::DbActorHandle;
use crate::error::LearnifyError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: i64,
    pub role: Role,
}

impl Caller {
    pub fn require_staff(&self) -> Result<(), LearnifyError> {
        if self.role.is_staff() {
            Ok(())
        } else {
            Err(LearnifyError::Forbidden(
                "Only teachers and admins can do this.".to_string(),
            ))
        }
    }

    pub fn require_admin(&self) -> Result<(), LearnifyError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(LearnifyError::Forbidden("Only admins can do this.".to_string()))
        }
    }

    /// Resolve whose data a request targets, checking the caller may read it.
    ///
    /// Staff may read anyone; a parent only their linked children.
    pub async fn viewable_user(
        &self,
        db: &DbActorHandle,
        requested: Option<i64>,
    ) -> Result<i64, LearnifyError> {
        let target = match requested {
            None => return Ok(self.id),
            Some(id) if id == self.id => return Ok(id),
            Some(id) => id,
        };
        if self.role.is_staff() {
            return Ok(target);
        }
        if self.role == Role::Parent && db.is_parent_of(self.id, target).await? {
            return Ok(target);
        }
        Err(LearnifyError::Forbidden(
            "You do not have access to this user's data.".to_string(),
        ))
    }
}

fn parse_caller(parts: &Parts) -> Result<Caller, CallerError> {
    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let id = header(USER_ID_HEADER)
        .ok_or(CallerError::Missing)?
        .parse::<i64>()
        .map_err(|_| CallerError::Malformed(USER_ID_HEADER))?;
    let role = header(USER_ROLE_HEADER)
        .ok_or(CallerError::Missing)?
        .parse::<Role>()
        .map_err(|_| CallerError::Malformed(USER_ROLE_HEADER))?;

    Ok(Caller { id, role })
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = CallerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parse_caller(parts)
    }
}

#[derive(Debug)]
pub enum CallerError {
    Missing,
    Malformed(&'static str),
}

impl IntoResponse for CallerError {
    fn into_response(self) -> Response {
        let message = match self {
            CallerError::Missing => "Missing caller identity".to_string(),
            CallerError::Malformed(header) => format!("Malformed {header} header"),
        };
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "code": "UNAUTHENTICATED", "message": message } })),
        )
            .into_response()
    }
}
