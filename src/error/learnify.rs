use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error as ThisError;
use tracing::{error, warn};

use super::ai::AiError;

#[derive(Debug, ThisError)]
pub enum LearnifyError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Ractor error: {0}")]
    Ractor(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed ({code}): {message}")]
    Validation { code: String, message: String },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Conflict ({code}): {message}")]
    Conflict { code: String, message: String },

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl LearnifyError {
    pub fn validation(code: &str, message: impl Into<String>) -> Self {
        LearnifyError::Validation {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn conflict(code: &str, message: impl Into<String>) -> Self {
        LearnifyError::Conflict {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        LearnifyError::NotFound(what.into())
    }
}

fn api_error(code: &str, message: impl Into<String>) -> ApiErrorObject {
    ApiErrorObject {
        code: code.to_string(),
        message: message.into(),
        details: None,
    }
}

fn internal() -> (StatusCode, ApiErrorObject) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        api_error("INTERNAL_ERROR", "An internal server error occurred."),
    )
}

impl IntoResponse for LearnifyError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            LearnifyError::Database(sqlx::Error::Database(db_err))
                if db_err.is_foreign_key_violation() =>
            {
                warn!(error = %db_err, "Rejected write referencing a missing row");
                (
                    StatusCode::BAD_REQUEST,
                    api_error("UNKNOWN_REFERENCE", "A referenced record does not exist."),
                )
            }
            LearnifyError::Database(sqlx::Error::Database(db_err))
                if db_err.is_unique_violation() =>
            {
                warn!(error = %db_err, "Rejected duplicate write");
                (
                    StatusCode::CONFLICT,
                    api_error("ALREADY_EXISTS", "The record already exists."),
                )
            }
            LearnifyError::Database(sqlx::Error::RowNotFound) => (
                StatusCode::NOT_FOUND,
                api_error("NOT_FOUND", "Resource not found."),
            ),
            err @ (LearnifyError::Database(_)
            | LearnifyError::Ractor(_)
            | LearnifyError::Csv(_)
            | LearnifyError::Json(_)
            | LearnifyError::Unexpected(_)) => {
                error!(error = %err, "Request failed");
                internal()
            }

            LearnifyError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                api_error("NOT_FOUND", format!("{what} not found.")),
            ),
            LearnifyError::Validation { code, message } => {
                (StatusCode::BAD_REQUEST, api_error(&code, message))
            }
            LearnifyError::Forbidden(message) => {
                (StatusCode::FORBIDDEN, api_error("FORBIDDEN", message))
            }
            LearnifyError::Conflict { code, message } => {
                (StatusCode::CONFLICT, api_error(&code, message))
            }
            LearnifyError::PayloadTooLarge(message) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                api_error("PAYLOAD_TOO_LARGE", message),
            ),

            LearnifyError::Ai(AiError::Disabled) => (
                StatusCode::SERVICE_UNAVAILABLE,
                api_error("AI_UNAVAILABLE", "AI features are not configured."),
            ),
            LearnifyError::Ai(err) => {
                error!(error = %err, "AI backend call failed");
                let code = match err {
                    AiError::Parse(_) | AiError::EmptyCompletion => "BAD_UPSTREAM_PAYLOAD",
                    _ => "UPSTREAM_ERROR",
                };
                (
                    StatusCode::BAD_GATEWAY,
                    api_error(code, "AI service error."),
                )
            }
        };
        (status, Json(ApiErrorBody { inner: error_body })).into_response()
    }
}

impl From<JsonRejection> for LearnifyError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::BytesRejection(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                LearnifyError::PayloadTooLarge(e.body_text())
            }
            JsonRejection::BytesRejection(e) => {
                LearnifyError::validation("INVALID_REQUEST", e.body_text())
            }
            JsonRejection::JsonSyntaxError(e) => LearnifyError::validation("INVALID_JSON", e.body_text()),
            other => LearnifyError::validation("INVALID_REQUEST", other.body_text()),
        }
    }
}

impl From<QueryRejection> for LearnifyError {
    fn from(rejection: QueryRejection) -> Self {
        LearnifyError::validation("INVALID_QUERY", rejection.body_text())
    }
}

impl From<PathRejection> for LearnifyError {
    fn from(rejection: PathRejection) -> Self {
        LearnifyError::validation("INVALID_PATH", rejection.body_text())
    }
}

/// Standardized API error response payload.
#[derive(Serialize)]
pub struct ApiErrorObject {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    #[serde(rename = "error")]
    pub inner: ApiErrorObject,
}
