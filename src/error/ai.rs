use axum::http::StatusCode;
use thiserror::Error as ThisError;

use super::IsRetryable;

#[derive(Debug, ThisError)]
pub enum AiError {
    #[error("AI backend is disabled")]
    Disabled,

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream error with status: {0}")]
    UpstreamStatus(StatusCode),

    #[error("Upstream returned an empty completion")]
    EmptyCompletion,

    #[error("Completion is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

impl IsRetryable for AiError {
    fn is_retryable(&self) -> bool {
        match self {
            AiError::Http(_) => true,
            AiError::UpstreamStatus(status) => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            AiError::Disabled | AiError::EmptyCompletion | AiError::Parse(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_and_server_failures_retry() {
        assert!(AiError::UpstreamStatus(StatusCode::BAD_GATEWAY).is_retryable());
        assert!(AiError::UpstreamStatus(StatusCode::TOO_MANY_REQUESTS).is_retryable());
        assert!(!AiError::UpstreamStatus(StatusCode::UNAUTHORIZED).is_retryable());
        assert!(!AiError::Disabled.is_retryable());
        assert!(!AiError::EmptyCompletion.is_retryable());
    }
}
