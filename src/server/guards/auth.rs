use crate::server::router::LearnifyState;
use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use serde_json::json;
use subtle::ConstantTimeEq;

pub const SERVICE_KEY_HEADER: &str = "x-learnify-key";

fn extract_header_token(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(k) = headers.get(SERVICE_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(k.to_string());
    }
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
}

fn extract_query_token(query: Option<&str>) -> Option<String> {
    query.and_then(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .find(|(k, _)| k == "key")
            .map(|(_, v)| v.into_owned())
    })
}

/// Rejects any request that does not carry the shared service key.
#[derive(Debug, Clone, Copy)]
pub struct RequireKeyAuth;

impl FromRequestParts<LearnifyState> for RequireKeyAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &LearnifyState,
    ) -> Result<Self, Self::Rejection> {
        let token =
            extract_header_token(&parts.headers).or_else(|| extract_query_token(parts.uri.query()));

        match token {
            Some(key) => {
                let expected = state.learnify_key.as_ref();
                if key.as_bytes().ct_eq(expected.as_bytes()).into() {
                    Ok(RequireKeyAuth)
                } else {
                    Err(AuthError::InvalidKey)
                }
            }
            None => Err(AuthError::MissingKey),
        }
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingKey,
    InvalidKey,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingKey => "Missing service key",
            AuthError::InvalidKey => "Invalid service key",
        };
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "code": "UNAUTHORIZED", "message": message } })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;

    #[test]
    fn header_key_wins_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(SERVICE_KEY_HEADER, "abc".parse().unwrap());
        headers.insert("authorization", "Bearer xyz".parse().unwrap());
        assert_eq!(extract_header_token(&headers).as_deref(), Some("abc"));

        headers.remove(SERVICE_KEY_HEADER);
        assert_eq!(extract_header_token(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn query_key_is_url_decoded() {
        assert_eq!(
            extract_query_token(Some("subjectId=1&key=a%2Bb")).as_deref(),
            Some("a+b")
        );
        assert_eq!(extract_query_token(Some("subjectId=1")), None);
        assert_eq!(extract_query_token(None), None);
    }
}
