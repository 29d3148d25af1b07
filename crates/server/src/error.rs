use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use shared::error::{RelayErrorBody, RelayErrorCode};
use thiserror::Error;

pub const ALLOWED_METHODS: &str = "GET, POST";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid JSON payload")]
    InvalidPayload(#[source] serde_json::Error),

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("failed to read ledger reply: {0}")]
    UnreadableBody(#[source] reqwest::Error),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, body) = match &self {
            RelayError::InvalidPayload(err) => (
                StatusCode::BAD_REQUEST,
                RelayErrorBody::new(message)
                    .with_details(err.to_string())
                    .with_code(RelayErrorCode::InvalidJsonPayload),
            ),
            RelayError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                RelayErrorBody::new(message).with_code(RelayErrorCode::MethodNotAllowed),
            ),
            RelayError::Unreachable(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                RelayErrorBody::new(message).with_code(RelayErrorCode::UpstreamUnreachable),
            ),
            RelayError::UnreadableBody(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                RelayErrorBody::new(message).with_code(RelayErrorCode::UpstreamBodyUnreadable),
            ),
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::METHOD_NOT_ALLOWED {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
        }
        response
    }
}
