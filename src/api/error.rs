use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{error::TokenError, types::Provider};

/// Errors returned by HTTP handlers, rendered as `{"error": {"code", "message"}}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{} is not connected", .0.service_name())]
    NotConnected(Provider),

    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unknown or expired state parameter")]
    InvalidState,

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl ApiError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotConnected(_) => (StatusCode::UNAUTHORIZED, "not_connected"),
            ApiError::UnknownProvider(_) => (StatusCode::NOT_FOUND, "unknown_provider"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::InvalidState => (StatusCode::BAD_REQUEST, "invalid_state"),
            ApiError::Token(e) => match e {
                TokenError::UpstreamAuth { .. } => {
                    (StatusCode::UNAUTHORIZED, "integration_disconnected")
                }
                TokenError::MalformedGrant { .. } => (StatusCode::BAD_GATEWAY, "malformed_grant"),
                TokenError::UpstreamApi { .. } => (StatusCode::BAD_GATEWAY, "upstream_error"),
                TokenError::Transport { .. } => (StatusCode::BAD_GATEWAY, "upstream_unreachable"),
                TokenError::Persistence(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "persistence_error")
                }
                TokenError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(code, "{self}");
        }

        let body = json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_contract_status_codes() {
        assert_eq!(
            ApiError::NotConnected(Provider::Music).status_and_code(),
            (StatusCode::UNAUTHORIZED, "not_connected")
        );

        let rejected = ApiError::from(TokenError::UpstreamAuth {
            provider: Provider::Fitness,
            status: 400,
            body: "Bad Request".to_string(),
        });
        assert_eq!(
            rejected.status_and_code(),
            (StatusCode::UNAUTHORIZED, "integration_disconnected")
        );

        let storage = ApiError::from(TokenError::Persistence("locked".to_string()));
        assert_eq!(
            storage.status_and_code(),
            (StatusCode::INTERNAL_SERVER_ERROR, "persistence_error")
        );
    }

    #[test]
    fn not_connected_message_names_the_service() {
        assert_eq!(
            ApiError::NotConnected(Provider::Fitness).to_string(),
            "Strava is not connected"
        );
    }
}
