//! API error handling

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

/// API error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "detail": self.message }));
        (self.status, body).into_response()
    }
}

impl From<cactus_gateway_core::Error> for ApiError {
    fn from(err: cactus_gateway_core::Error) -> Self {
        use cactus_gateway_core::ErrorKind;

        match err.kind() {
            ErrorKind::ClientInput => ApiError::bad_request(err.to_string()),
            ErrorKind::Configuration => {
                error!("Configuration error: {}", err);
                ApiError::internal(err.to_string())
            }
            ErrorKind::Provider => {
                let status = err
                    .upstream_status()
                    .and_then(|status| StatusCode::from_u16(status).ok())
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                warn!("Upstream provider failed with {}", status);
                ApiError::new(status, err.to_string())
            }
            ErrorKind::Engine | ErrorKind::Internal => {
                error!("{}", err);
                ApiError::internal(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(rejection.status(), rejection.body_text())
    }
}
