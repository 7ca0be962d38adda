use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use geobridge_core::BridgeError;
use serde::Serialize;

/// Unified API error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), details: None }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: self.message, details: self.details };
        (self.status, Json(body)).into_response()
    }
}

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        let base = match &err {
            BridgeError::ConfigMissing { .. } | BridgeError::ConfigInvalid { .. } => {
                Self::bad_request("Invalid request")
            }
            BridgeError::SessionMissing { .. } => Self::not_found("Session not found"),
            BridgeError::UnsupportedGeometry { .. } | BridgeError::InvalidProperties { .. } => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, "Design cannot be transformed")
            }
            BridgeError::Upstream { .. } | BridgeError::Unreachable { .. } => {
                Self::new(StatusCode::BAD_GATEWAY, "Source system request failed")
            }
            BridgeError::QueueClosed => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "Job queue is not accepting work")
            }
            _ => Self::internal("Internal error"),
        };
        base.with_details(err.to_string())
    }
}
