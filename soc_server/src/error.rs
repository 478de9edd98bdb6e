use std::any::Any;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use soc_core::SocError;

use crate::timestamp;

/// Error type for HTTP handlers.
///
/// Every variant renders as `{"error", "status": "error", "timestamp"}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A domain error from `soc_core`.
    #[error(transparent)]
    Core(#[from] SocError),

    /// Unparseable or ill-shaped request body.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(SocError::ModelUnavailable | SocError::ModelArtifactMissing(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Core(SocError::FeatureCountMismatch { .. }) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Core(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Core(SocError::ModelUnavailable) => {
                "Model not loaded. Train a model and restart the server.".to_string()
            }
            ApiError::Core(e) => e.to_string(),
            ApiError::BadRequest(msg) | ApiError::Internal(msg) => msg.clone(),
        };
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!(%status, error = %message, "request failed");
        } else {
            tracing::warn!(%status, error = %message, "request rejected");
        }

        let body = json!({
            "error": message,
            "status": "error",
            "timestamp": timestamp(),
        });
        (status, axum::Json(body)).into_response()
    }
}

/// Response for a handler that panicked.
///
/// The panic payload is logged, never echoed to the client.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!(panic = detail, "handler panicked");
    ApiError::Internal("An internal error occurred".to_string()).into_response()
}
