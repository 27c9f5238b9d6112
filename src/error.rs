use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Referenced order or courier does not exist or is already archived.
    #[error("not found: {0}")]
    NotFound(String),

    /// Acting identity does not hold the order.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Action attempted from the wrong lifecycle state. Benign; the webhook
    /// converts this into an acknowledged rejection.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, label, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::FORBIDDEN, "unauthorized", msg.clone()),
            AppError::PreconditionFailed(msg) => {
                (StatusCode::CONFLICT, "precondition_failed", msg.clone())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg.clone())
            }
        };

        let body = Json(json!({
            "error": label,
            "details": details
        }));

        (status, body).into_response()
    }
}
