use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use tripwise_core::error::{StoreError, TripwiseError};

/// Application error type that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Tripwise(TripwiseError),
    Internal(String),
}

impl From<TripwiseError> for AppError {
    fn from(err: TripwiseError) -> Self {
        AppError::Tripwise(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Tripwise(TripwiseError::Store(StoreError::ConversationNotFound(_))) => {
                (StatusCode::NOT_FOUND, "Conversation not found".into())
            }
            AppError::Tripwise(err) => {
                tracing::error!(error = %err, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}
