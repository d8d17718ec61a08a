//! HTTP mapping for assistant errors

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::core::AssistantError;

/// Error body, `{"detail": "..."}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for AssistantError {
    fn into_response(self) -> Response {
        let (status, detail) = if self.is_client_error() {
            (StatusCode::BAD_REQUEST, self.to_string())
        } else {
            tracing::error!("[Server] Request failed: {}", self);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "The assistant is temporarily unavailable.".to_string(),
            )
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}
