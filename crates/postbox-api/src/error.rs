use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use postbox_core::models::FailureResponse;
use thiserror::Error;

/// Handler failures.
///
/// The response body is always the generic `{success:false, message}`
/// envelope; the underlying cause is only logged.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid contact payload: {0}")]
    InvalidPayload(String),
    #[error("Failed to save message: {0}")]
    Save(#[source] postbox_core::Error),
    #[error("Failed to read messages: {0}")]
    Read(#[source] postbox_core::Error),
}

impl AppError {
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload(message.into())
    }

    const fn public_message(&self) -> &'static str {
        match self {
            Self::InvalidPayload(_) => "Invalid contact payload",
            Self::Save(_) => "Failed to save message",
            Self::Read(_) => "Failed to read messages",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Self::Save(_) | Self::Read(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "Contact request failed");
        } else {
            tracing::warn!(error = %self, "Rejected contact request");
        }
        let body = FailureResponse::new(self.public_message());
        (status, Json(body)).into_response()
    }
}
