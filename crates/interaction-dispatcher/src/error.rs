//! Errors returned synchronously to the webhook caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use interaction_protocol_types::ParseError;
use signature_verifier::VerificationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// Signature check failed. Never escalated.
    #[error("authentication failed: {0}")]
    Unauthorized(#[from] VerificationError),

    /// Verified payload that does not parse. Always escalated.
    #[error("protocol error: {0}")]
    Protocol(#[from] ParseError),

    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type DispatchResult<T> = Result<T, DispatchError>;

impl DispatchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Protocol(_) => StatusCode::BAD_REQUEST,
            Self::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        // Fixed bodies so callers learn nothing about which check failed.
        let body = match &self {
            Self::Unauthorized(_) => "invalid request signature",
            Self::Protocol(_) => "invalid interaction payload",
            Self::Encode(_) => "internal server error",
        };
        (self.status_code(), body).into_response()
    }
}
