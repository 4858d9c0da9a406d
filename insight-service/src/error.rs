//! Errors surfaced by the relay endpoints.

use crate::models::PayloadError;
use crate::services::providers::ProviderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use service_core::error::ErrorResponse;
use thiserror::Error;

/// Generic message for rejected payloads.
pub const INVALID_PAYLOAD_MESSAGE: &str = "Payload inválido";

/// Generic message for failed model calls.
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Erro ao processar com IA";

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] PayloadError),

    #[error("Upstream failure: {0}")]
    Upstream(#[from] ProviderError),
}

impl InsightError {
    pub fn status(&self) -> StatusCode {
        match self {
            InsightError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            InsightError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for InsightError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            InsightError::InvalidPayload(err) => {
                ErrorResponse::new(INVALID_PAYLOAD_MESSAGE, Some(err.to_string()))
            }
            InsightError::Upstream(err) => {
                ErrorResponse::new(UPSTREAM_FAILURE_MESSAGE, Some(err.to_string()))
            }
        };

        body.into_response_with(status)
    }
}
