//! Error handling module

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Errors raised by the Cubo client before any request is sent
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("device_id must be a positive integer, got {0}")]
    InvalidDeviceId(i64),

    #[error("status must be 'open' or 'close', got '{0}'")]
    InvalidStatus(String),

    #[error("token is required")]
    MissingToken,

    #[error("token is not a valid header value")]
    InvalidToken,

    #[error("Invalid base URL '{0}': {1}")]
    InvalidBaseUrl(String, String),
}

/// Transport-level failures. These are the only errors the client retries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out")]
    Timeout,

    #[error("failed to read response body: {0}")]
    Body(String),

    /// The request could not be built; sending it again cannot help
    #[error("invalid request: {0}")]
    Request(String),

    #[error("request failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            TransportError::Request(e.to_string())
        } else if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            TransportError::Body(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

impl TransportError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportError::Request(_))
    }
}

/// Errors returned by the host-facing HTTP API
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        };

        let body = Json(serde_json::json!({
            "error": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}
