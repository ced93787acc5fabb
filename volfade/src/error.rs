//! Error types for volfade
//!
//! Defines the fade service error taxonomy using thiserror. A cancelled
//! fade is a normal outcome, not an error (see `fade::FadeOutcome`).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Main error type for the fade service
#[derive(Error, Debug)]
pub enum Error {
    /// Out-of-range volume or duration, unknown curve or player.
    /// Rejected before any device I/O.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Reading or writing the player's volume failed
    #[error("Device unavailable: {player}: {reason}")]
    DeviceUnavailable { player: String, reason: String },

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn device_unavailable(player: impl Into<String>, reason: impl ToString) -> Self {
        Error::DeviceUnavailable {
            player: player.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<volfade_common::Error> for Error {
    fn from(err: volfade_common::Error) -> Self {
        match err {
            volfade_common::Error::InvalidInput(msg) => Error::InvalidInput(msg),
            volfade_common::Error::Config(msg) => Error::Config(msg),
            volfade_common::Error::Io(e) => Error::Io(e),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            Error::DeviceUnavailable { .. } => (StatusCode::BAD_GATEWAY, "DEVICE_UNAVAILABLE"),
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            Error::Http(_) => (StatusCode::INTERNAL_SERVER_ERROR, "HTTP_ERROR"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Convenience Result type using volfade Error
pub type Result<T> = std::result::Result<T, Error>;
