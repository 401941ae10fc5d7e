use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failures reported by a `SearchBackend`.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The index or document does not exist.
    #[error("not found")]
    NotFound,

    /// A document with the same id already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("search engine returned HTTP {status}: {body}")]
    Engine { status: u16, body: String },

    #[error("invalid search engine URL: {0}")]
    InvalidUrl(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Handler error, rendered as `{ "message": ... }` with the matching status.
///
/// Messages are fixed per endpoint; backend detail is logged by the handler
/// and never returned to the caller.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(&'static str),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(ErrorResponse {
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}
