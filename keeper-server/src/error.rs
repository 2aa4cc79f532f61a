use axum::{http::StatusCode, response::IntoResponse, Json};
use keeper_store::StoreError;
use serde::Serialize;
use thiserror::Error;

/// Errors a handler can return, mapped to the status codes of §6.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("malformed request")]
    BadRequest,

    #[error("unknown token")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    #[error("already exists")]
    Conflict,

    #[error("bad revision: expected {expected}, got {actual}")]
    BadRevision { expected: u64, actual: u64 },

    #[error("bad password")]
    BadPassword,

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ServerError::NotFound,
            StoreError::AlreadyExists(_) => ServerError::Conflict,
            StoreError::BadRevision { expected, actual } => {
                ServerError::BadRevision { expected, actual }
            }
            StoreError::UnknownUser => ServerError::Unauthorized,
            StoreError::BadPassword => ServerError::BadPassword,
            StoreError::NoActiveUser => ServerError::Unauthorized,
            StoreError::Database(msg) | StoreError::Connection(msg) | StoreError::Serialization(msg) => {
                ServerError::Internal(msg)
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ServerError::BadRequest => StatusCode::BAD_REQUEST,
            ServerError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Conflict | ServerError::BadRevision { .. } | ServerError::BadPassword => {
                StatusCode::CONFLICT
            }
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if !matches!(status, StatusCode::OK) {
            tracing::info!(error = %self, %status, "request failed");
        }

        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}
