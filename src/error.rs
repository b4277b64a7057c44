use axum::{
    Json,
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ErrorBody;

/// Failure while resolving the caller's primary session.
///
/// Never shown to the caller: the gate turns it into a login redirect and the
/// lenient endpoints treat the caller as anonymous.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session resolution timed out")]
    Timeout,
    #[error("session backend failed: {0}")]
    Backend(String),
}

/// Failure inside the user/relationship store.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        RepoError::Unavailable(err.to_string())
    }
}

impl From<RepoError> for SessionError {
    fn from(err: RepoError) -> Self {
        SessionError::Backend(err.to_string())
    }
}

/// Client-facing errors. The only kind that reaches an HTTP caller as a body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} is required")]
    MissingParameter(&'static str),
    #[error("{0}")]
    InvalidQuery(String),
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidQuery(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::MissingParameter(_) | ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        };
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
