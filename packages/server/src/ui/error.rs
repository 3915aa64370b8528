//! HTTP error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    domain::{AuthError, RepositoryError, ValueObjectError},
    infrastructure::dto::http::ErrorResponse,
    usecase::{ConnectError, RoomError, SystemLogError, UserError},
};

/// Error returned by every handler, rendered as `{"error": "..."}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            ApiError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

impl From<ValueObjectError> for ApiError {
    fn from(e: ValueObjectError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingToken | AuthError::InvalidToken => ApiError::Unauthorized(e.to_string()),
            AuthError::InsufficientRole => ApiError::Forbidden(e.to_string()),
            AuthError::TokenIssue(_) | AuthError::PasswordHash(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound(_) => ApiError::NotFound(e.to_string()),
            RepositoryError::Conflict(_) => ApiError::Conflict(e.to_string()),
            RepositoryError::Storage(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::InvalidInput(_) => ApiError::BadRequest(e.to_string()),
            UserError::EmailTaken => ApiError::Conflict(e.to_string()),
            UserError::InvalidCredentials => ApiError::Unauthorized(e.to_string()),
            UserError::Forbidden(_) => ApiError::Forbidden(e.to_string()),
            UserError::Auth(auth) => auth.into(),
            UserError::Repository(repo) => repo.into(),
            UserError::Internal(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<RoomError> for ApiError {
    fn from(e: RoomError) -> Self {
        match e {
            RoomError::InvalidInput(_) => ApiError::BadRequest(e.to_string()),
            RoomError::RoomNotFound(_) => ApiError::NotFound(e.to_string()),
            RoomError::NotRoomAdmin(_) => ApiError::Forbidden(e.to_string()),
            RoomError::Repository(repo) => repo.into(),
        }
    }
}

impl From<SystemLogError> for ApiError {
    fn from(e: SystemLogError) -> Self {
        match e {
            SystemLogError::Repository(repo) => repo.into(),
        }
    }
}

impl From<ConnectError> for ApiError {
    fn from(e: ConnectError) -> Self {
        match e {
            ConnectError::RoomNotFound(_) => ApiError::NotFound(e.to_string()),
            ConnectError::NotMember(_) => ApiError::Forbidden(e.to_string()),
            ConnectError::ConnectionClosed => ApiError::Internal(e.to_string()),
            ConnectError::Repository(repo) => repo.into(),
        }
    }
}
