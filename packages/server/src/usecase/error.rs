//! UseCase error types.

use thiserror::Error;

use crate::domain::{AuthError, EncodeError, RepositoryError, Role, RoomId};

/// Admission failures before a connection becomes active
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    #[error("user is not a member of room {0}")]
    NotMember(RoomId),

    #[error("connection was closed before it could be registered")]
    ConnectionClosed,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    #[error("user is not a member of room {0}")]
    NotMember(RoomId),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("email already registered")]
    EmailTaken,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("insufficient role to create a {0} account")]
    Forbidden(Role),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    #[error("only an admin of room {0} may do this")]
    NotRoomAdmin(RoomId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SystemLogError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
