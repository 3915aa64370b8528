//! Domain error types.

use thiserror::Error;

/// Errors raised while constructing value objects
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("invalid room id: '{0}'")]
    InvalidRoomId(String),

    #[error("invalid user id: {0}")]
    InvalidUserId(i64),

    #[error("invalid role '{0}': must be 'user', 'admin' or 'super-admin'")]
    InvalidRole(String),

    #[error("invalid email address: '{0}'")]
    InvalidEmail(String),
}

/// Errors returned by persistence collaborators
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors returned by the auth collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing authentication token")]
    MissingToken,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("access denied: insufficient role permissions")]
    InsufficientRole,

    #[error("failed to issue token: {0}")]
    TokenIssue(String),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

/// Per-recipient delivery failure during a broadcast
///
/// Never surfaced to the broadcaster's caller: the failing connection is
/// deregistered and closed instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("connection is closed")]
    Closed,

    #[error("outbound buffer is full")]
    Full,

    #[error("timed out waiting for outbound buffer")]
    TimedOut,
}

/// Failure to render a chat message as a wire frame
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to encode outbound frame: {0}")]
pub struct EncodeError(pub String);
