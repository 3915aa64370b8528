//! Auth collaborator traits.

use super::{
    entity::AuthenticatedUser,
    error::AuthError,
    value_object::{Role, UserId},
};

/// Validates and issues bearer tokens
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;

    fn issue_token(&self, user_id: UserId, role: Role, email: &str) -> Result<String, AuthError>;
}

/// One-way password hashing. Implementations may be CPU-heavy; callers run
/// them off the async executor.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}
