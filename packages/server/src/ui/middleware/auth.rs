//! Bearer token extraction
//!
//! `AuthUser` rejects the request with 401 when the `Authorization: Bearer`
//! header is missing or invalid; `MaybeAuthUser` only rejects an invalid one.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use crate::{
    domain::{AuthError, AuthenticatedUser, Role},
    ui::{error::ApiError, state::AppState},
};

/// Token carried in `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authenticated caller
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthenticatedUser);

impl AuthUser {
    /// The caller, provided their role is at least `role`.
    pub fn require(self, role: Role) -> Result<AuthenticatedUser, ApiError> {
        if self.0.has_role(role) {
            Ok(self.0)
        } else {
            tracing::warn!(
                "User {} ({}) denied: {} required",
                self.0.user_id,
                self.0.role,
                role
            );
            Err(AuthError::InsufficientRole.into())
        }
    }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(|| {
            tracing::warn!("Missing bearer token for {}", parts.uri.path());
            ApiError::from(AuthError::MissingToken)
        })?;
        Ok(AuthUser(state.authenticator.authenticate(token)?))
    }
}

/// Caller that may be anonymous
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthenticatedUser>);

impl FromRequestParts<Arc<AppState>> for MaybeAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(&parts.headers) {
            Some(token) => Ok(MaybeAuthUser(Some(state.authenticator.authenticate(token)?))),
            None => Ok(MaybeAuthUser(None)),
        }
    }
}
