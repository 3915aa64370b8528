//! Request middleware and extractors.

pub mod audit;
pub mod auth;

pub use audit::audit_requests;
pub use auth::{AuthUser, MaybeAuthUser, bearer_token};
