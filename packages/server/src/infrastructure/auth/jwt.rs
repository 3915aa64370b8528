//! JWT Authenticator
//!
//! The signing secret is handed in once at startup; nothing in here reads
//! the environment.

use std::time::Duration;

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    get_current_timestamp,
};
use serde::{Deserialize, Serialize};

use crate::domain::{AuthError, AuthenticatedUser, Authenticator, Role, UserId};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    user_id: i64,
    email: String,
    role: Role,
    iat: u64,
    exp: u64,
}

pub struct JwtAuthenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtAuthenticator {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        }
    }
}

impl Authenticator for JwtAuthenticator {
    fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!("Token rejected: {}", e);
            AuthError::InvalidToken
        })?;
        let user_id = UserId::new(data.claims.user_id).map_err(|_| AuthError::InvalidToken)?;
        Ok(AuthenticatedUser {
            user_id,
            role: data.claims.role,
            email: data.claims.email,
        })
    }

    fn issue_token(&self, user_id: UserId, role: Role, email: &str) -> Result<String, AuthError> {
        let iat = get_current_timestamp();
        let claims = Claims {
            user_id: user_id.value(),
            email: email.to_string(),
            role,
            iat,
            exp: iat + self.ttl.as_secs(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenIssue(e.to_string()))
    }
}
