//! InMemory User Repository 実装

use std::sync::Arc;

use async_trait::async_trait;
use roomcast_shared::time::{Clock, SystemClock};
use tokio::sync::Mutex;

use crate::domain::{NewUser, RepositoryError, User, UserId, UserRepository};

#[derive(Default)]
struct Users {
    next_id: i64,
    rows: Vec<User>,
}

/// インメモリ User Repository 実装
pub struct InMemoryUserRepository {
    users: Mutex<Users>,
    clock: Arc<dyn Clock>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            users: Mutex::new(Users::default()),
            clock,
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut users = self.users.lock().await;
        if users.rows.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict(format!(
                "user with email {} already exists",
                user.email
            )));
        }

        users.next_id += 1;
        let id = UserId::new(users.next_id).map_err(|e| RepositoryError::Storage(e.to_string()))?;
        let now = self.clock.now();
        let created = User {
            id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        users.rows.push(created.clone());
        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let users = self.users.lock().await;
        let email = email.trim();
        Ok(users
            .rows
            .iter()
            .find(|u| u.email.as_str() == email)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let users = self.users.lock().await;
        Ok(users.rows.clone())
    }
}
