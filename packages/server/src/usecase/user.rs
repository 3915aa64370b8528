//! UseCase: ユーザー登録・ログイン・一覧
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RegisterUserUseCase / LoginUseCase / ListUsersUseCase / EnsureSuperAdminUseCase
//!
//! ### なぜこのテストが必要か
//! - ロールの作成権限（admin は admin 以上、super-admin は super-admin のみ）を保証
//! - 認証情報の誤りが区別なく InvalidCredentials になることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：一般ユーザーの登録、ログインとトークン発行
//! - 異常系：重複メール、短いパスワード、権限不足、誤ったパスワード
//! - エッジケース：super-admin の初期作成を 2 回行っても 1 人だけ作成される

use std::sync::Arc;

use crate::domain::{
    AuthenticatedUser, Authenticator, Email, NewUser, PasswordHasher, RepositoryError, Role,
    User, UserRepository,
};

use super::error::UserError;

const MIN_PASSWORD_LEN: usize = 6;

/// 登録リクエスト
#[derive(Debug, Clone)]
pub struct RegisterUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Hash on the blocking pool; bcrypt is CPU-bound.
async fn hash_password(hasher: &Arc<dyn PasswordHasher>, password: String) -> Result<String, UserError> {
    let hasher = hasher.clone();
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| UserError::Internal(e.to_string()))?
        .map_err(UserError::from)
}

async fn create(
    users: &Arc<dyn UserRepository>,
    hasher: &Arc<dyn PasswordHasher>,
    request: RegisterUser,
) -> Result<User, UserError> {
    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(UserError::InvalidInput("name must not be empty".to_string()));
    }
    let email = Email::new(request.email).map_err(|e| UserError::InvalidInput(e.to_string()))?;
    if request.password.len() < MIN_PASSWORD_LEN {
        return Err(UserError::InvalidInput(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let password_hash = hash_password(hasher, request.password).await?;
    users
        .create_user(NewUser {
            name,
            email,
            password_hash,
            role: request.role,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => UserError::EmailTaken,
            other => UserError::Repository(other),
        })
}

pub struct RegisterUserUseCase {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

impl RegisterUserUseCase {
    pub fn new(users: Arc<dyn UserRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { users, hasher }
    }

    /// Register a user on behalf of `requester` (anonymous when `None`).
    ///
    /// Anyone may create a `user`; an `admin` needs an admin-or-higher
    /// requester; a `super-admin` needs a super-admin requester.
    pub async fn execute(
        &self,
        request: RegisterUser,
        requester: Option<&AuthenticatedUser>,
    ) -> Result<User, UserError> {
        if request.role != Role::User {
            let allowed = requester.is_some_and(|r| r.has_role(request.role));
            if !allowed {
                return Err(UserError::Forbidden(request.role));
            }
        }
        let user = create(&self.users, &self.hasher, request).await?;
        tracing::info!("Registered user {} ({})", user.id, user.role);
        Ok(user)
    }
}

pub struct LoginUseCase {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    authenticator: Arc<dyn Authenticator>,
}

impl LoginUseCase {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            users,
            hasher,
            authenticator,
        }
    }

    /// Returns a bearer token for valid credentials.
    pub async fn execute(&self, email: &str, password: String) -> Result<String, UserError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        let hasher = self.hasher.clone();
        let hash = user.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| UserError::Internal(e.to_string()))??;
        if !valid {
            return Err(UserError::InvalidCredentials);
        }

        Ok(self
            .authenticator
            .issue_token(user.id, user.role, user.email.as_str())?)
    }
}

pub struct ListUsersUseCase {
    users: Arc<dyn UserRepository>,
}

impl ListUsersUseCase {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn execute(&self) -> Result<Vec<User>, UserError> {
        Ok(self.users.list_users().await?)
    }
}

/// Startup seeding of the first super-admin account
pub struct EnsureSuperAdminUseCase {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

impl EnsureSuperAdminUseCase {
    pub fn new(users: Arc<dyn UserRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { users, hasher }
    }

    /// Create the account unless the e-mail is already registered.
    /// Returns whether an account was created.
    pub async fn execute(&self, email: &str, password: &str) -> Result<bool, UserError> {
        if self.users.find_by_email(email).await?.is_some() {
            return Ok(false);
        }
        let request = RegisterUser {
            name: "superadmin".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: Role::SuperAdmin,
        };
        match create(&self.users, &self.hasher, request).await {
            Ok(user) => {
                tracing::info!("Created super-admin account {}", user.email);
                Ok(true)
            }
            Err(UserError::EmailTaken) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        domain::{AuthError, MockUserRepository, UserId},
        infrastructure::{
            auth::{BcryptPasswordHasher, JwtAuthenticator},
            repository::InMemoryUserRepository,
        },
    };

    fn hasher() -> Arc<dyn PasswordHasher> {
        Arc::new(BcryptPasswordHasher::new(4))
    }

    fn request(email: &str, role: Role) -> RegisterUser {
        RegisterUser {
            name: "alice".to_string(),
            email: email.to_string(),
            password: "secret123".to_string(),
            role,
        }
    }

    fn requester(role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: UserId::new(1).unwrap(),
            role,
            email: "root@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_user_hashes_password() {
        // テスト項目: 一般ユーザーは誰でも登録でき、パスワードはハッシュ化される
        // given (前提条件):
        let users = Arc::new(InMemoryUserRepository::new());
        let usecase = RegisterUserUseCase::new(users.clone(), hasher());

        // when (操作):
        let user = usecase
            .execute(request("a@example.com", Role::User), None)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(user.role, Role::User);
        assert_ne!(user.password_hash, "secret123");
        assert!(hasher().verify("secret123", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_register_admin_requires_admin_requester() {
        // テスト項目: admin の作成には admin 以上の権限が必要
        // given (前提条件):
        let usecase = RegisterUserUseCase::new(Arc::new(InMemoryUserRepository::new()), hasher());

        // when (操作):
        let anonymous = usecase
            .execute(request("a@example.com", Role::Admin), None)
            .await;
        let by_user = usecase
            .execute(request("b@example.com", Role::Admin), Some(&requester(Role::User)))
            .await;
        let by_admin = usecase
            .execute(request("c@example.com", Role::Admin), Some(&requester(Role::Admin)))
            .await;

        // then (期待する結果):
        assert_eq!(anonymous, Err(UserError::Forbidden(Role::Admin)));
        assert_eq!(by_user, Err(UserError::Forbidden(Role::Admin)));
        assert!(by_admin.is_ok());
    }

    #[tokio::test]
    async fn test_register_super_admin_requires_super_admin() {
        // テスト項目: super-admin の作成には super-admin の権限が必要
        // given (前提条件):
        let usecase = RegisterUserUseCase::new(Arc::new(InMemoryUserRepository::new()), hasher());

        // when (操作):
        let by_admin = usecase
            .execute(
                request("a@example.com", Role::SuperAdmin),
                Some(&requester(Role::Admin)),
            )
            .await;
        let by_super = usecase
            .execute(
                request("b@example.com", Role::SuperAdmin),
                Some(&requester(Role::SuperAdmin)),
            )
            .await;

        // then (期待する結果):
        assert_eq!(by_admin, Err(UserError::Forbidden(Role::SuperAdmin)));
        assert!(by_super.is_ok());
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        // テスト項目: 短いパスワード・不正なメール・空の名前は InvalidInput
        // given (前提条件):
        let usecase = RegisterUserUseCase::new(Arc::new(InMemoryUserRepository::new()), hasher());
        let mut short = request("a@example.com", Role::User);
        short.password = "123".to_string();
        let bad_email = request("not-an-email", Role::User);
        let mut no_name = request("b@example.com", Role::User);
        no_name.name = "  ".to_string();

        // when (操作) / then (期待する結果):
        for bad in [short, bad_email, no_name] {
            assert!(matches!(
                usecase.execute(bad, None).await,
                Err(UserError::InvalidInput(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        // テスト項目: 登録済みのメールアドレスは EmailTaken
        // given (前提条件):
        let usecase = RegisterUserUseCase::new(Arc::new(InMemoryUserRepository::new()), hasher());
        usecase
            .execute(request("a@example.com", Role::User), None)
            .await
            .unwrap();

        // when (操作):
        let result = usecase
            .execute(request("a@example.com", Role::User), None)
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(UserError::EmailTaken));
    }

    #[tokio::test]
    async fn test_login_issues_token() {
        // テスト項目: 正しい認証情報でログインするとトークンが発行される
        // given (前提条件):
        let users: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
        let authenticator = Arc::new(JwtAuthenticator::new(b"secret", Duration::from_secs(60)));
        RegisterUserUseCase::new(users.clone(), hasher())
            .execute(request("a@example.com", Role::User), None)
            .await
            .unwrap();
        let usecase = LoginUseCase::new(users, hasher(), authenticator.clone());

        // when (操作):
        let token = usecase
            .execute("a@example.com", "secret123".to_string())
            .await
            .unwrap();

        // then (期待する結果):
        let identity = authenticator.authenticate(&token).unwrap();
        assert_eq!(identity.email, "a@example.com");
        assert_eq!(identity.role, Role::User);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        // テスト項目: 未登録メール・誤ったパスワードはどちらも InvalidCredentials
        // given (前提条件):
        let users: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
        RegisterUserUseCase::new(users.clone(), hasher())
            .execute(request("a@example.com", Role::User), None)
            .await
            .unwrap();
        let usecase = LoginUseCase::new(
            users,
            hasher(),
            Arc::new(JwtAuthenticator::new(b"secret", Duration::from_secs(60))),
        );

        // when (操作):
        let unknown = usecase
            .execute("nobody@example.com", "secret123".to_string())
            .await;
        let wrong = usecase
            .execute("a@example.com", "wrong-password".to_string())
            .await;

        // then (期待する結果):
        assert_eq!(unknown, Err(UserError::InvalidCredentials));
        assert_eq!(wrong, Err(UserError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_list_users_propagates_storage_error() {
        // テスト項目: ストアの障害は Repository エラーとして返る
        // given (前提条件):
        let mut users = MockUserRepository::new();
        users
            .expect_list_users()
            .returning(|| Err(RepositoryError::Storage("down".to_string())));
        let usecase = ListUsersUseCase::new(Arc::new(users));

        // when (操作):
        let result = usecase.execute().await;

        // then (期待する結果):
        assert!(matches!(result, Err(UserError::Repository(_))));
    }

    #[tokio::test]
    async fn test_ensure_super_admin_is_idempotent() {
        // テスト項目: super-admin の初期作成を 2 回行っても 1 人だけ作成される
        // given (前提条件):
        let users = Arc::new(InMemoryUserRepository::new());
        let usecase = EnsureSuperAdminUseCase::new(users.clone(), hasher());

        // when (操作):
        let first = usecase.execute("root@example.com", "rootpass").await;
        let second = usecase.execute("root@example.com", "rootpass").await;

        // then (期待する結果):
        assert_eq!(first, Ok(true));
        assert_eq!(second, Ok(false));
        let all = users.list_users().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].role, Role::SuperAdmin);
    }

    #[test]
    fn test_auth_error_converts() {
        // テスト項目: 認証エラーは UserError::Auth に変換される
        let error: UserError = AuthError::InvalidToken.into();
        assert_eq!(error, UserError::Auth(AuthError::InvalidToken));
    }
}
