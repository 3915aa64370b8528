//! 認証コラボレーターの実装
//!
//! - `jwt`: HS256 署名付き JWT によるトークン発行・検証
//! - `password`: bcrypt によるパスワードハッシュ

pub mod jwt;
pub mod password;

pub use jwt::JwtAuthenticator;
pub use password::BcryptPasswordHasher;
